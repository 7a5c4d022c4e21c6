//! jobsearch-text schema
//!
//! Every filterable job attribute is indexed so the whole filter AST renders to
//! a tantivy query. Text fields share one analyzer; keyword fields hold the
//! stored codes verbatim.
use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, STRING};
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use jobsearch_core::filter::FilterField;

pub const JOB_TOKENIZER: &str = "job_text";

/// Stored in place of a missing lower salary bound so range queries see it as open.
pub const OPEN_MIN_SALARY: i64 = i64::MIN;
/// Stored in place of a missing upper salary bound.
pub const OPEN_MAX_SALARY: i64 = i64::MAX;

#[derive(Debug, Clone, Copy)]
pub struct JobFields {
	pub id: Field,
	pub title: Field,
	pub description: Field,
	pub requirements: Field,
	pub status: Field,
	pub moderation: Field,
	pub category: Field,
	pub job_type: Field,
	pub work_type: Field,
	pub experience: Field,
	pub province: Field,
	pub district: Field,
	pub min_salary: Field,
	pub max_salary: Field,
	pub deadline: Field,
	pub created_at: Field,
	pub lat: Field,
	pub lng: Field,
}

impl JobFields {
	pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
		Ok(Self {
			id: schema.get_field("id")?,
			title: schema.get_field("title")?,
			description: schema.get_field("description")?,
			requirements: schema.get_field("requirements")?,
			status: schema.get_field("status")?,
			moderation: schema.get_field("moderation")?,
			category: schema.get_field(FilterField::Category.name())?,
			job_type: schema.get_field(FilterField::JobType.name())?,
			work_type: schema.get_field(FilterField::WorkType.name())?,
			experience: schema.get_field(FilterField::Experience.name())?,
			province: schema.get_field(FilterField::Province.name())?,
			district: schema.get_field(FilterField::District.name())?,
			min_salary: schema.get_field("min_salary")?,
			max_salary: schema.get_field("max_salary")?,
			deadline: schema.get_field("deadline")?,
			created_at: schema.get_field("created_at")?,
			lat: schema.get_field("lat")?,
			lng: schema.get_field("lng")?,
		})
	}

	pub fn keyword(&self, field: FilterField) -> Field {
		match field {
			FilterField::Category => self.category,
			FilterField::JobType => self.job_type,
			FilterField::WorkType => self.work_type,
			FilterField::Experience => self.experience,
			FilterField::Province => self.province,
			FilterField::District => self.district,
		}
	}
}

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field("id", STRING | STORED);

	let text_field_indexing = TextFieldIndexing::default()
		.set_tokenizer(JOB_TOKENIZER)
		.set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	schema_builder.add_text_field("title", text_options.clone().set_stored());
	schema_builder.add_text_field("description", text_options.clone());
	schema_builder.add_text_field("requirements", text_options);

	for keyword in ["status", "moderation"] {
		schema_builder.add_text_field(keyword, STRING);
	}
	for field in [
		FilterField::Category,
		FilterField::JobType,
		FilterField::WorkType,
		FilterField::Experience,
		FilterField::Province,
		FilterField::District,
	] {
		schema_builder.add_text_field(field.name(), STRING);
	}

	schema_builder.add_i64_field("min_salary", INDEXED | FAST);
	schema_builder.add_i64_field("max_salary", INDEXED | FAST);
	schema_builder.add_i64_field("deadline", INDEXED | FAST);
	schema_builder.add_i64_field("created_at", INDEXED | FAST | STORED);
	schema_builder.add_f64_field("lat", INDEXED | FAST | STORED);
	schema_builder.add_f64_field("lng", INDEXED | FAST | STORED);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let stop_words = vec![
		"a","an","and","are","as","at","be","by","for","from","has","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","how","what","which","who","can","could","should","would","may","might","must","shall","do","does","did","have","had",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(RemoveLongFilter::limit(40))
		.filter(LowerCaser)
		.filter(AsciiFoldingFilter)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(JOB_TOKENIZER, tokenizer);
}
