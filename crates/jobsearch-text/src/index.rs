use anyhow::Result;
use std::path::Path;
use tantivy::schema::Value;
use tantivy::{doc, Index, IndexReader, ReloadPolicy, TantivyDocument, Term};

use jobsearch_core::filter::{PreFilter, SearchIndexFilter};
use jobsearch_core::geo::GeoPoint;
use jobsearch_core::traits::TextIndex;
use jobsearch_core::types::{Job, SearchHit, TitleMatch};

use crate::schema::{build_schema, register_tokenizer, JobFields, OPEN_MAX_SALARY, OPEN_MIN_SALARY};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Tantivy index holding one document per job.
pub struct JobTextIndex {
	pub(crate) index: Index,
	pub(crate) reader: IndexReader,
	pub(crate) fields: JobFields,
}

impl JobTextIndex {
	/// Opens the index at `index_dir`, creating it when absent. With `rebuild`
	/// any existing index is wiped first.
	pub fn create(index_dir: &Path, rebuild: bool) -> Result<Self> {
		if rebuild && index_dir.exists() {
			std::fs::remove_dir_all(index_dir)?;
		}
		std::fs::create_dir_all(index_dir)?;
		let index = if index_dir.join("meta.json").exists() {
			Index::open_in_dir(index_dir)?
		} else {
			Index::create_in_dir(index_dir, build_schema())?
		};
		Self::from_index(index)
	}

	pub fn open(index_dir: &Path) -> Result<Self> {
		let index = Index::open_in_dir(index_dir)
			.map_err(|e| anyhow::anyhow!("opening text index at {}: {}", index_dir.display(), e))?;
		Self::from_index(index)
	}

	pub fn in_ram() -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()))
	}

	fn from_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let fields = JobFields::from_schema(&index.schema())?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok(Self { index, reader, fields })
	}

	/// Inserts or replaces jobs by id and commits.
	pub fn index_jobs(&self, jobs: &[Job]) -> Result<usize> {
		let mut index_writer = self.index.writer(WRITER_HEAP_BYTES)?;
		let f = &self.fields;
		for job in jobs {
			index_writer.delete_term(Term::from_field_text(f.id, &job.id));
			let mut document = doc!(
				f.id => job.id.clone(),
				f.title => job.title.clone(),
				f.description => job.description.clone(),
				f.requirements => job.requirements.clone(),
				f.status => job.status.to_string(),
				f.moderation => job.moderation.to_string(),
				f.category => job.category.clone(),
				f.job_type => job.job_type.to_string(),
				f.work_type => job.work_type.to_string(),
				f.experience => job.experience.to_string(),
				f.min_salary => job.min_salary.unwrap_or(OPEN_MIN_SALARY),
				f.max_salary => job.max_salary.unwrap_or(OPEN_MAX_SALARY),
				f.deadline => job.deadline.timestamp_millis(),
				f.created_at => job.created_at.timestamp_millis(),
			);
			if let Some(province) = &job.location.province {
				document.add_text(f.province, province);
			}
			if let Some(district) = &job.location.district {
				document.add_text(f.district, district);
			}
			if let Some(point) = job.location.point {
				document.add_f64(f.lat, point.lat);
				document.add_f64(f.lng, point.lng);
			}
			index_writer.add_document(document)?;
		}
		index_writer.commit()?;
		self.reader.reload()?;
		tracing::debug!(count = jobs.len(), "text index committed");
		Ok(jobs.len())
	}

	pub fn num_docs(&self) -> u64 {
		self.reader.searcher().num_docs()
	}

	pub(crate) fn hit_location(&self, doc: &TantivyDocument) -> Option<GeoPoint> {
		let lat = doc.get_first(self.fields.lat).and_then(|v| v.as_f64())?;
		let lng = doc.get_first(self.fields.lng).and_then(|v| v.as_f64())?;
		Some(GeoPoint::new(lat, lng))
	}

	pub(crate) fn stored_text(&self, doc: &TantivyDocument, field: tantivy::schema::Field) -> Option<String> {
		doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string)
	}
}

impl TextIndex for JobTextIndex {
	fn search(&self, query: &str, filter: &SearchIndexFilter, limit: usize) -> anyhow::Result<Vec<SearchHit>> {
		crate::search::search_jobs(self, query, filter, limit)
	}

	fn suggest_titles(&self, query: &str, filter: &PreFilter, limit: usize) -> anyhow::Result<Vec<TitleMatch>> {
		crate::autocomplete::suggest_titles(self, query, filter, limit)
	}
}
