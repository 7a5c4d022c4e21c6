//! Arrow schemas for the `jobs` and `job_chunks` tables.
//!
//! Chunk rows repeat the filterable job columns so the ANN query can be
//! pre-filtered with the same SQL predicate as the jobs table. Timestamps are
//! stored as epoch milliseconds.
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const DEFAULT_EMBEDDING_DIM: i32 = 1024;

/// Columns shared by both tables and referenced by the SQL pre-filter.
fn filter_columns() -> Vec<Field> {
	vec![
		Field::new("status", DataType::Utf8, false),
		Field::new("moderation", DataType::Utf8, false),
		Field::new("category", DataType::Utf8, false),
		Field::new("job_type", DataType::Utf8, false),
		Field::new("work_type", DataType::Utf8, false),
		Field::new("experience", DataType::Utf8, false),
		Field::new("province", DataType::Utf8, true),
		Field::new("district", DataType::Utf8, true),
		Field::new("min_salary", DataType::Int64, true),
		Field::new("max_salary", DataType::Int64, true),
		Field::new("lat", DataType::Float64, true),
		Field::new("lng", DataType::Float64, true),
		Field::new("deadline", DataType::Int64, false),
		Field::new("created_at", DataType::Int64, false),
	]
}

pub fn build_jobs_schema() -> Arc<Schema> {
	let mut fields = vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("recruiter_id", DataType::Utf8, false),
		Field::new("title", DataType::Utf8, false),
		Field::new("description", DataType::Utf8, false),
		Field::new("requirements", DataType::Utf8, false),
		Field::new("benefits", DataType::Utf8, false),
	];
	fields.extend(filter_columns());
	Arc::new(Schema::new(fields))
}

pub fn build_chunks_schema(dim: i32) -> Arc<Schema> {
	let mut fields = vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("job_id", DataType::Utf8, false),
		Field::new("chunk_index", DataType::Int32, false),
		Field::new("content", DataType::Utf8, false),
	];
	fields.extend(filter_columns());
	fields.push(Field::new(
		"vector",
		DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
		true,
	));
	Arc::new(Schema::new(fields))
}
