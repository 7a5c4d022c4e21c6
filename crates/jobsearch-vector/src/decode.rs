//! Typed access to lancedb result batches.
use anyhow::{anyhow, Context, Result};
use arrow_array::{Array, Float32Array, Float64Array, Int64Array, RecordBatch, StringArray};
use chrono::{DateTime, Utc};

use jobsearch_core::geo::GeoPoint;
use jobsearch_core::types::{ExperienceLevel, Job, JobLocation, JobPosition, JobStatus, JobType, ModerationStatus, WorkType};

pub fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| anyhow!("missing or non-string column '{name}'"))
}

pub fn i64_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<Int64Array>())
		.ok_or_else(|| anyhow!("missing or non-int64 column '{name}'"))
}

pub fn f64_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<Float64Array>())
		.ok_or_else(|| anyhow!("missing or non-float64 column '{name}'"))
}

pub fn distance_col(batch: &RecordBatch) -> Result<&Float32Array> {
	batch
		.column_by_name("_distance")
		.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
		.ok_or_else(|| anyhow!("vector search result without _distance"))
}

fn opt_str(arr: &StringArray, i: usize) -> Option<String> {
	arr.is_valid(i).then(|| arr.value(i).to_string())
}

fn opt_i64(arr: &Int64Array, i: usize) -> Option<i64> {
	arr.is_valid(i).then(|| arr.value(i))
}

fn millis(ms: i64) -> Result<DateTime<Utc>> {
	DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp out of range: {ms}"))
}

fn code<T>(parse: fn(&str) -> Option<T>, column: &str, value: &str) -> Result<T> {
	parse(value).ok_or_else(|| anyhow!("unknown {column} code '{value}'"))
}

/// Point from nullable `lat`/`lng` columns at row `i`.
pub fn point_at(lat: &Float64Array, lng: &Float64Array, i: usize) -> Option<GeoPoint> {
	(lat.is_valid(i) && lng.is_valid(i)).then(|| GeoPoint::new(lat.value(i), lng.value(i)))
}

/// Decodes full job rows. `chunks` is left empty.
pub fn jobs_from_batch(batch: &RecordBatch) -> Result<Vec<Job>> {
	let id = string_col(batch, "id")?;
	let recruiter_id = string_col(batch, "recruiter_id")?;
	let title = string_col(batch, "title")?;
	let description = string_col(batch, "description")?;
	let requirements = string_col(batch, "requirements")?;
	let benefits = string_col(batch, "benefits")?;
	let status = string_col(batch, "status")?;
	let moderation = string_col(batch, "moderation")?;
	let category = string_col(batch, "category")?;
	let job_type = string_col(batch, "job_type")?;
	let work_type = string_col(batch, "work_type")?;
	let experience = string_col(batch, "experience")?;
	let province = string_col(batch, "province")?;
	let district = string_col(batch, "district")?;
	let min_salary = i64_col(batch, "min_salary")?;
	let max_salary = i64_col(batch, "max_salary")?;
	let lat = f64_col(batch, "lat")?;
	let lng = f64_col(batch, "lng")?;
	let deadline = i64_col(batch, "deadline")?;
	let created_at = i64_col(batch, "created_at")?;

	let mut jobs = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		let job = Job {
			id: id.value(i).to_string(),
			recruiter_id: recruiter_id.value(i).to_string(),
			title: title.value(i).to_string(),
			description: description.value(i).to_string(),
			requirements: requirements.value(i).to_string(),
			benefits: benefits.value(i).to_string(),
			category: category.value(i).to_string(),
			job_type: code(JobType::parse, "job_type", job_type.value(i))?,
			work_type: code(WorkType::parse, "work_type", work_type.value(i))?,
			experience: code(ExperienceLevel::parse, "experience", experience.value(i))?,
			min_salary: opt_i64(min_salary, i),
			max_salary: opt_i64(max_salary, i),
			location: JobLocation {
				province: opt_str(province, i),
				district: opt_str(district, i),
				point: point_at(lat, lng, i),
			},
			deadline: millis(deadline.value(i))?,
			status: code(JobStatus::parse, "status", status.value(i))?,
			moderation: code(ModerationStatus::parse, "moderation", moderation.value(i))?,
			created_at: millis(created_at.value(i))?,
			chunks: Vec::new(),
		};
		jobs.push(job);
	}
	Ok(jobs)
}

/// Sort key of a listing row.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingKey {
	pub id: String,
	pub created_at: i64,
	pub point: Option<GeoPoint>,
}

pub fn listing_keys_from_batch(batch: &RecordBatch) -> Result<Vec<ListingKey>> {
	let id = string_col(batch, "id")?;
	let created_at = i64_col(batch, "created_at")?;
	let lat = f64_col(batch, "lat")?;
	let lng = f64_col(batch, "lng")?;
	Ok((0..batch.num_rows())
		.map(|i| ListingKey { id: id.value(i).to_string(), created_at: created_at.value(i), point: point_at(lat, lng, i) })
		.collect())
}

/// Rows with coordinates only; rows without a point are skipped.
pub fn positions_from_batch(batch: &RecordBatch) -> Result<Vec<JobPosition>> {
	let id = string_col(batch, "id")?;
	let lat = f64_col(batch, "lat")?;
	let lng = f64_col(batch, "lng")?;
	Ok((0..batch.num_rows())
		.filter_map(|i| point_at(lat, lng, i).map(|point| JobPosition { id: id.value(i).to_string(), point }))
		.collect())
}

pub fn titles_from_batch(batch: &RecordBatch) -> Result<Vec<String>> {
	let title = string_col(batch, "title").context("decoding titles")?;
	Ok((0..batch.num_rows()).map(|i| title.value(i).to_string()).collect())
}
