use anyhow::{bail, Result};
use arrow_array::{ArrayRef, FixedSizeListArray, Float64Array, Int32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::path::Path;
use std::sync::Arc;

use jobsearch_core::types::Job;

use crate::schema::{build_chunks_schema, build_jobs_schema};
use crate::table::{ensure_job_tables, in_list, open_db};

const BATCH_JOBS: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
	pub jobs: usize,
	pub chunks: usize,
}

/// Writes jobs and their chunk embeddings. Job rows are upserted by id; a
/// job's chunk rows are replaced wholesale.
pub struct JobWriter {
	pub(crate) db: Connection,
	pub(crate) jobs_table: String,
	pub(crate) chunks_table: String,
	dim: usize,
	progress: bool,
}

impl JobWriter {
	pub async fn new(db_path: &Path, jobs_table: &str, chunks_table: &str, dim: usize) -> Result<Self> {
		let db = open_db(db_path.to_string_lossy().as_ref()).await?;
		ensure_job_tables(&db, jobs_table, chunks_table, dim_i32(dim)?).await?;
		Ok(Self { db, jobs_table: jobs_table.to_string(), chunks_table: chunks_table.to_string(), dim, progress: false })
	}

	pub fn with_progress(mut self, progress: bool) -> Self {
		self.progress = progress;
		self
	}

	pub async fn write_jobs(&self, jobs: &[Job]) -> Result<WriteStats> {
		if jobs.is_empty() {
			tracing::info!("no jobs to write");
			return Ok(WriteStats::default());
		}
		for job in jobs {
			self.check_dimensions(job)?;
		}

		let pb = if self.progress { ProgressBar::new(jobs.len() as u64) } else { ProgressBar::hidden() };
		pb.set_style(
			ProgressStyle::default_bar()
				.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} jobs ({percent}%) {msg}")?
				.progress_chars("#>-"),
		);

		let jobs_tbl = self.db.open_table(&self.jobs_table).execute().await?;
		let chunks_tbl = self.db.open_table(&self.chunks_table).execute().await?;
		let mut stats = WriteStats::default();
		for batch in jobs.chunks(BATCH_JOBS) {
			let rows = jobs_to_record_batch(batch)?;
			let schema = rows.schema();
			let reader = Box::new(RecordBatchIterator::new(vec![Ok(rows)].into_iter(), schema));
			let mut mi = jobs_tbl.merge_insert(&["id"]);
			mi.when_matched_update_all(None).when_not_matched_insert_all();
			mi.execute(reader).await?;

			chunks_tbl.delete(&in_list("job_id", batch.iter().map(|j| j.id.as_str()))).await?;
			let chunk_rows = chunks_to_record_batch(batch, self.dim)?;
			let written = chunk_rows.num_rows();
			if written > 0 {
				let schema = chunk_rows.schema();
				let reader = Box::new(RecordBatchIterator::new(vec![Ok(chunk_rows)].into_iter(), schema));
				chunks_tbl.add(reader).execute().await?;
			}

			stats.jobs += batch.len();
			stats.chunks += written;
			pb.inc(batch.len() as u64);
			pb.set_message(format!("{} chunks", stats.chunks));
		}
		pb.finish_with_message(format!("{} jobs, {} chunks", stats.jobs, stats.chunks));
		tracing::info!(jobs = stats.jobs, chunks = stats.chunks, table = %self.jobs_table, "lancedb write complete");
		Ok(stats)
	}

	fn check_dimensions(&self, job: &Job) -> Result<()> {
		if job.chunks.is_empty() {
			bail!("job {} has no embedded chunks", job.id);
		}
		if let Some(bad) = job.chunks.iter().find(|c| c.embedding.len() != self.dim) {
			bail!("job {} has a {}-dimensional embedding, expected {}", job.id, bad.embedding.len(), self.dim);
		}
		Ok(())
	}
}

pub(crate) fn dim_i32(dim: usize) -> Result<i32> {
	i32::try_from(dim).map_err(|_| anyhow::anyhow!("embedding dimension {dim} out of range"))
}

/// The filterable columns in schema order, one entry per item of `jobs`.
fn filter_arrays<'a>(jobs: impl Iterator<Item = &'a Job> + Clone) -> Vec<ArrayRef> {
	let strs = |f: fn(&Job) -> String| -> ArrayRef { Arc::new(StringArray::from(jobs.clone().map(f).collect::<Vec<_>>())) };
	let opt_strs = |f: fn(&Job) -> Option<String>| -> ArrayRef { Arc::new(StringArray::from(jobs.clone().map(f).collect::<Vec<_>>())) };
	let opt_i64s = |f: fn(&Job) -> Option<i64>| -> ArrayRef { Arc::new(Int64Array::from(jobs.clone().map(f).collect::<Vec<_>>())) };
	let opt_f64s = |f: fn(&Job) -> Option<f64>| -> ArrayRef { Arc::new(Float64Array::from(jobs.clone().map(f).collect::<Vec<_>>())) };
	let i64s = |f: fn(&Job) -> i64| -> ArrayRef { Arc::new(Int64Array::from(jobs.clone().map(f).collect::<Vec<_>>())) };
	vec![
		strs(|j| j.status.to_string()),
		strs(|j| j.moderation.to_string()),
		strs(|j| j.category.clone()),
		strs(|j| j.job_type.to_string()),
		strs(|j| j.work_type.to_string()),
		strs(|j| j.experience.to_string()),
		opt_strs(|j| j.location.province.clone()),
		opt_strs(|j| j.location.district.clone()),
		opt_i64s(|j| j.min_salary),
		opt_i64s(|j| j.max_salary),
		opt_f64s(|j| j.location.point.map(|p| p.lat)),
		opt_f64s(|j| j.location.point.map(|p| p.lng)),
		i64s(|j| j.deadline.timestamp_millis()),
		i64s(|j| j.created_at.timestamp_millis()),
	]
}

pub fn jobs_to_record_batch(jobs: &[Job]) -> Result<RecordBatch> {
	let text = |f: fn(&Job) -> &str| -> ArrayRef { Arc::new(StringArray::from(jobs.iter().map(f).collect::<Vec<_>>())) };
	let mut columns = vec![
		text(|j| j.id.as_str()),
		text(|j| j.recruiter_id.as_str()),
		text(|j| j.title.as_str()),
		text(|j| j.description.as_str()),
		text(|j| j.requirements.as_str()),
		text(|j| j.benefits.as_str()),
	];
	columns.extend(filter_arrays(jobs.iter()));
	Ok(RecordBatch::try_new(build_jobs_schema(), columns)?)
}

pub fn chunks_to_record_batch(jobs: &[Job], dim: usize) -> Result<RecordBatch> {
	// One entry per chunk row, pointing back at its job.
	let rows: Vec<(&Job, usize)> = jobs.iter().flat_map(|j| (0..j.chunks.len()).map(move |i| (j, i))).collect();
	let mut columns: Vec<ArrayRef> = vec![
		Arc::new(StringArray::from(rows.iter().map(|(j, i)| format!("{}:{}", j.id, i)).collect::<Vec<_>>())),
		Arc::new(StringArray::from(rows.iter().map(|(j, _)| j.id.clone()).collect::<Vec<_>>())),
		Arc::new(Int32Array::from(rows.iter().map(|(_, i)| *i as i32).collect::<Vec<_>>())),
		Arc::new(StringArray::from(rows.iter().map(|(j, i)| j.chunks[*i].text.clone()).collect::<Vec<_>>())),
	];
	columns.extend(filter_arrays(rows.iter().map(|(j, _)| *j)));
	let vectors: Vec<Option<Vec<Option<f32>>>> = rows
		.iter()
		.map(|(j, i)| Some(j.chunks[*i].embedding.iter().map(|&x| Some(x)).collect()))
		.collect();
	let dim = dim_i32(dim)?;
	columns.push(Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
		vectors.into_iter(),
		dim,
	)));
	Ok(RecordBatch::try_new(build_chunks_schema(dim), columns)?)
}
