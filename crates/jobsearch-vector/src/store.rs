use anyhow::{bail, Result};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType, Table};
use std::collections::HashMap;
use std::path::Path;

use jobsearch_core::filter::PreFilter;
use jobsearch_core::traits::{JobStore, VectorIndex, VectorSearchOptions};
use jobsearch_core::types::{Job, JobId, JobListing, JobPosition, SearchHit, SourceKind};

use crate::decode::{distance_col, f64_col, jobs_from_batch, listing_keys_from_batch, point_at, positions_from_batch, string_col, titles_from_batch};
use crate::prefilter::{contains_pattern, geo_matches, render_sql};
use crate::table::{ensure_job_tables, in_list, open_db, quote};
use crate::writer::dim_i32;

const LISTING_COLUMNS: &[&str] = &["id", "created_at", "lat", "lng"];

/// Read side of the lancedb job store: ANN over chunk embeddings plus plain
/// predicate queries over job rows.
pub struct LanceJobStore {
	db: Connection,
	jobs_table: String,
	chunks_table: String,
	dim: usize,
}

impl LanceJobStore {
	pub async fn open(db_path: &Path, jobs_table: &str, chunks_table: &str, dim: usize) -> Result<Self> {
		let db = open_db(db_path.to_string_lossy().as_ref()).await?;
		ensure_job_tables(&db, jobs_table, chunks_table, dim_i32(dim)?).await?;
		Ok(Self { db, jobs_table: jobs_table.to_string(), chunks_table: chunks_table.to_string(), dim })
	}

	pub fn connection(&self) -> &Connection {
		&self.db
	}

	async fn jobs(&self) -> Result<Table> {
		Ok(self.db.open_table(&self.jobs_table).execute().await?)
	}

	/// Rows of the jobs table matching `filter`, projected to `columns` when
	/// given. Without a `limit` every matching row is read.
	async fn scan<T>(
		&self,
		filter: &PreFilter,
		extra: Option<&str>,
		columns: Option<&[&str]>,
		limit: Option<usize>,
		decode: fn(&arrow_array::RecordBatch) -> Result<Vec<T>>,
	) -> Result<Vec<T>> {
		let table = self.jobs().await?;
		let predicate = match (render_sql(filter), extra) {
			(Some(sql), Some(extra)) => Some(format!("{sql} AND {extra}")),
			(Some(sql), None) => Some(sql),
			(None, Some(extra)) => Some(extra.to_string()),
			(None, None) => None,
		};
		// Size unbounded scans by a count so no default row limit applies.
		let limit = match limit {
			Some(limit) => limit,
			None => table.count_rows(predicate.clone()).await?,
		};
		if limit == 0 {
			return Ok(Vec::new());
		}
		let mut query = table.query().limit(limit);
		if let Some(predicate) = predicate {
			query = query.only_if(predicate);
		}
		if let Some(columns) = columns {
			query = query.select(Select::columns(columns));
		}
		let mut stream = query.execute().await?;
		let mut out = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			out.extend(decode(&batch)?);
		}
		Ok(out)
	}
}

impl VectorIndex for LanceJobStore {
	async fn search_vectors(&self, query: &[f32], filter: &PreFilter, options: VectorSearchOptions) -> Result<Vec<SearchHit>> {
		if query.len() != self.dim {
			bail!("query embedding has {} dimensions, index expects {}", query.len(), self.dim);
		}
		if options.limit == 0 {
			return Ok(Vec::new());
		}
		let table = self.db.open_table(&self.chunks_table).execute().await?;
		let mut search = table
			.vector_search(query.to_vec())?
			.distance_type(DistanceType::Cosine)
			.select(Select::columns(&["job_id", "lat", "lng"]))
			.limit(options.num_candidates.max(options.limit));
		if let Some(sql) = render_sql(filter) {
			search = search.only_if(sql);
		}
		let mut stream = search.execute().await?;

		// Chunks collapse to their job, keeping the best similarity. First
		// appearance fixes the job's position among equal scores.
		let mut best: HashMap<String, usize> = HashMap::new();
		let mut hits: Vec<SearchHit> = Vec::new();
		let mut chunk_rows = 0usize;
		while let Some(batch) = stream.try_next().await? {
			let job_id = string_col(&batch, "job_id")?;
			let distance = distance_col(&batch)?;
			let lat = f64_col(&batch, "lat")?;
			let lng = f64_col(&batch, "lng")?;
			for i in 0..batch.num_rows() {
				chunk_rows += 1;
				let location = point_at(lat, lng, i);
				if !geo_matches(filter, location) {
					continue;
				}
				let score = 1.0 - distance.value(i);
				let id = job_id.value(i);
				match best.get(id) {
					Some(&slot) => {
						if score > hits[slot].score {
							hits[slot].score = score;
						}
					}
					None => {
						best.insert(id.to_string(), hits.len());
						hits.push(SearchHit { id: id.to_string(), score, source: SourceKind::Vector, location });
					}
				}
			}
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(options.limit);
		tracing::debug!(chunk_rows, jobs = hits.len(), "vector branch");
		Ok(hits)
	}
}

impl JobStore for LanceJobStore {
	async fn list_jobs(&self, filter: &PreFilter, offset: usize, limit: usize) -> Result<JobListing> {
		// Order and count on the narrow key columns; full rows only for the window.
		let mut keys = self.scan(filter, None, Some(LISTING_COLUMNS), None, listing_keys_from_batch).await?;
		keys.retain(|k| geo_matches(filter, k.point));
		keys.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
		let total = keys.len();
		let ids: Vec<JobId> = keys.into_iter().skip(offset).take(limit).map(|k| k.id).collect();

		let mut by_id: HashMap<JobId, Job> = self.get_jobs(&ids).await?.into_iter().map(|j| (j.id.clone(), j)).collect();
		let jobs = ids.iter().filter_map(|id| by_id.remove(id)).collect();
		Ok(JobListing { total, jobs })
	}

	async fn get_jobs(&self, ids: &[JobId]) -> Result<Vec<Job>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}
		let predicate = in_list("id", ids.iter().map(String::as_str));
		self.scan(&PreFilter::default(), Some(&predicate), None, Some(ids.len()), jobs_from_batch).await
	}

	async fn job_positions(&self, filter: &PreFilter) -> Result<Vec<JobPosition>> {
		let mut positions = self
			.scan(filter, Some("lat IS NOT NULL AND lng IS NOT NULL"), Some(&["id", "lat", "lng"]), None, positions_from_batch)
			.await?;
		positions.retain(|p| geo_matches(filter, Some(p.point)));
		Ok(positions)
	}

	async fn job_titles(&self, filter: &PreFilter, needle: &str, limit: usize) -> Result<Vec<String>> {
		let needle = needle.trim();
		let matching = (!needle.is_empty()).then(|| format!("title ILIKE {}", quote(&contains_pattern(needle))));
		self.scan(filter, matching.as_deref(), Some(&["title"]), Some(limit), titles_from_batch).await
	}
}
