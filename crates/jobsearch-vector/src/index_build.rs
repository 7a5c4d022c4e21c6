//! IVF_PQ index over chunk embeddings.
//!
//! Below `min_rows` chunks a flat scan is exact and fast enough, so no index
//! is trained.
use anyhow::Result;
use lancedb::index::{vector::IvfPqIndexBuilder, Index};
use lancedb::{Connection, DistanceType};

pub const CHUNK_INDEX_NAME: &str = "job_chunks_vector_idx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IvfPqParams {
	pub nlist: usize,
	pub m: usize,
	pub nbits: usize,
}

pub fn compute_ivfpq_params(total_rows: usize, dim: usize) -> IvfPqParams {
	let sqrt_n = (total_rows as f64).sqrt() as usize;
	let nlist = sqrt_n.clamp(1, 4096).min(total_rows.saturating_sub(1).max(1));
	// num_sub_vectors must divide the dimension
	let m = [32, 16, 8, 4, 2].into_iter().find(|m| dim % m == 0 && dim / m >= 8).unwrap_or(1);
	IvfPqParams { nlist, m, nbits: 8 }
}

/// Trains the index when the chunk table has at least `min_rows` rows.
/// Returns whether an index was built.
pub async fn build_chunk_index(conn: &Connection, chunks_table: &str, dim: usize, min_rows: usize) -> Result<bool> {
	let table = conn.open_table(chunks_table).execute().await?;
	let rows = table.count_rows(None).await?;
	if rows < min_rows {
		tracing::info!(rows, min_rows, "skipping ANN index build; flat search is used");
		return Ok(false);
	}
	let params = compute_ivfpq_params(rows, dim);
	tracing::info!(rows, nlist = params.nlist, m = params.m, "building IVF_PQ index");
	table
		.create_index(
			&["vector"],
			Index::IvfPq(
				IvfPqIndexBuilder::default()
					.distance_type(DistanceType::Cosine)
					.num_partitions(params.nlist as u32)
					.num_sub_vectors(params.m as u32),
			),
		)
		.name(CHUNK_INDEX_NAME.to_string())
		.replace(true)
		.execute()
		.await?;
	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn params_scale_with_rows() {
		let p = compute_ivfpq_params(1_000_000, 1024);
		assert_eq!(p.nlist, 1000);
		assert_eq!(p.m, 32);

		let tiny = compute_ivfpq_params(4, 1024);
		assert_eq!(tiny.nlist, 2);
	}

	#[test]
	fn sub_vectors_divide_dimension() {
		assert_eq!(compute_ivfpq_params(10_000, 384).m, 32);
		assert_eq!(compute_ivfpq_params(10_000, 40).m, 4);
		assert_eq!(compute_ivfpq_params(10_000, 7).m, 1);
	}
}
