//! LanceDB connection and table housekeeping.
use anyhow::Result;
use arrow_array::RecordBatchIterator;
use lancedb::{connect, Connection};
use std::sync::Arc;

use crate::schema::{build_chunks_schema, build_jobs_schema};

pub async fn open_db(uri: &str) -> Result<Connection> {
	Ok(connect(uri).execute().await?)
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
	let names = conn.table_names().execute().await?;
	if names.iter().any(|n| n == name) {
		return Ok(());
	}
	// create empty table with 0 rows
	let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
	conn.create_table(name, Box::new(iter)).execute().await?;
	tracing::info!(table = name, "created lancedb table");
	Ok(())
}

pub async fn ensure_job_tables(conn: &Connection, jobs_table: &str, chunks_table: &str, dim: i32) -> Result<()> {
	ensure_table(conn, jobs_table, build_jobs_schema()).await?;
	ensure_table(conn, chunks_table, build_chunks_schema(dim)).await
}

/// Lance SQL string literal.
pub fn quote(value: &str) -> String {
	format!("'{}'", value.replace('\'', "''"))
}

pub fn in_list<'a>(column: &str, values: impl IntoIterator<Item = &'a str>) -> String {
	let list = values.into_iter().map(quote).collect::<Vec<_>>().join(",");
	format!("{column} IN ({list})")
}
