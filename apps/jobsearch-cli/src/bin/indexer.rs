use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use jobsearch_cli::{embed_missing_chunks, init_tracing, load_context};
use jobsearch_core::chunking::{load_jobs, ChunkingConfig, JobChunker};
use jobsearch_embed::get_default_embedder;
use jobsearch_text::JobTextIndex;
use jobsearch_vector::index_build::build_chunk_index;
use jobsearch_vector::{JobWriter, LanceJobStore};

#[derive(Parser)]
#[command(name = "jobsearch-indexer", version, about = "Build the text and vector job indexes from a JSON Lines feed")]
struct Args {
    /// Job feed, one JSON object per line.
    #[arg(long)]
    jobs: PathBuf,

    /// Drop existing indexes before writing.
    #[arg(long)]
    rebuild: bool,

    /// Train an IVF_PQ index over chunk embeddings once enough rows exist.
    #[arg(long)]
    build_ann_index: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let ctx = load_context()?;
    let data = &ctx.settings.data;
    let embedding = ctx.settings.embedding.clone();

    let jobs = load_jobs(&args.jobs)?;
    let (jobs, embedded) = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut jobs = jobs;
        let embedder = get_default_embedder(&embedding)?;
        let chunker = JobChunker::new(ChunkingConfig::from(&embedding));
        let embedded = embed_missing_chunks(&mut jobs, embedder.as_ref(), &chunker, true)?;
        Ok((jobs, embedded))
    })
    .await??;
    tracing::info!(jobs = jobs.len(), embedded, "jobs prepared");

    let text_dir = data.text_index_path(&ctx.base);
    let text = JobTextIndex::create(&text_dir, args.rebuild)?;
    let text_docs = text.index_jobs(&jobs)?;
    tracing::info!(docs = text_docs, dir = %text_dir.display(), "text index written");

    let db_path = data.vector_db_path(&ctx.base);
    if args.rebuild && db_path.exists() {
        std::fs::remove_dir_all(&db_path).with_context(|| format!("removing {}", db_path.display()))?;
    }
    let dim = ctx.settings.embedding.dimension;
    let writer = JobWriter::new(&db_path, &data.jobs_table, &data.chunks_table, dim).await?.with_progress(true);
    let stats = writer.write_jobs(&jobs).await?;

    let mut ann_index = false;
    if args.build_ann_index {
        let store = LanceJobStore::open(&db_path, &data.jobs_table, &data.chunks_table, dim).await?;
        ann_index = build_chunk_index(store.connection(), &data.chunks_table, dim, ctx.settings.embedding.ann_min_rows).await?;
    }

    let summary = serde_json::json!({
        "jobs": stats.jobs,
        "chunks": stats.chunks,
        "embedded": embedded,
        "textDocs": text_docs,
        "annIndex": ann_index,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
