//! Wiring shared by the `jobsearch` and `jobsearch-indexer` binaries.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use jobsearch_core::chunking::JobChunker;
use jobsearch_core::config::{resolve_with_base, Config, Settings};
use jobsearch_core::traits::Embedder;
use jobsearch_core::types::{Job, JobChunk};
use jobsearch_embed::get_default_embedder;
use jobsearch_hybrid::{CompanyTable, JobSearchEngine};
use jobsearch_text::JobTextIndex;
use jobsearch_vector::LanceJobStore;

/// Logs go to stderr so stdout stays machine-readable.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub struct AppContext {
    pub settings: Settings,
    /// Directory relative data paths resolve against.
    pub base: PathBuf,
}

pub fn load_context() -> Result<AppContext> {
    let config = Config::load().context("loading configuration")?;
    let settings = config.settings()?;
    let base = std::env::current_dir()?;
    Ok(AppContext { settings, base })
}

pub type Engine = JobSearchEngine<JobTextIndex, LanceJobStore>;

pub async fn open_engine(ctx: &AppContext) -> Result<Engine> {
    let data = &ctx.settings.data;
    let text_dir = data.text_index_path(&ctx.base);
    let text = JobTextIndex::open(&text_dir).with_context(|| format!("opening text index at {}", text_dir.display()))?;
    let store = LanceJobStore::open(
        &data.vector_db_path(&ctx.base),
        &data.jobs_table,
        &data.chunks_table,
        ctx.settings.embedding.dimension,
    )
    .await?;
    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&ctx.settings.embedding)?);

    let mut engine = JobSearchEngine::new(Arc::new(text), Arc::new(store), embedder, ctx.settings.clone());
    if let Some(file) = &data.companies_file {
        let table = CompanyTable::from_json_file(&resolve_with_base(&ctx.base, file))?;
        tracing::info!(companies = table.len(), "company table loaded");
        engine = engine.with_companies(Arc::new(table));
    }
    Ok(engine)
}

/// Chunks and embeds every job that arrived without chunks. Returns the
/// number of jobs embedded.
pub fn embed_missing_chunks(jobs: &mut [Job], embedder: &dyn Embedder, chunker: &JobChunker, progress: bool) -> Result<usize> {
    let pending: Vec<usize> = jobs.iter().enumerate().filter(|(_, j)| j.chunks.is_empty()).map(|(i, _)| i).collect();
    if pending.is_empty() {
        return Ok(0);
    }
    let pb = if progress { ProgressBar::new(pending.len() as u64) } else { ProgressBar::hidden() };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} embedding ({eta})")?
            .progress_chars("#>-"),
    );
    for &i in &pending {
        let job = &mut jobs[i];
        let texts = chunker.chunk_job(job);
        let embeddings = embedder.embed_batch(&texts).with_context(|| format!("embedding job {}", job.id))?;
        job.chunks = texts.into_iter().zip(embeddings).map(|(text, embedding)| JobChunk { text, embedding }).collect();
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobsearch_core::types::{ExperienceLevel, JobLocation, JobStatus, JobType, ModerationStatus, WorkType};
    use jobsearch_embed::FakeEmbedder;

    fn job(id: &str, description: &str) -> Job {
        let t = chrono::Utc::now();
        Job {
            id: id.into(),
            recruiter_id: "r".into(),
            title: "Welder".into(),
            description: description.into(),
            requirements: String::new(),
            benefits: String::new(),
            category: "Trades".into(),
            job_type: JobType::FullTime,
            work_type: WorkType::Onsite,
            experience: ExperienceLevel::NoExperience,
            min_salary: None,
            max_salary: None,
            location: JobLocation::default(),
            deadline: t,
            status: JobStatus::Active,
            moderation: ModerationStatus::Approved,
            created_at: t,
            chunks: Vec::new(),
        }
    }

    #[test]
    fn only_jobs_without_chunks_are_embedded() {
        let embedder = FakeEmbedder::new(8);
        let mut jobs = vec![job("a", "First paragraph.\n\nSecond paragraph."), job("b", "Pre-chunked")];
        jobs[1].chunks.push(JobChunk { text: "kept".into(), embedding: vec![0.0; 8] });

        let n = embed_missing_chunks(&mut jobs, &embedder, &JobChunker::default(), false).unwrap();
        assert_eq!(n, 1);
        assert_eq!(jobs[0].chunks.len(), 2);
        assert!(jobs[0].chunks.iter().all(|c| c.embedding.len() == 8 && c.text.starts_with("Welder\n")));
        assert_eq!(jobs[1].chunks[0].text, "kept");
    }
}
