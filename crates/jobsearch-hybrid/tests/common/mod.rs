#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::{BoxFuture, FutureExt};

use jobsearch_core::config::Settings;
use jobsearch_core::filter::{PreFilter, SearchIndexFilter};
use jobsearch_core::geo::GeoPoint;
use jobsearch_core::traits::{Embedder, JobStore, SavedJobs, TextIndex, VectorIndex, VectorSearchOptions};
use jobsearch_core::types::{
    ExperienceLevel, Job, JobChunk, JobId, JobListing, JobLocation, JobPosition, JobStatus, JobType, ModerationStatus, SearchHit,
    SourceKind, TitleMatch, WorkType,
};
use jobsearch_embed::FakeEmbedder;
use jobsearch_hybrid::JobSearchEngine;
use jobsearch_text::JobTextIndex;

pub const DIM: usize = 64;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

pub fn settings() -> Settings {
    let mut s = Settings::default();
    s.embedding.dimension = DIM;
    s.embedding.retry_backoff_ms = 1;
    s
}

/// An open, approved job in Hanoi created `age_days` before `now()`.
pub fn job(id: &str, title: &str, age_days: i64) -> Job {
    let embedder = FakeEmbedder::new(DIM);
    let text = format!("{title} {title}");
    Job {
        id: id.into(),
        recruiter_id: format!("rec-{id}"),
        title: title.into(),
        description: format!("We are hiring a {title}."),
        requirements: String::new(),
        benefits: String::new(),
        category: "IT".into(),
        job_type: JobType::FullTime,
        work_type: WorkType::Onsite,
        experience: ExperienceLevel::OneToThreeYears,
        min_salary: None,
        max_salary: None,
        location: JobLocation {
            province: Some("Hanoi".into()),
            district: None,
            point: Some(GeoPoint::new(21.03, 105.84)),
        },
        deadline: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        status: JobStatus::Active,
        moderation: ModerationStatus::Approved,
        created_at: now() - Duration::days(age_days),
        chunks: vec![JobChunk { embedding: embedder.embed_text(&text), text }],
    }
}

pub fn at(mut job: Job, lat: f64, lng: f64) -> Job {
    job.location.point = Some(GeoPoint::new(lat, lng));
    job
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Brute-force store over an in-memory job list.
#[derive(Default)]
pub struct MemoryStore {
    pub jobs: Vec<Job>,
    pub fail_vectors: bool,
    pub fail_positions: bool,
    pub fail_listing: bool,
    pub vector_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs, ..Self::default() }
    }

    fn matching<'a>(&'a self, filter: &'a PreFilter) -> impl Iterator<Item = &'a Job> + 'a {
        self.jobs.iter().filter(move |j| filter.matches(j))
    }
}

impl VectorIndex for MemoryStore {
    async fn search_vectors(&self, query: &[f32], filter: &PreFilter, options: VectorSearchOptions) -> Result<Vec<SearchHit>> {
        self.vector_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_vectors {
            bail!("vector index offline");
        }
        let mut hits: Vec<SearchHit> = self
            .matching(filter)
            .map(|j| {
                let score = j.chunks.iter().map(|c| cosine(query, &c.embedding)).fold(f32::NEG_INFINITY, f32::max);
                SearchHit { id: j.id.clone(), score, source: SourceKind::Vector, location: j.location.point }
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(options.limit);
        Ok(hits)
    }
}

impl JobStore for MemoryStore {
    async fn list_jobs(&self, filter: &PreFilter, offset: usize, limit: usize) -> Result<JobListing> {
        if self.fail_listing {
            bail!("store offline");
        }
        let mut jobs: Vec<Job> = self.matching(filter).cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        let total = jobs.len();
        Ok(JobListing { total, jobs: jobs.into_iter().skip(offset).take(limit).collect() })
    }

    async fn get_jobs(&self, ids: &[JobId]) -> Result<Vec<Job>> {
        Ok(self.jobs.iter().filter(|j| ids.contains(&j.id)).cloned().collect())
    }

    async fn job_positions(&self, filter: &PreFilter) -> Result<Vec<JobPosition>> {
        if self.fail_positions {
            bail!("aggregation failed");
        }
        Ok(self
            .matching(filter)
            .filter_map(|j| j.location.point.map(|point| JobPosition { id: j.id.clone(), point }))
            .collect())
    }

    async fn job_titles(&self, filter: &PreFilter, needle: &str, limit: usize) -> Result<Vec<String>> {
        let needle = needle.trim().to_lowercase();
        Ok(self
            .matching(filter)
            .filter(|j| j.title.to_lowercase().contains(&needle))
            .map(|j| j.title.clone())
            .take(limit)
            .collect())
    }
}

/// Counts calls and delegates to the fake embedder; fails every call when
/// `fail` is set.
pub struct CountingEmbedder {
    inner: FakeEmbedder,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self { inner: FakeEmbedder::new(DIM), calls: AtomicUsize::new(0), fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::new() }
    }
}

impl Embedder for CountingEmbedder {
    fn dim(&self) -> usize {
        DIM
    }

    fn max_len(&self) -> usize {
        256
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("embedding provider unreachable");
        }
        self.inner.embed_batch(texts)
    }
}

pub struct FailingTextIndex;

impl TextIndex for FailingTextIndex {
    fn search(&self, _query: &str, _filter: &SearchIndexFilter, _limit: usize) -> Result<Vec<SearchHit>> {
        bail!("text index offline")
    }

    fn suggest_titles(&self, _query: &str, _filter: &PreFilter, _limit: usize) -> Result<Vec<TitleMatch>> {
        bail!("text index offline")
    }
}

pub struct BrokenSavedJobs;

impl SavedJobs for BrokenSavedJobs {
    fn saved_job_ids<'a>(&'a self, _user_id: &'a str, _job_ids: &'a [JobId]) -> BoxFuture<'a, Result<HashSet<JobId>>> {
        futures::future::ready(Err(anyhow::anyhow!("saved-jobs service down"))).boxed()
    }
}

pub struct Fixture {
    pub engine: JobSearchEngine<JobTextIndex, MemoryStore>,
    pub store: Arc<MemoryStore>,
    pub embedder: Arc<CountingEmbedder>,
}

pub fn text_index(jobs: &[Job]) -> JobTextIndex {
    let index = JobTextIndex::in_ram().expect("text index");
    index.index_jobs(jobs).expect("index jobs");
    index
}

pub fn fixture_with(store: MemoryStore, embedder: CountingEmbedder) -> Fixture {
    let text = Arc::new(text_index(&store.jobs));
    let store = Arc::new(store);
    let embedder = Arc::new(embedder);
    let engine = JobSearchEngine::new(text, Arc::clone(&store), embedder.clone(), settings());
    Fixture { engine, store, embedder }
}

pub fn fixture(jobs: Vec<Job>) -> Fixture {
    fixture_with(MemoryStore::new(jobs), CountingEmbedder::new())
}

pub fn companies(jobs: &[Job]) -> HashMap<String, jobsearch_core::types::CompanySummary> {
    jobs.iter()
        .map(|j| {
            (
                j.recruiter_id.clone(),
                jobsearch_core::types::CompanySummary { name: format!("Company {}", j.id), logo: None },
            )
        })
        .collect()
}
