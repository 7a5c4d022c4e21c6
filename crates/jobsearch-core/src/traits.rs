use std::collections::{HashMap, HashSet};
use std::future::Future;

use futures::future::BoxFuture;

use crate::filter::{PreFilter, SearchIndexFilter};
use crate::types::{CompanySummary, Job, JobId, JobListing, JobPosition, RecruiterId, SearchHit, TitleMatch};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Lexical index over job text. Implementations block; callers move them to
/// the blocking pool.
pub trait TextIndex: Send + Sync {
    /// Fuzzy title-required search. Hits are ordered by descending score.
    fn search(&self, query: &str, filter: &SearchIndexFilter, limit: usize) -> anyhow::Result<Vec<SearchHit>>;

    /// Raw title candidates for type-ahead, possibly with duplicate titles.
    fn suggest_titles(&self, query: &str, filter: &PreFilter, limit: usize) -> anyhow::Result<Vec<TitleMatch>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorSearchOptions {
    /// Jobs to return after collapsing chunks.
    pub limit: usize,
    /// Chunk rows requested from the ANN index.
    pub num_candidates: usize,
}

pub trait VectorIndex: Send + Sync {
    /// Nearest jobs by best chunk similarity, ordered by descending score.
    fn search_vectors(
        &self,
        query: &[f32],
        filter: &PreFilter,
        options: VectorSearchOptions,
    ) -> impl Future<Output = anyhow::Result<Vec<SearchHit>>> + Send;
}

pub trait JobStore: Send + Sync {
    /// Matching jobs ordered by creation time descending, then id ascending.
    /// Only the `offset..offset + limit` window is loaded in full; `total`
    /// counts every match.
    fn list_jobs(
        &self,
        filter: &PreFilter,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = anyhow::Result<JobListing>> + Send;

    /// Jobs by id in no particular order; unknown ids are skipped.
    fn get_jobs(&self, ids: &[JobId]) -> impl Future<Output = anyhow::Result<Vec<Job>>> + Send;

    /// Every matching job that has coordinates.
    fn job_positions(&self, filter: &PreFilter) -> impl Future<Output = anyhow::Result<Vec<JobPosition>>> + Send;

    /// Up to `limit` titles containing `needle`, compared case-insensitively.
    /// The match is applied before the limit.
    fn job_titles(
        &self,
        filter: &PreFilter,
        needle: &str,
        limit: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<String>>> + Send;
}

/// Per-user bookmark membership.
pub trait SavedJobs: Send + Sync {
    fn saved_job_ids<'a>(&'a self, user_id: &'a str, job_ids: &'a [JobId]) -> BoxFuture<'a, anyhow::Result<HashSet<JobId>>>;
}

/// Company name and logo keyed by recruiter.
pub trait CompanyDirectory: Send + Sync {
    fn companies<'a>(
        &'a self,
        recruiter_ids: &'a [RecruiterId],
    ) -> BoxFuture<'a, anyhow::Result<HashMap<RecruiterId, CompanySummary>>>;
}
