use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use jobsearch_core::config::Settings;
use jobsearch_core::error::{Error, Result};
use jobsearch_core::filter::JobFilter;
use jobsearch_core::params::{MapQuery, SearchParams, ValidatedParams};
use jobsearch_core::traits::{CompanyDirectory, Embedder, JobStore, SavedJobs, TextIndex, VectorIndex, VectorSearchOptions};
use jobsearch_core::types::{
    Job, MapCluster, MapPoint, MapView, Relevance, SearchHit, SearchMeta, SearchPage, SourceKind, Suggestion,
};

use crate::autocomplete::{fallback_suggestions, rank_suggestions};
use crate::clustering::{bucket_auto, singleton_clusters};
use crate::collaborators::{CompanyTable, NoSavedJobs};
use crate::embedding::{embed_query, RetryPolicy};
use crate::enrich::{company_lookup, enrich_page};
use crate::fusion::{fuse, rank_hits};
use crate::map::{map_point, position};

type Window = Vec<(Job, Option<Relevance>)>;

fn branch_failure(branch: &'static str, e: anyhow::Error) -> Error {
    tracing::error!(branch, error = %format!("{e:#}"), "search branch failed");
    Error::QueryProcessing(e)
}

fn storage_failure(e: anyhow::Error) -> Error {
    tracing::error!(error = %format!("{e:#}"), "job store query failed");
    Error::Storage(e)
}

/// Hybrid search over a lexical index `T` and a vector-capable job store `S`.
///
/// Requests are independent; the engine holds no mutable state and can be
/// shared across tasks behind an `Arc`.
pub struct JobSearchEngine<T, S> {
    text: Arc<T>,
    store: Arc<S>,
    embedder: Arc<dyn Embedder>,
    saved: Arc<dyn SavedJobs>,
    companies: Arc<dyn CompanyDirectory>,
    settings: Settings,
}

impl<T, S> JobSearchEngine<T, S>
where
    T: TextIndex + 'static,
    S: VectorIndex + JobStore + 'static,
{
    pub fn new(text: Arc<T>, store: Arc<S>, embedder: Arc<dyn Embedder>, settings: Settings) -> Self {
        Self {
            text,
            store,
            embedder,
            saved: Arc::new(NoSavedJobs),
            companies: Arc::new(CompanyTable::default()),
            settings,
        }
    }

    pub fn with_saved_jobs(mut self, saved: Arc<dyn SavedJobs>) -> Self {
        self.saved = saved;
        self
    }

    pub fn with_companies(mut self, companies: Arc<dyn CompanyDirectory>) -> Self {
        self.companies = companies;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn search(&self, params: &SearchParams, viewer: Option<&str>) -> Result<SearchPage> {
        self.search_at(params, viewer, Utc::now()).await
    }

    /// Search with an explicit clock for the deadline predicate.
    pub async fn search_at(&self, params: &SearchParams, viewer: Option<&str>, now: DateTime<Utc>) -> Result<SearchPage> {
        let params = params.validate(&self.settings.search)?;
        let filter = JobFilter::for_search(&params, now);
        let started = Instant::now();

        let (total, window) = match params.query.as_deref() {
            Some(query) => self.ranked(query, &params, &filter).await?,
            None => self.listing(&params, &filter).await?,
        };
        let data = enrich_page(window, viewer, self.saved.as_ref(), self.companies.as_ref()).await;
        tracing::debug!(
            query = params.query.as_deref().unwrap_or(""),
            total,
            returned = data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search"
        );

        Ok(SearchPage {
            data,
            meta: SearchMeta {
                current_page: params.page,
                total_pages: total.div_ceil(params.size),
                total_items: total,
                limit: params.size,
                search_query: params.query.clone(),
                applied_filters: params.applied_filters(),
            },
        })
    }

    async fn listing(&self, params: &ValidatedParams, filter: &JobFilter) -> Result<(usize, Window)> {
        let listing = self
            .store
            .list_jobs(&filter.listing_filter(), params.skip(), params.size)
            .await
            .map_err(storage_failure)?;
        let window = listing.jobs.into_iter().map(|j| (j, None)).collect();
        Ok((listing.total, window))
    }

    async fn ranked(&self, query: &str, params: &ValidatedParams, filter: &JobFilter) -> Result<(usize, Window)> {
        let s = &self.settings.search;
        let branch_limit = s.branch_limit(params.page, params.size);
        let options = VectorSearchOptions { limit: branch_limit, num_candidates: s.num_candidates(branch_limit) };
        let pre_filter = filter.pre_filter();

        let text_branch = {
            let index = Arc::clone(&self.text);
            let query = query.to_string();
            let text_filter = filter.search_index_filter(s.geo_pivot_km, s.geo_boost);
            async move {
                tokio::task::spawn_blocking(move || index.search(&query, &text_filter, branch_limit))
                    .await
                    .map_err(|e| anyhow!("text search task failed: {e}"))
                    .and_then(|r| r)
            }
        };
        let vector_branch = async {
            let embedding = embed_query(&self.embedder, query, RetryPolicy::from(&self.settings.embedding)).await?;
            let hits = self.store.search_vectors(&embedding, &pre_filter, options).await?;
            anyhow::Ok(hits)
        };
        let (text_hits, vector_hits) = tokio::join!(text_branch, vector_branch);
        let mut text_hits = text_hits.map_err(|e| branch_failure("text", e))?;
        let mut vector_hits = vector_hits.map_err(|e| branch_failure("vector", e))?;

        if let Some(radius) = filter.radius() {
            let inside = |h: &SearchHit| h.location.is_some_and(|p| radius.contains(p));
            text_hits.retain(|h| inside(h));
            vector_hits.retain(|h| inside(h));
        }
        tracing::debug!(text = text_hits.len(), vector = vector_hits.len(), branch_limit, "branch hits");

        let text_ranked = rank_hits(text_hits, SourceKind::Text);
        let vector_ranked = rank_hits(vector_hits, SourceKind::Vector);
        let fused = fuse(&text_ranked, &vector_ranked, s.rrf_k, params.weights);
        let total = fused.len();
        let window: Vec<_> = fused.into_iter().skip(params.skip()).take(params.size).collect();

        let ids: Vec<String> = window.iter().map(|r| r.job_id.clone()).collect();
        let mut by_id: HashMap<String, Job> = self
            .store
            .get_jobs(&ids)
            .await
            .map_err(storage_failure)?
            .into_iter()
            .map(|j| (j.id.clone(), j))
            .collect();
        let mut page = Vec::with_capacity(window.len());
        for r in window {
            match by_id.remove(&r.job_id) {
                Some(job) => page.push((
                    job,
                    Some(Relevance { rrf_score: r.rrf_score, text_score: r.text_score, vector_score: r.vector_score, rank: r.rank }),
                )),
                None => tracing::warn!(job_id = %r.job_id, "ranked job missing from store"),
            }
        }
        Ok((total, page))
    }

    /// Type-ahead over ACTIVE, approved job titles. Falls back to a substring
    /// scan of stored titles when the title index fails.
    pub async fn suggest(&self, query: &str, limit: Option<usize>) -> Result<Vec<Suggestion>> {
        let a = &self.settings.autocomplete;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.unwrap_or(a.default_limit).clamp(1, a.max_limit.max(1));
        let filter = JobFilter::for_autocomplete().pre_filter();

        let primary = {
            let index = Arc::clone(&self.text);
            let q = query.to_string();
            let f = filter.clone();
            let fetch = limit.saturating_mul(a.overfetch.max(1));
            tokio::task::spawn_blocking(move || index.suggest_titles(&q, &f, fetch))
                .await
                .map_err(|e| anyhow!("suggest task failed: {e}"))
                .and_then(|r| r)
        };
        match primary {
            Ok(matches) => Ok(rank_suggestions(query, matches, limit)),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "title index unavailable, using substring fallback");
                let titles = self
                    .store
                    .job_titles(&filter, query, a.fallback_scan_limit)
                    .await
                    .map_err(storage_failure)?;
                fallback_suggestions(query, titles, limit).map_err(Error::QueryProcessing)
            }
        }
    }

    pub async fn map_points(&self, query: &MapQuery) -> Result<Vec<MapPoint>> {
        self.map_points_at(query, Utc::now()).await
    }

    /// Newest jobs inside the viewport, capped at `map.point_cap`.
    pub async fn map_points_at(&self, query: &MapQuery, now: DateTime<Utc>) -> Result<Vec<MapPoint>> {
        query.validate()?;
        let filter = JobFilter::for_map(query, now).listing_filter();
        let jobs = self.store.list_jobs(&filter, 0, self.settings.map.point_cap).await.map_err(storage_failure)?.jobs;
        let companies = company_lookup(self.companies.as_ref(), &jobs).await;
        Ok(jobs.iter().filter_map(|j| map_point(j, &companies)).collect())
    }

    pub async fn map_clusters(&self, query: &MapQuery) -> Result<Vec<MapCluster>> {
        self.map_clusters_at(query, Utc::now()).await
    }

    /// Multi-member clusters inside the viewport. Store failures degrade to
    /// one-member clusters of raw points, then to an empty list.
    pub async fn map_clusters_at(&self, query: &MapQuery, now: DateTime<Utc>) -> Result<Vec<MapCluster>> {
        query.validate()?;
        let map = &self.settings.map;
        let filter = JobFilter::for_map(query, now).listing_filter();
        let buckets = map.bucket_count(query.zoom);

        match self.store.job_positions(&filter).await {
            Ok(positions) => {
                let clusters = bucket_auto(&positions, buckets, map.member_id_cap);
                tracing::debug!(zoom = query.zoom, buckets, points = positions.len(), clusters = clusters.len(), "map clusters");
                Ok(clusters)
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "clustering failed, falling back to raw points");
                match self.store.list_jobs(&filter, 0, map.fallback_point_cap).await {
                    Ok(listing) => Ok(singleton_clusters(listing.jobs.iter().filter_map(position))),
                    Err(e) => {
                        tracing::error!(error = %format!("{e:#}"), "map point fallback failed");
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    pub async fn map(&self, query: &MapQuery) -> Result<MapView> {
        self.map_at(query, Utc::now()).await
    }

    /// Raw points at high zoom, clusters below it.
    pub async fn map_at(&self, query: &MapQuery, now: DateTime<Utc>) -> Result<MapView> {
        if self.settings.map.is_high_zoom(query.zoom) {
            Ok(MapView::Points(self.map_points_at(query, now).await?))
        } else {
            Ok(MapView::Clusters(self.map_clusters_at(query, now).await?))
        }
    }
}
