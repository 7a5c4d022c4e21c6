//! Per-page enrichment: saved flags and company summaries. Both lookups are
//! best effort; a failing collaborator leaves its fields at their defaults.
use std::collections::{BTreeSet, HashMap, HashSet};

use jobsearch_core::traits::{CompanyDirectory, SavedJobs};
use jobsearch_core::types::{CompanySummary, Job, JobId, JobSummary, RecruiterId, Relevance};

/// Company summaries for the recruiters behind `jobs`; empty on failure.
pub async fn company_lookup<'a>(
    directory: &dyn CompanyDirectory,
    jobs: impl IntoIterator<Item = &'a Job>,
) -> HashMap<RecruiterId, CompanySummary> {
    let recruiters: Vec<RecruiterId> =
        jobs.into_iter().map(|j| j.recruiter_id.clone()).collect::<BTreeSet<_>>().into_iter().collect();
    if recruiters.is_empty() {
        return HashMap::new();
    }
    match directory.companies(&recruiters).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, recruiters = recruiters.len(), "company lookup failed; omitting company data");
            HashMap::new()
        }
    }
}

/// Saved-job membership for `viewer`; empty without a viewer or on failure.
pub async fn saved_lookup(saved: &dyn SavedJobs, viewer: Option<&str>, job_ids: &[JobId]) -> HashSet<JobId> {
    let Some(user) = viewer.filter(|u| !u.is_empty()) else {
        return HashSet::new();
    };
    if job_ids.is_empty() {
        return HashSet::new();
    }
    match saved.saved_job_ids(user, job_ids).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e, "saved-job lookup failed; flags default to false");
            HashSet::new()
        }
    }
}

/// Builds the client payload for one result window, preserving its order.
pub async fn enrich_page(
    page: Vec<(Job, Option<Relevance>)>,
    viewer: Option<&str>,
    saved: &dyn SavedJobs,
    companies: &dyn CompanyDirectory,
) -> Vec<JobSummary> {
    let ids: Vec<JobId> = page.iter().map(|(j, _)| j.id.clone()).collect();
    let (saved_ids, company_map) =
        tokio::join!(saved_lookup(saved, viewer, &ids), company_lookup(companies, page.iter().map(|(j, _)| j)));

    page.into_iter()
        .map(|(job, relevance)| {
            let mut summary = JobSummary::from_job(&job);
            summary.company = company_map.get(&job.recruiter_id).cloned();
            summary.is_saved = saved_ids.contains(&job.id);
            summary.relevance = relevance;
            summary
        })
        .collect()
}
