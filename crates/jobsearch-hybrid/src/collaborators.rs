//! Stock implementations of the enrichment collaborators.
use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};

use jobsearch_core::traits::{CompanyDirectory, SavedJobs};
use jobsearch_core::types::{CompanySummary, JobId, RecruiterId, UserId};

/// No bookmarks for anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSavedJobs;

impl SavedJobs for NoSavedJobs {
    fn saved_job_ids<'a>(&'a self, _user_id: &'a str, _job_ids: &'a [JobId]) -> BoxFuture<'a, Result<HashSet<JobId>>> {
        futures::future::ready(Ok(HashSet::new())).boxed()
    }
}

/// Bookmarks held in memory, keyed by user.
#[derive(Debug, Clone, Default)]
pub struct SavedJobSet {
    by_user: HashMap<UserId, HashSet<JobId>>,
}

impl SavedJobSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, user: impl Into<UserId>, job: impl Into<JobId>) {
        self.by_user.entry(user.into()).or_default().insert(job.into());
    }
}

impl SavedJobs for SavedJobSet {
    fn saved_job_ids<'a>(&'a self, user_id: &'a str, job_ids: &'a [JobId]) -> BoxFuture<'a, Result<HashSet<JobId>>> {
        let found = match self.by_user.get(user_id) {
            Some(saved) => job_ids.iter().filter(|id| saved.contains(*id)).cloned().collect(),
            None => HashSet::new(),
        };
        futures::future::ready(Ok(found)).boxed()
    }
}

/// Company summaries keyed by recruiter id, typically loaded from a JSON
/// object file: `{ "<recruiterId>": { "name": "...", "logo": "..." } }`.
#[derive(Debug, Clone, Default)]
pub struct CompanyTable {
    by_recruiter: HashMap<RecruiterId, CompanySummary>,
}

impl CompanyTable {
    pub fn new(by_recruiter: HashMap<RecruiterId, CompanySummary>) -> Self {
        Self { by_recruiter }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let by_recruiter = serde_json::from_str(&raw).with_context(|| format!("{}: invalid company table", path.display()))?;
        Ok(Self { by_recruiter })
    }

    pub fn len(&self) -> usize {
        self.by_recruiter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_recruiter.is_empty()
    }
}

impl CompanyDirectory for CompanyTable {
    fn companies<'a>(&'a self, recruiter_ids: &'a [RecruiterId]) -> BoxFuture<'a, Result<HashMap<RecruiterId, CompanySummary>>> {
        let found = recruiter_ids
            .iter()
            .filter_map(|id| self.by_recruiter.get(id).map(|c| (id.clone(), c.clone())))
            .collect();
        futures::future::ready(Ok(found)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn saved_set_reports_membership_per_user() {
        let mut saved = SavedJobSet::new();
        saved.save("u1", "a");
        saved.save("u2", "b");
        let ids = vec!["a".to_string(), "b".to_string()];
        let got = saved.saved_job_ids("u1", &ids).await.unwrap();
        assert_eq!(got, HashSet::from(["a".to_string()]));
        assert!(saved.saved_job_ids("nobody", &ids).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn company_table_loads_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"rec-1": {{"name": "Acme", "logo": "https://cdn/acme.png"}}, "rec-2": {{"name": "Globex"}}}}"#).unwrap();
        let table = CompanyTable::from_json_file(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        let found = table.companies(&["rec-2".to_string(), "rec-9".to_string()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["rec-2"], CompanySummary { name: "Globex".into(), logo: None });
    }
}
