//! Filter AST shared by every retrieval path.
//!
//! A [`JobFilter`] is built once per request and rendered into the form each
//! backend understands: a tantivy query in `jobsearch-text`, an SQL predicate
//! in `jobsearch-vector`. [`Predicate::matches`] is the reference semantics
//! both renderers are tested against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, GeoPoint, GeoRadius};
use crate::params::{JobFilters, MapQuery, ValidatedParams};
use crate::types::{Job, JobStatus, ModerationStatus};

/// Keyword fields that support exact-match filtering. `name` is the stored
/// field/column name in both indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterField {
    Category,
    JobType,
    WorkType,
    Experience,
    Province,
    District,
}

impl FilterField {
    pub fn name(self) -> &'static str {
        match self {
            FilterField::Category => "category",
            FilterField::JobType => "job_type",
            FilterField::WorkType => "work_type",
            FilterField::Experience => "experience",
            FilterField::Province => "province",
            FilterField::District => "district",
        }
    }

    pub fn value_of(self, job: &Job) -> Option<&str> {
        match self {
            FilterField::Category => Some(job.category.as_str()),
            FilterField::JobType => Some(job.job_type.as_str()),
            FilterField::WorkType => Some(job.work_type.as_str()),
            FilterField::Experience => Some(job.experience.as_str()),
            FilterField::Province => job.location.province.as_deref(),
            FilterField::District => job.location.district.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Status(JobStatus),
    Moderation(ModerationStatus),
    /// Deadline on or after the instant.
    DeadlineFrom(DateTime<Utc>),
    Equals(FilterField, String),
    /// Range overlap with null job bounds treated as open. Each side only
    /// constrains when the corresponding request bound is present.
    SalaryOverlap { min: Option<i64>, max: Option<i64> },
    WithinRadius(GeoRadius),
    WithinBox(BoundingBox),
}

impl Predicate {
    pub fn matches(&self, job: &Job) -> bool {
        match self {
            Predicate::Status(s) => job.status == *s,
            Predicate::Moderation(m) => job.moderation == *m,
            Predicate::DeadlineFrom(t) => job.deadline >= *t,
            Predicate::Equals(field, value) => field.value_of(job) == Some(value.as_str()),
            Predicate::SalaryOverlap { min, max } => salary_overlaps(job.min_salary, job.max_salary, *min, *max),
            Predicate::WithinRadius(r) => job.location.point.is_some_and(|p| r.contains(p)),
            Predicate::WithinBox(b) => job.location.point.is_some_and(|p| b.contains(p)),
        }
    }
}

pub fn salary_overlaps(
    job_min: Option<i64>,
    job_max: Option<i64>,
    want_min: Option<i64>,
    want_max: Option<i64>,
) -> bool {
    let upper_ok = match (want_max, job_min) {
        (Some(max), Some(jmin)) => jmin <= max,
        _ => true,
    };
    let lower_ok = match (want_min, job_max) {
        (Some(min), Some(jmax)) => jmax >= min,
        _ => true,
    };
    upper_ok && lower_ok
}

/// Proximity preference rendered as a score boost on the text branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    pub origin: GeoPoint,
    pub pivot_km: f64,
    pub weight: f32,
}

/// Search-index rendering input: conjunctive `must` plus an optional proximity
/// `should`. The hard radius is applied later, to the union of branch hits.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndexFilter {
    pub must: Vec<Predicate>,
    pub near: Option<Proximity>,
}

impl SearchIndexFilter {
    pub fn matches(&self, job: &Job) -> bool {
        self.must.iter().all(|p| p.matches(job))
    }
}

/// Plain conjunctive predicate over stored fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreFilter {
    pub predicates: Vec<Predicate>,
}

impl PreFilter {
    pub fn matches(&self, job: &Job) -> bool {
        self.predicates.iter().all(|p| p.matches(job))
    }

    /// Exact geo predicates; backends that can only express them coarsely
    /// re-check these after decoding rows.
    pub fn geo_predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates
            .iter()
            .filter(|p| matches!(p, Predicate::WithinRadius(_) | Predicate::WithinBox(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobFilter {
    base: Vec<Predicate>,
    radius: Option<GeoRadius>,
}

impl JobFilter {
    /// Filter for the ranked search and no-query listing paths.
    pub fn for_search(params: &ValidatedParams, now: DateTime<Utc>) -> Self {
        FilterBuilder::new(now).open_jobs().filters(&params.filters).radius(params.radius).build()
    }

    pub fn for_autocomplete() -> Self {
        FilterBuilder::default()
            .status(JobStatus::Active)
            .moderation(ModerationStatus::Approved)
            .build()
    }

    pub fn for_map(query: &MapQuery, now: DateTime<Utc>) -> Self {
        FilterBuilder::new(now).open_jobs().filters(&query.filters).within_box(query.bbox).build()
    }

    pub fn base(&self) -> &[Predicate] {
        &self.base
    }

    pub fn radius(&self) -> Option<GeoRadius> {
        self.radius
    }

    /// Full semantics including the hard radius.
    pub fn matches(&self, job: &Job) -> bool {
        self.base.iter().all(|p| p.matches(job))
            && self.radius.map_or(true, |r| job.location.point.is_some_and(|p| r.contains(p)))
    }

    pub fn search_index_filter(&self, pivot_km: f64, weight: f32) -> SearchIndexFilter {
        SearchIndexFilter {
            must: self.base.clone(),
            near: self.radius.map(|r| Proximity { origin: r.center, pivot_km, weight }),
        }
    }

    /// Base predicates only, as used by the vector branch.
    pub fn pre_filter(&self) -> PreFilter {
        PreFilter { predicates: self.base.clone() }
    }

    /// Base predicates plus the hard radius, as used by the no-query path.
    pub fn listing_filter(&self) -> PreFilter {
        let mut predicates = self.base.clone();
        predicates.extend(self.radius.map(Predicate::WithinRadius));
        PreFilter { predicates }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    now: Option<DateTime<Utc>>,
    predicates: Vec<Predicate>,
    radius: Option<GeoRadius>,
}

impl FilterBuilder {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Some(now), ..Self::default() }
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.predicates.push(Predicate::Status(status));
        self
    }

    pub fn moderation(mut self, moderation: ModerationStatus) -> Self {
        self.predicates.push(Predicate::Moderation(moderation));
        self
    }

    /// ACTIVE and not past the deadline.
    pub fn open_jobs(mut self) -> Self {
        self = self.status(JobStatus::Active);
        if let Some(now) = self.now {
            self.predicates.push(Predicate::DeadlineFrom(now));
        }
        self
    }

    pub fn equals(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Equals(field, value.into()));
        self
    }

    pub fn filters(mut self, filters: &JobFilters) -> Self {
        let equalities = [
            (FilterField::Category, filters.category.clone()),
            (FilterField::JobType, filters.job_type.map(|v| v.as_str().to_string())),
            (FilterField::WorkType, filters.work_type.map(|v| v.as_str().to_string())),
            (FilterField::Experience, filters.experience.map(|v| v.as_str().to_string())),
            (FilterField::Province, filters.province.clone()),
            (FilterField::District, filters.district.clone()),
        ];
        for (field, value) in equalities {
            if let Some(value) = value {
                self = self.equals(field, value);
            }
        }
        if filters.min_salary.is_some() || filters.max_salary.is_some() {
            self.predicates.push(Predicate::SalaryOverlap { min: filters.min_salary, max: filters.max_salary });
        }
        self
    }

    pub fn within_box(mut self, bbox: BoundingBox) -> Self {
        self.predicates.push(Predicate::WithinBox(bbox));
        self
    }

    pub fn radius(mut self, radius: Option<GeoRadius>) -> Self {
        self.radius = radius;
        self
    }

    pub fn build(self) -> JobFilter {
        JobFilter { base: self.predicates, radius: self.radius }
    }
}
