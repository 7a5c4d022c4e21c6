//! Domain types shared by the text, vector and hybrid engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

pub type JobId = String;
pub type RecruiterId = String;
pub type UserId = String;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $code)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored code, identical in every index.
            pub fn as_str(self) -> &'static str {
                match self { $($name::$variant => $code),+ }
            }

            pub fn parse(code: &str) -> Option<Self> {
                match code { $($code => Some($name::$variant),)+ _ => None }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Lifecycle status; jobs are never deleted, only transitioned.
    JobStatus { Active => "ACTIVE", Inactive => "INACTIVE", Expired => "EXPIRED" }
);

string_enum!(
    ModerationStatus { Pending => "PENDING", Approved => "APPROVED", Rejected => "REJECTED" }
);

string_enum!(
    JobType {
        FullTime => "FULL_TIME",
        PartTime => "PART_TIME",
        Contract => "CONTRACT",
        Internship => "INTERNSHIP",
        Freelance => "FREELANCE",
    }
);

string_enum!(
    WorkType { Onsite => "ONSITE", Remote => "REMOTE", Hybrid => "HYBRID" }
);

string_enum!(
    ExperienceLevel {
        NoExperience => "NO_EXPERIENCE",
        LessThanOneYear => "LESS_THAN_ONE_YEAR",
        OneToThreeYears => "ONE_TO_THREE_YEARS",
        ThreeToFiveYears => "THREE_TO_FIVE_YEARS",
        MoreThanFiveYears => "MORE_THAN_FIVE_YEARS",
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLocation {
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub point: Option<GeoPoint>,
}

/// A slice of a job's text with its precomputed embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A job listing as stored. `chunks` is only populated on ingestion; stores
/// return it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub recruiter_id: RecruiterId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub benefits: String,
    pub category: String,
    pub job_type: JobType,
    pub work_type: WorkType,
    pub experience: ExperienceLevel,
    #[serde(default)]
    pub min_salary: Option<i64>,
    #[serde(default)]
    pub max_salary: Option<i64>,
    #[serde(default)]
    pub location: JobLocation,
    pub deadline: DateTime<Utc>,
    pub status: JobStatus,
    pub moderation: ModerationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub chunks: Vec<JobChunk>,
}

/// Indicates which engine produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Vector,
    Text,
}

/// The minimal surface returned by both retrieval branches.
///
/// `score` is branch-specific but higher is always better. `location` is the
/// job's stored point, needed for the radius filter over the branch union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: JobId,
    pub score: f32,
    pub source: SourceKind,
    pub location: Option<GeoPoint>,
}

/// One job's position within one branch's ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub job_id: JobId,
    pub branch: SourceKind,
    pub score: f32,
    /// 1-based.
    pub rank: usize,
}

/// A job that survived fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedResult {
    pub job_id: JobId,
    pub rrf_score: f64,
    pub text_score: Option<f32>,
    pub vector_score: Option<f32>,
    /// 1-based position in the fused total order.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relevance {
    pub rrf_score: f64,
    pub text_score: Option<f32>,
    pub vector_score: Option<f32>,
    pub rank: usize,
}

/// A job as returned to clients: heavy text fields and chunks are stripped,
/// company and per-viewer state are attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: JobId,
    pub recruiter_id: RecruiterId,
    pub title: String,
    pub category: String,
    pub job_type: JobType,
    pub work_type: WorkType,
    pub experience: ExperienceLevel,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub location: JobLocation,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub company: Option<CompanySummary>,
    pub is_saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<Relevance>,
}

impl JobSummary {
    pub fn from_job(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            recruiter_id: job.recruiter_id.clone(),
            title: job.title.clone(),
            category: job.category.clone(),
            job_type: job.job_type,
            work_type: job.work_type,
            experience: job.experience,
            min_salary: job.min_salary,
            max_salary: job.max_salary,
            location: job.location.clone(),
            deadline: job.deadline,
            created_at: job.created_at,
            company: None,
            is_saved: false,
            relevance: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub limit: usize,
    pub search_query: Option<String>,
    pub applied_filters: crate::params::AppliedFilters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub data: Vec<JobSummary>,
    pub meta: SearchMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub title: String,
    pub score: f32,
    pub is_prefix_match: bool,
}

/// Raw title hit from the primary autocomplete index.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleMatch {
    pub title: String,
    pub score: f32,
}

/// One window of a newest-first listing and the number of jobs matching
/// overall.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobListing {
    pub total: usize,
    pub jobs: Vec<Job>,
}

/// Id and coordinates only; the input to clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosition {
    pub id: JobId,
    pub point: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPoint {
    pub id: JobId,
    pub title: String,
    pub point: GeoPoint,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub job_type: JobType,
    pub company: Option<CompanySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "cluster", rename_all = "camelCase")]
pub struct MapCluster {
    pub centroid: GeoPoint,
    pub count: usize,
    /// Omitted for large clusters to bound payload size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_ids: Option<Vec<JobId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "items", rename_all = "lowercase")]
pub enum MapView {
    Points(Vec<MapPoint>),
    Clusters(Vec<MapCluster>),
}
