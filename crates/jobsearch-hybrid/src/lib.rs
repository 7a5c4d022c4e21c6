//! Hybrid job search: concurrent text and vector retrieval fused with
//! reciprocal rank fusion, plus type-ahead and map clustering.

pub mod autocomplete;
pub mod clustering;
pub mod collaborators;
pub mod embedding;
pub mod engine;
pub mod enrich;
pub mod fusion;
pub mod map;

pub use collaborators::{CompanyTable, NoSavedJobs, SavedJobSet};
pub use engine::JobSearchEngine;
