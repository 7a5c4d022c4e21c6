use thiserror::Error;

/// Errors surfaced to callers of the search engine.
///
/// Display strings are safe to show to end users. Internal causes stay in
/// `source()` and in the logs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("could not process search query")]
    QueryProcessing(#[source] anyhow::Error),

    #[error("search is temporarily unavailable")]
    Storage(#[source] anyhow::Error),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
