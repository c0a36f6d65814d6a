use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not load robots policy from {url}: {source}")]
    Robots {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

/// Why a single page could not be fetched. None of these stop a crawl.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("page not found ({0})")]
    NotFound(u16),

    #[error("server could not load page ({0})")]
    Server(u16),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Maps a non-success HTTP status onto the matching variant.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 | 410 => FetchError::NotFound(status),
            500..=599 => FetchError::Server(status),
            _ => FetchError::Status(status),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
