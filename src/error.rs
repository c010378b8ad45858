// Typed errors for the places callers need to match on the failure.
// File I/O boundaries use anyhow with context instead.

use thiserror::Error;

/// Text that does not name a known category, profile or pollutant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown AQI category: {0}")]
    UnknownCategory(String),

    #[error("Unknown health profile: {0}")]
    UnknownProfile(String),

    #[error("Unknown pollutant: {0}")]
    UnknownPollutant(String),
}

/// Failure talking to a live AQI or weather provider. Never surfaced to the
/// dashboards as-is; they only see "unavailable".
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Provider not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Provider returned HTTP {0}")]
    Status(u16),

    #[error("Provider reported an error: {0}")]
    Provider(String),

    #[error("Unexpected payload: {0}")]
    Payload(String),
}

#[cfg(feature = "live")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Payload(err.to_string())
    }
}
