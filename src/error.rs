use thiserror::Error;

/// Errors raised while building the monitor. Publishing itself never fails.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Config error: {key} must be valid (got {value:?})")]
    Config { key: &'static str, value: String },

    #[error("invalid collector url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid api key header value")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
