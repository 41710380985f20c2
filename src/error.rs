//! Error types for the parity checker
//!
//! Check-level failures never abort a run: they are downgraded to a `fail`
//! CheckResult whose detail is the failure's display text. Only
//! orchestration and configuration problems surface as `ParityError`.

use thiserror::Error;

/// Why a single check failed.
///
/// The `Display` text is the detail string recorded on the CheckResult.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    /// Network, DNS or timeout failure reaching the endpoint
    #[error("{0}")]
    Transport(String),

    /// Endpoint answered with a non-2xx status
    #[error("Returned {0}")]
    HttpStatus(u16),

    /// Body was not JSON, or not the shape the predicate expects
    #[error("{0}")]
    Decode(String),

    /// Well-formed response that misses the pass bar
    #[error("{0}")]
    Threshold(String),
}

impl CheckFailure {
    pub fn decode(message: impl Into<String>) -> Self {
        CheckFailure::Decode(message.into())
    }

    pub fn threshold(detail: impl Into<String>) -> Self {
        CheckFailure::Threshold(detail.into())
    }

    /// Short machine-friendly kind, used in logs and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            CheckFailure::Transport(_) => "transport",
            CheckFailure::HttpStatus(_) => "http_status",
            CheckFailure::Decode(_) => "decode",
            CheckFailure::Threshold(_) => "threshold",
        }
    }
}

/// Identity storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Identity store error: {0}")]
    Backend(String),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid target '{0}': expected NAME=URL or URL")]
    InvalidTarget(String),

    #[error("Invalid session entry '{0}': expected TOKEN=SUBJECT")]
    InvalidSession(String),

    #[error("Invalid bind address '{0}'")]
    InvalidBindAddr(String),
}

/// Orchestration-level errors
#[derive(Error, Debug)]
pub enum ParityError {
    #[error("A parity run is already in progress")]
    RunInProgress,

    #[error("HTTP client error: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display_contains_code() {
        let failure = CheckFailure::HttpStatus(503);
        assert_eq!(failure.to_string(), "Returned 503");
        assert_eq!(failure.kind(), "http_status");
    }

    #[test]
    fn test_transport_display_is_raw_message() {
        let failure = CheckFailure::Transport("connection refused".into());
        assert_eq!(failure.to_string(), "connection refused");
    }

    #[test]
    fn test_parity_error_messages() {
        assert_eq!(
            ParityError::RunInProgress.to_string(),
            "A parity run is already in progress"
        );
        assert_eq!(
            ParityError::Client("tls backend unavailable".into()).to_string(),
            "HTTP client error: tls backend unavailable"
        );
    }
}
