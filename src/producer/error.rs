//! Errors raised while fetching upstream status.

use thiserror::Error;

use crate::status::FailureReason;

/// Errors that can occur during one producer cycle.
///
/// None of these are fatal: the producer turns each into a
/// [`FailureMarker`](crate::status::FailureMarker) and carries on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection or DNS failure.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Upstream answered with a non-success status.
    #[error("Upstream returned status {0}")]
    Status(u16),

    /// Credentials were rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Response parsed but does not describe the configured station.
    #[error("Inconsistent upstream data: {0}")]
    Inconsistent(String),

    /// HTTP request failed for another reason.
    #[error("HTTP request failed: {0}")]
    Http(String),
}

impl FetchError {
    /// Classify into the reason carried by a failure marker.
    pub fn reason(&self) -> FailureReason {
        match self {
            FetchError::Connection(_) | FetchError::Status(_) => FailureReason::Network,
            FetchError::Timeout => FailureReason::Timeout,
            FetchError::Parse(_) | FetchError::Inconsistent(_) => FailureReason::UpstreamFormat,
            FetchError::Auth(_) | FetchError::Http(_) => FailureReason::Unknown,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_classification() {
        assert_eq!(FetchError::Timeout.reason(), FailureReason::Timeout);
        assert_eq!(
            FetchError::Connection("dns".into()).reason(),
            FailureReason::Network
        );
        assert_eq!(FetchError::Status(503).reason(), FailureReason::Network);
        assert_eq!(
            FetchError::Parse("eof".into()).reason(),
            FailureReason::UpstreamFormat
        );
        assert_eq!(
            FetchError::Auth("401".into()).reason(),
            FailureReason::Unknown
        );
    }

    #[test]
    fn test_json_error_is_format_failure() {
        let err: FetchError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.reason(), FailureReason::UpstreamFormat);
    }
}
