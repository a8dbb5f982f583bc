//! Transport-level failures.

use thiserror::Error;

/// Detail used when a rejected transition carries no `detail` field.
pub const TRANSITION_FAILED_DETAIL: &str = "Transition failed";

/// Detail used when a rejected transition body cannot be decoded at all.
pub const UNKNOWN_ERROR_DETAIL: &str = "Unknown error";

/// A failure reaching the engine or understanding its answer.
///
/// The `Display` text of every variant is the raw message that error
/// classification runs against, so it never includes the request URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established or was interrupted.
    #[error("{0}")]
    Network(String),

    /// The request did not complete in time.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The engine answered with a non-success status.
    #[error("HTTP {status}")]
    Status { status: u16, endpoint: String },

    /// A transition was refused; `detail` comes from the error body.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    /// The response body was not what the engine contract promises.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The engine API root cannot address endpoints.
    #[error("invalid engine URL: {0}")]
    InvalidUrl(String),

    /// The transport does not implement this operation.
    #[error("operation not supported by transport: {0}")]
    Unsupported(&'static str),
}

/// Flatten an error and its sources into one line.
///
/// reqwest keeps the interesting part (e.g. "connection reset") in the
/// source chain, so the top-level message alone is not enough to classify.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        let err = err.without_url();

        if err.is_timeout() {
            return Self::Timeout(error_chain(&err));
        }
        if err.is_decode() {
            return Self::Decode(error_chain(&err));
        }
        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
                endpoint,
            };
        }
        Self::Network(error_chain(&err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl std::fmt::Display for Inner {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "connection reset by peer")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    impl std::error::Error for Inner {}

    #[test]
    fn test_error_chain_includes_sources() {
        let err = Outer(Inner);
        assert_eq!(
            error_chain(&err),
            "error sending request: connection reset by peer"
        );
    }

    #[test]
    fn test_rejected_display_is_detail() {
        let err = TransportError::Rejected {
            status: 400,
            detail: "Session abc not found".into(),
        };
        assert_eq!(err.to_string(), "Session abc not found");
    }

    #[test]
    fn test_status_display_leaves_out_endpoint() {
        let err = TransportError::Status {
            status: 404,
            endpoint: "/api/session/sess-500".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[test]
    fn test_timeout_display_mentions_timeout() {
        let err = TransportError::Timeout("operation timed out".into());
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_unsupported_names_operation() {
        let err = TransportError::Unsupported("fetch_cost");
        assert!(err.to_string().contains("fetch_cost"));
    }
}
