//! User-facing classification of transport failures.
//!
//! This is a heuristic layer, not a structured error protocol: the raw
//! failure text is matched against ordered substring rules and the first
//! match wins. Callers only see the [`ErrorClassifier`] trait, so a
//! structured error-code contract can replace it later.

use std::fmt;

use serde::Serialize;

/// Substrings that mean the connection dropped mid-request.
const INTERRUPTED_SIGNATURES: &[&str] = &[
    "peer closed connection",
    "chunked read",
    "connection closed before message completed",
    "connection reset",
];

pub const NETWORK_MESSAGE: &str = "Network connection interrupted. Please try again.";
pub const SERVER_MESSAGE: &str =
    "Server error. The AI service may be temporarily unavailable. Please try again in a moment.";
pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again.";

/// Broad kind of a user-facing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Server,
    Timeout,
    Generic,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Server => "server",
            Self::Timeout => "timeout",
            Self::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// An error ready to be shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    pub message: String,
    pub category: ErrorCategory,
}

impl ClassifiedError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category,
        }
    }

    /// A generic error whose message is shown as-is.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Generic, message)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ClassifiedError {}

/// Maps raw failure text to a user-facing error.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, raw: &str) -> ClassifiedError;
}

/// Ordered substring rules:
///
/// 1. connection interrupted -> `Network`
/// 2. contains `500` -> `Server`
/// 3. contains `timeout` -> `Timeout`
/// 4. anything else -> `Generic`, message unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringClassifier;

impl ErrorClassifier for SubstringClassifier {
    fn classify(&self, raw: &str) -> ClassifiedError {
        if INTERRUPTED_SIGNATURES.iter().any(|sig| raw.contains(sig)) {
            ClassifiedError::new(ErrorCategory::Network, NETWORK_MESSAGE)
        } else if raw.contains("500") {
            ClassifiedError::new(ErrorCategory::Server, SERVER_MESSAGE)
        } else if raw.contains("timeout") {
            ClassifiedError::new(ErrorCategory::Timeout, TIMEOUT_MESSAGE)
        } else {
            ClassifiedError::generic(raw)
        }
    }
}
