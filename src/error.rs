//! Error types for greatness-client.

use thiserror::Error;

use crate::transport::TransportError;

/// Main error type for client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The engine could not be reached or refused the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An operation needed a live session and there is none.
    #[error("no live session")]
    NoSession,

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,
}

/// Convenience Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
