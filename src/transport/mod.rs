//! Transport layer for the narrative engine.
//!
//! The engine is reachable only through a small REST surface:
//!
//! - `POST /session` - Create a session
//! - `GET /session/{id}` - Fetch the authoritative state
//! - `POST /transition` - Ask the engine to advance a session
//! - `DELETE /session/{id}` - Delete a session
//! - `GET /cost/{id}` - Cost breakdown
//! - `GET /timeline/{id}` - Completed chapters
//! - `GET /health` - Health check
//!
//! Every operation makes exactly one attempt; retrying is left to the
//! user.

mod error;
mod http;
mod types;

use async_trait::async_trait;

pub use error::{TransportError, TRANSITION_FAILED_DETAIL, UNKNOWN_ERROR_DETAIL};
pub use http::{HttpTransport, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use types::{
    CostReport, CreatedSession, ErrorBody, Payload, StateSnapshot, TimelineEvent,
    TimelineResponse, TransitionRequest, TransitionResult,
};

use crate::session::SessionId;

/// Remote operations against the engine.
///
/// Only the three session-loop operations are required; the rest default
/// to [`TransportError::Unsupported`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Create a new session.
    async fn create_session(&self) -> Result<CreatedSession, TransportError>;

    /// Fetch the current state of a session.
    async fn fetch_state(&self, id: &SessionId) -> Result<StateSnapshot, TransportError>;

    /// Submit a transition for a session.
    async fn submit_transition(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionResult, TransportError>;

    /// Delete a session on the engine.
    async fn delete_session(&self, _id: &SessionId) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("delete_session"))
    }

    /// Fetch the cost breakdown of a session.
    async fn fetch_cost(&self, _id: &SessionId) -> Result<CostReport, TransportError> {
        Err(TransportError::Unsupported("fetch_cost"))
    }

    /// Fetch the completed chapters of a session.
    async fn fetch_timeline(&self, _id: &SessionId) -> Result<Vec<TimelineEvent>, TransportError> {
        Err(TransportError::Unsupported("fetch_timeline"))
    }

    /// Check that the engine is reachable.
    async fn health(&self) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("health"))
    }
}
