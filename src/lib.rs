//! # greatness-client
//!
//! Client for The Greatness Path narrative engine.
//!
//! The engine owns the story; this crate keeps a local view of one
//! session in step with it. It creates the session, refreshes the
//! authoritative state after every successful transition, turns transport
//! failures into short user-facing messages, and emits one analytics
//! event each time the narrative state changes.
//!
//! ## Features
//!
//! - **Snapshot consistency**: the local session is always a complete
//!   snapshot from the engine, never a client-side merge
//! - **Edge-triggered analytics**: state view events fire once per state change
//! - **Observable controller**: `loading` / `error` / session published over a
//!   `watch` channel
//! - **Self-clearing errors**: transition errors dismiss themselves unless
//!   replaced in the meantime
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use greatness_client::{AnalyticsTracker, HttpTransport, LogSink, TransitionController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     greatness_client::logging::try_init().ok();
//!
//!     let transport = Arc::new(HttpTransport::new("http://127.0.0.1:8000/api")?);
//!     let analytics = AnalyticsTracker::new(Some(Arc::new(LogSink)));
//!     let controller = TransitionController::new(transport, analytics);
//!
//!     let session = controller.create_session().await?;
//!     println!("Session {} is at {}", session.id, session.state);
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod logging;
pub mod session;
pub mod sync;
pub mod transport;

// Re-export commonly used types
pub use analytics::{AnalyticsSink, AnalyticsTracker, LogSink};
pub use classifier::{ClassifiedError, ErrorCategory, ErrorClassifier, SubstringClassifier};
pub use controller::{ControllerView, Phase, PresentedError, TransitionController};
pub use error::{ClientError, Result};
pub use session::{Character, Session, SessionId, SessionStore, StateName, UiData};
pub use sync::StateSynchronizer;
pub use transport::{HttpTransport, Payload, Transport, TransportError};
