//! Transition orchestration for the presentation layer.
//!
//! [`TransitionController`] composes the transport, the state
//! synchronizer and the error classifier, and publishes a
//! [`ControllerView`] through a `watch` channel after every change.
//!
//! ## Concurrency
//!
//! Calls are expected one at a time: the presentation layer disables its
//! controls while `loading` is set. Overlapping `submit` calls are neither
//! queued nor rejected.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use greatness_client::{AnalyticsTracker, HttpTransport, Payload, TransitionController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(HttpTransport::new("http://127.0.0.1:8000/api")?);
//!     let controller = TransitionController::new(transport, AnalyticsTracker::disabled());
//!
//!     controller.create_session().await?;
//!     controller.submit("begin", Payload::new()).await?;
//!     println!("{:?}", controller.view().state());
//!     Ok(())
//! }
//! ```

mod view;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::analytics::AnalyticsTracker;
use crate::classifier::{ClassifiedError, ErrorClassifier, SubstringClassifier};
use crate::error::ClientError;
use crate::session::{Session, SessionStore};
use crate::sync::StateSynchronizer;
use crate::transport::{
    CostReport, Payload, TimelineEvent, TransitionRequest, TransitionResult, Transport,
};
use crate::Result;

pub use view::{ControllerView, Phase, PresentedError};

/// How long a transition error stays up before it clears itself.
pub const DEFAULT_ERROR_DISMISS: Duration = Duration::from_secs(5);

/// Prefix of the message shown when a session cannot be created.
pub const CREATE_FAILED_PREFIX: &str = "Failed to create session: ";

/// Keeps `loading` set for as long as it is alive.
struct LoadingGuard<'a> {
    view: &'a watch::Sender<ControllerView>,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(view: &'a watch::Sender<ControllerView>) -> Self {
        view.send_modify(|v| v.loading = true);
        Self { view }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.view.send_modify(|v| v.loading = false);
    }
}

/// Top-level orchestrator of one narrative session.
pub struct TransitionController {
    transport: Arc<dyn Transport>,
    synchronizer: StateSynchronizer,
    classifier: Arc<dyn ErrorClassifier>,
    view: Arc<watch::Sender<ControllerView>>,
    input: Mutex<Payload>,
    error_dismiss: Duration,
    next_error_id: AtomicU64,
}

impl TransitionController {
    /// Create a controller with the substring classifier and the default
    /// dismiss delay.
    pub fn new(transport: Arc<dyn Transport>, analytics: AnalyticsTracker) -> Self {
        let store = Arc::new(SessionStore::new());
        let synchronizer = StateSynchronizer::new(Arc::clone(&transport), store, analytics);
        let (view, _) = watch::channel(ControllerView::default());

        Self {
            transport,
            synchronizer,
            classifier: Arc::new(SubstringClassifier),
            view: Arc::new(view),
            input: Mutex::new(Payload::new()),
            error_dismiss: DEFAULT_ERROR_DISMISS,
            next_error_id: AtomicU64::new(1),
        }
    }

    /// Use a different error classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Change how long transition errors stay visible.
    pub fn with_error_dismiss(mut self, delay: Duration) -> Self {
        self.error_dismiss = delay;
        self
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Current view snapshot.
    pub fn view(&self) -> ControllerView {
        self.view.borrow().clone()
    }

    /// Subscribe to view changes.
    pub fn subscribe(&self) -> watch::Receiver<ControllerView> {
        self.view.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.view.borrow().loading
    }

    pub fn error(&self) -> Option<PresentedError> {
        self.view.borrow().error.clone()
    }

    /// The live session, if one is established.
    pub fn session(&self) -> Option<Session> {
        self.synchronizer.store().current().ok()
    }

    pub fn error_dismiss(&self) -> Duration {
        self.error_dismiss
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Create a session on the engine and synchronize its first state.
    ///
    /// Any previous session is dropped first. Failures are shown as a
    /// fixed creation-failure message that stays until dismissed.
    pub async fn create_session(&self) -> std::result::Result<Session, ClassifiedError> {
        let _loading = LoadingGuard::acquire(&self.view);
        self.view.send_modify(|v| {
            v.error = None;
            v.session = None;
        });

        match self.establish().await {
            Ok(session) => {
                info!(session_id = %session.id, state = %session.state, "session established");
                self.publish_session(Some(session.clone()));
                Ok(session)
            }
            Err(err) => {
                warn!(error = %err, "session creation failed");
                self.synchronizer.store().clear().ok();
                let error = ClassifiedError::generic(format!("{CREATE_FAILED_PREFIX}{err}"));
                self.present(error.clone(), false);
                Err(error)
            }
        }
    }

    async fn establish(&self) -> Result<Session> {
        self.synchronizer.store().clear()?;
        let created = self.transport.create_session().await?;
        self.synchronizer.refresh(&created.session_id).await
    }

    /// Delete the live session on the engine and forget it locally.
    pub async fn end_session(&self) -> Result<()> {
        let id = self.synchronizer.store().session_id()?;
        self.transport.delete_session(&id).await?;
        self.synchronizer.store().clear()?;
        self.publish_session(None);
        info!(session_id = %id, "session ended");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Ask the engine to advance the live session.
    ///
    /// On success the view is refreshed from the engine and the input
    /// buffer is cleared. On failure the classified error is shown and
    /// cleared again after the dismiss delay, unless something else has
    /// replaced it by then.
    pub async fn submit(
        &self,
        action: &str,
        data: Payload,
    ) -> std::result::Result<TransitionResult, ClassifiedError> {
        let _loading = LoadingGuard::acquire(&self.view);
        self.view.send_modify(|v| v.error = None);

        match self.transition(action, data).await {
            Ok((result, session)) => {
                self.publish_session(Some(session));
                self.clear_input();
                Ok(result)
            }
            Err(err) => {
                warn!(action, error = %err, "transition failed");
                let error = self.classifier.classify(&err.to_string());
                let id = self.present(error.clone(), true);
                self.schedule_dismiss(id);
                Err(error)
            }
        }
    }

    async fn transition(&self, action: &str, data: Payload) -> Result<(TransitionResult, Session)> {
        let session_id = self.synchronizer.store().session_id()?;
        debug!(session_id = %session_id, action, "submitting transition");

        let request = TransitionRequest::new(session_id.clone(), action, data);
        let result = self.transport.submit_transition(&request).await?;
        debug!(
            success = result.success,
            next_state = ?result.next_state,
            "transition accepted"
        );

        let session = self.synchronizer.refresh(&session_id).await?;
        Ok((result, session))
    }

    /// Submit the input buffer as the payload of `action`.
    pub async fn submit_input(
        &self,
        action: &str,
    ) -> std::result::Result<TransitionResult, ClassifiedError> {
        let data = self.input().unwrap_or_default();
        self.submit(action, data).await
    }

    /// Pick an archetype on the order reveal screen.
    pub async fn select_archetype(
        &self,
        archetype: &str,
    ) -> std::result::Result<TransitionResult, ClassifiedError> {
        let mut data = Payload::new();
        data.insert("archetype".into(), Value::String(archetype.to_string()));
        self.submit("select_archetype", data).await
    }

    // ------------------------------------------------------------------
    // Input buffer
    // ------------------------------------------------------------------

    /// Set one field of the input buffer.
    pub fn set_input(&self, key: impl Into<String>, value: Value) -> Result<()> {
        let mut input = self.input.lock().map_err(|_| ClientError::LockPoisoned)?;
        input.insert(key.into(), value);
        Ok(())
    }

    /// Copy of the input buffer.
    pub fn input(&self) -> Result<Payload> {
        let input = self.input.lock().map_err(|_| ClientError::LockPoisoned)?;
        Ok(input.clone())
    }

    fn clear_input(&self) {
        if let Ok(mut input) = self.input.lock() {
            input.clear();
        }
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    /// Clear the shown error. Returns whether there was one.
    pub fn dismiss_error(&self) -> bool {
        self.view.send_if_modified(|v| v.error.take().is_some())
    }

    fn present(&self, error: ClassifiedError, auto_dismiss: bool) -> u64 {
        let id = self.next_error_id.fetch_add(1, Ordering::Relaxed);
        self.view.send_modify(|v| {
            v.error = Some(PresentedError {
                id,
                error,
                auto_dismiss,
            })
        });
        id
    }

    /// Clear error `id` after the dismiss delay if it is still shown.
    fn schedule_dismiss(&self, id: u64) {
        let view = Arc::clone(&self.view);
        let delay = self.error_dismiss;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let cleared = view.send_if_modified(|v| match &v.error {
                Some(shown) if shown.id == id => {
                    v.error = None;
                    true
                }
                _ => false,
            });
            if cleared {
                debug!(error_id = id, "error auto-dismissed");
            }
        });
    }

    fn publish_session(&self, session: Option<Session>) {
        self.view.send_modify(|v| v.session = session);
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    /// Cost breakdown of the live session.
    pub async fn cost_report(&self) -> Result<CostReport> {
        let id = self.synchronizer.store().session_id()?;
        Ok(self.transport.fetch_cost(&id).await?)
    }

    /// Completed chapters of the live session.
    pub async fn timeline(&self) -> Result<Vec<TimelineEvent>> {
        let id = self.synchronizer.store().session_id()?;
        Ok(self.transport.fetch_timeline(&id).await?)
    }

    /// Check that the engine is reachable.
    pub async fn health(&self) -> Result<()> {
        Ok(self.transport.health().await?)
    }
}
