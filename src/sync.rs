//! Keeps the local session view in step with the engine.

use std::sync::Arc;

use tracing::debug;

use crate::analytics::AnalyticsTracker;
use crate::session::{Session, SessionId, SessionStore};
use crate::transport::Transport;
use crate::Result;

/// Fetches authoritative state and swaps it into the store.
///
/// A state view is tracked only on a state-change edge: when the fetched
/// state differs from the one it replaces (or there was no session).
#[derive(Clone)]
pub struct StateSynchronizer {
    transport: Arc<dyn Transport>,
    store: Arc<SessionStore>,
    analytics: AnalyticsTracker,
}

impl StateSynchronizer {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<SessionStore>,
        analytics: AnalyticsTracker,
    ) -> Self {
        Self {
            transport,
            store,
            analytics,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Fetch the state of `id` and make it the live session.
    ///
    /// On failure the store keeps its last good snapshot.
    pub async fn refresh(&self, id: &SessionId) -> Result<Session> {
        let snapshot = self.transport.fetch_state(id).await?;
        let session = Session::from_snapshot(id.clone(), snapshot);

        let previous = self.store.replace(session.clone())?;
        debug!(
            session_id = %id,
            state = %session.state,
            previous = previous.as_ref().map(|s| s.as_str()).unwrap_or("<none>"),
            "state refreshed"
        );

        if previous.as_ref() != Some(&session.state) {
            self.analytics
                .track_state_view(&session.state, &session.ui_data);
        }

        Ok(session)
    }
}
