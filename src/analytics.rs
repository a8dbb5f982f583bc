//! State-view analytics.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::session::{chapter_label, StateName, UiData};

/// Destination for analytics events.
///
/// Emission is fire-and-forget: a sink swallows its own failures.
pub trait AnalyticsSink: Send + Sync {
    fn track_event(&self, name: &str);
}

/// Sink that records events as structured log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AnalyticsSink for LogSink {
    fn track_event(&self, name: &str) {
        info!(event = name, "analytics event");
    }
}

/// Event name for viewing `state`.
///
/// Chapter states include the chapter number from `ui_data`, defaulting
/// to `0` when it is missing or empty.
pub fn state_view_event(state: &StateName, ui_data: &UiData) -> String {
    if state.is_chapter() {
        let chapter = chapter_label(ui_data).unwrap_or_else(|| "0".to_string());
        format!("{state}_ch{chapter}_viewed")
    } else {
        format!("{state}_viewed")
    }
}

/// Emits analytics events through an optional sink.
#[derive(Clone, Default)]
pub struct AnalyticsTracker {
    sink: Option<Arc<dyn AnalyticsSink>>,
}

impl AnalyticsTracker {
    /// Create a tracker; with no sink every event is dropped.
    pub fn new(sink: Option<Arc<dyn AnalyticsSink>>) -> Self {
        Self { sink }
    }

    /// Create a tracker that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Check whether a sink is registered.
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Emit a named event. No-op without a sink.
    pub fn track_event(&self, name: &str) {
        match &self.sink {
            Some(sink) => {
                sink.track_event(name);
                debug!(event = name, "analytics event tracked");
            }
            None => debug!(event = name, "no analytics sink, event skipped"),
        }
    }

    /// Emit the view event for `state`.
    pub fn track_state_view(&self, state: &StateName, ui_data: &UiData) {
        self.track_event(&state_view_event(state, ui_data));
    }
}

impl fmt::Debug for AnalyticsTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsTracker")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
