//! Observable controller state.

use serde::Serialize;

use crate::classifier::ClassifiedError;
use crate::session::{Session, StateName};

/// An error currently shown to the player.
///
/// `id` is unique per presentation, so the auto-dismiss timer of one
/// failure can never clear a later one even if the text is identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentedError {
    pub id: u64,
    #[serde(flatten)]
    pub error: ClassifiedError,
    /// Whether a timer will clear this error on its own.
    pub auto_dismiss: bool,
}

impl PresentedError {
    pub fn message(&self) -> &str {
        &self.error.message
    }
}

/// Client-side phase, derived from the view.
///
/// Mirrors the engine's progress but never enforces it: the state name in
/// `Synced` always comes from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Creating,
    Synced(StateName),
    Transitioning,
    Errored,
}

/// Snapshot published to observers after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControllerView {
    /// A create or submit call is in flight.
    pub loading: bool,
    /// Error currently shown, if any.
    pub error: Option<PresentedError>,
    /// Last synchronized session.
    pub session: Option<Session>,
}

impl ControllerView {
    pub fn phase(&self) -> Phase {
        match (&self.session, self.loading, &self.error) {
            (None, true, _) => Phase::Creating,
            (Some(_), true, _) => Phase::Transitioning,
            (_, false, Some(_)) => Phase::Errored,
            (Some(session), false, None) => Phase::Synced(session.state.clone()),
            (None, false, None) => Phase::Uninitialized,
        }
    }

    pub fn state(&self) -> Option<&StateName> {
        self.session.as_ref().map(|s| &s.state)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(PresentedError::message)
    }
}
