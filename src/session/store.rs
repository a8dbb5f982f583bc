//! Session storage.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{SessionId, StateName};
use crate::error::ClientError;
use crate::transport::StateSnapshot;
use crate::Result;

/// Presentation data attached to a state by the engine.
pub type UiData = Map<String, Value>;

/// The player character, echoed back by the engine as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Character(Value);

impl Character {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// A complete snapshot of one session as last reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    /// Engine-issued identifier.
    pub id: SessionId,
    /// Current narrative state.
    pub state: StateName,
    /// Presentation data for `state`.
    pub ui_data: UiData,
    /// Player character, once created.
    pub character: Option<Character>,
    /// Accumulated engine cost in USD.
    pub total_cost: f64,
}

impl Session {
    /// Build a session from a fetched snapshot.
    pub fn from_snapshot(id: SessionId, snapshot: StateSnapshot) -> Self {
        Self {
            id,
            state: snapshot.state,
            ui_data: snapshot.ui_data,
            character: snapshot.character,
            total_cost: snapshot.total_cost,
        }
    }

    /// Chapter number carried in `ui_data`, if any.
    pub fn chapter(&self) -> Option<String> {
        chapter_label(&self.ui_data)
    }
}

/// Chapter label from `ui_data.chapter`.
///
/// Non-zero numbers and non-empty strings count; integral floats render
/// without a fraction. Anything else is no chapter.
pub fn chapter_label(ui_data: &UiData) -> Option<String> {
    match ui_data.get("chapter")? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                (i != 0).then(|| i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f == 0.0 {
                    None
                } else if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Some((f as i64).to_string())
                } else {
                    Some(f.to_string())
                }
            }
        }
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Holder of the single live session.
///
/// The session is only ever swapped as a whole; there is no way to
/// update individual fields.
#[derive(Debug, Default)]
pub struct SessionStore {
    session: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored session.
    ///
    /// Returns the state of the session that was replaced, or `None` if
    /// no session was live.
    pub fn replace(&self, session: Session) -> Result<Option<StateName>> {
        let mut slot = self
            .session
            .write()
            .map_err(|_| ClientError::LockPoisoned)?;
        let previous = slot.replace(session);
        Ok(previous.map(|s| s.state))
    }

    /// Get a clone of the live session.
    pub fn current(&self) -> Result<Session> {
        let slot = self.session.read().map_err(|_| ClientError::LockPoisoned)?;
        slot.clone().ok_or(ClientError::NoSession)
    }

    /// Identifier of the live session.
    pub fn session_id(&self) -> Result<SessionId> {
        let slot = self.session.read().map_err(|_| ClientError::LockPoisoned)?;
        slot.as_ref()
            .map(|s| s.id.clone())
            .ok_or(ClientError::NoSession)
    }

    /// Drop the live session, returning it.
    pub fn clear(&self) -> Result<Option<Session>> {
        let mut slot = self
            .session
            .write()
            .map_err(|_| ClientError::LockPoisoned)?;
        Ok(slot.take())
    }

    /// Check whether a session is live.
    pub fn is_live(&self) -> bool {
        self.session.read().map(|s| s.is_some()).unwrap_or(false)
    }
}
