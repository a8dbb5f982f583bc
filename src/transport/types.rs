//! Wire types for the engine's REST surface.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::session::{Character, SessionId, StateName, UiData};

/// Opaque transition payload.
pub type Payload = Map<String, Value>;

/// Response to `POST /session`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedSession {
    pub session_id: SessionId,
}

/// Response to `GET /session/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateSnapshot {
    pub state: StateName,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ui_data: UiData,
    #[serde(default)]
    pub character: Option<Character>,
    #[serde(default)]
    pub total_cost: f64,
}

/// Body of `POST /transition`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRequest {
    pub session_id: SessionId,
    pub action: String,
    pub data: Payload,
}

impl TransitionRequest {
    pub fn new(session_id: SessionId, action: impl Into<String>, data: Payload) -> Self {
        Self {
            session_id,
            action: action.into(),
            data,
        }
    }
}

/// Success payload of `POST /transition`.
///
/// `next_state` is informational only; the local view advances through
/// the refresh that follows.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransitionResult {
    pub success: bool,
    pub next_state: Option<StateName>,
    pub data: Value,
}

/// Error body returned by the engine on a rejected request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Human-readable detail, if the body carries a non-empty one.
    ///
    /// String details are used verbatim; structured ones (validation
    /// error lists) are rendered as JSON text.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Response to `GET /cost/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CostReport {
    pub session_id: SessionId,
    pub total_cost_usd: f64,
    pub total_tokens: u64,
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub cost_by_state: HashMap<String, f64>,
    #[serde(default)]
    pub cost_by_model: HashMap<String, f64>,
    pub num_api_calls: u64,
    #[serde(default)]
    pub average_cost_per_call: Option<f64>,
}

/// One completed chapter in a session's journey.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimelineEvent {
    pub chapter: u32,
    pub narrative: String,
    #[serde(default)]
    pub transformation: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Response to `GET /timeline/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimelineResponse {
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<UiData, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<UiData>::deserialize(deserializer)?.unwrap_or_default())
}
