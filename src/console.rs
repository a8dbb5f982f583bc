//! Text presentation for the terminal binary.
//!
//! Rendering is a pure function of [`ControllerView`]; input lines are
//! parsed into [`Command`]s that map one-to-one onto controller calls.

use std::fmt::Write;

use serde_json::Value;
use thiserror::Error;

use crate::controller::{ControllerView, Phase};
use crate::session::UiData;
use crate::transport::{CostReport, Payload, TimelineEvent};

/// Text fields of `ui_data` shown in this order, when present.
const TEXT_FIELDS: &[&str] = &[
    "title",
    "subtitle",
    "headline",
    "description",
    "narrative",
    "transformation",
    "hook",
    "transformation_proof",
    "offer_description",
    "guarantee",
    "urgency",
    "prompt",
];

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Submit `action` with a JSON object payload.
    Transition { action: String, data: Payload },
    /// Set one input buffer field.
    Set { key: String, value: Value },
    ShowInput,
    /// Submit the input buffer with the given action.
    SubmitInput(String),
    Archetype(String),
    /// Start over with a fresh session.
    NewSession,
    Cost,
    Timeline,
    Dismiss,
    Help,
    Quit,
    /// Blank line.
    Empty,
}

/// Input that is not a valid command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: :{0}")]
    Unknown(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("payload must be a JSON object: {0}")]
    InvalidPayload(String),
}

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let Some(name) = head.strip_prefix(':') else {
            return Ok(Self::Transition {
                action: head.to_string(),
                data: parse_payload(rest)?,
            });
        };

        match name {
            "set" => {
                let (key, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::MissingArgument("value"))?;
                Ok(Self::Set {
                    key: key.to_string(),
                    value: parse_value(value.trim()),
                })
            }
            "input" => Ok(Self::ShowInput),
            "submit" => Ok(Self::SubmitInput(required(rest, "action")?)),
            "archetype" => Ok(Self::Archetype(required(rest, "archetype")?)),
            "new" => Ok(Self::NewSession),
            "cost" => Ok(Self::Cost),
            "timeline" => Ok(Self::Timeline),
            "dismiss" => Ok(Self::Dismiss),
            "help" | "h" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn required(rest: &str, what: &'static str) -> Result<String, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument(what))
    } else {
        Ok(rest.to_string())
    }
}

fn parse_payload(text: &str) -> Result<Payload, CommandError> {
    if text.is_empty() {
        return Ok(Payload::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(CommandError::InvalidPayload(text.to_string())),
    }
}

/// JSON if it parses, otherwise the raw text.
fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Render the whole view.
pub fn render(view: &ControllerView) -> String {
    let mut out = String::new();

    match view.phase() {
        Phase::Uninitialized => out.push_str("(no session)\n"),
        Phase::Creating => out.push_str("Creating session...\n"),
        _ => {}
    }

    if let Some(session) = &view.session {
        match session.chapter().filter(|_| session.state.is_chapter()) {
            Some(chapter) => {
                let _ = writeln!(out, "== {} (chapter {chapter}) ==", session.state);
            }
            None => {
                let _ = writeln!(out, "== {} ==", session.state);
            }
        }
        render_ui_data(&mut out, &session.ui_data);
        if session.total_cost > 0.0 {
            let _ = writeln!(out, "Cost so far: ${:.4}", session.total_cost);
        }
    }

    if view.loading && view.session.is_some() {
        out.push_str("Working...\n");
    }

    if let Some(error) = &view.error {
        let _ = writeln!(out, "! {}", error.message());
    }

    out
}

fn render_ui_data(out: &mut String, ui_data: &UiData) {
    for field in TEXT_FIELDS {
        if let Some(text) = ui_data.get(*field).and_then(Value::as_str) {
            if !text.is_empty() {
                let _ = writeln!(out, "{text}");
            }
        }
    }

    if let Some(Value::Array(archetypes)) = ui_data.get("archetypes") {
        out.push_str("Archetypes:\n");
        for archetype in archetypes {
            let _ = writeln!(out, "  - {}", describe(archetype));
        }
    }

    if let Some(Value::Array(fields)) = ui_data.get("fields") {
        out.push_str("Fields (use :set <name> <value>):\n");
        for field in fields {
            let name = field.get("name").and_then(Value::as_str).unwrap_or("?");
            let label = field.get("label").and_then(Value::as_str).unwrap_or(name);
            let _ = writeln!(out, "  {name}: {label}");
        }
    }

    if let Some(Value::Array(timeline)) = ui_data.get("timeline") {
        for event in timeline {
            if let Ok(event) = serde_json::from_value::<TimelineEvent>(event.clone()) {
                out.push_str(&render_timeline_event(&event));
            }
        }
    }

    if let Some(cta) = ui_data
        .get("action")
        .or_else(|| ui_data.get("cta"))
        .and_then(Value::as_str)
    {
        let _ = writeln!(out, "[{cta}]");
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            let name = map.get("name").and_then(Value::as_str).unwrap_or("?");
            match map.get("description").and_then(Value::as_str) {
                Some(description) => format!("{name}: {description}"),
                None => name.to_string(),
            }
        }
        other => other.to_string(),
    }
}

fn render_timeline_event(event: &TimelineEvent) -> String {
    let mut out = format!("Chapter {}: {}\n", event.chapter, event.narrative);
    if let Some(transformation) = &event.transformation {
        let _ = writeln!(out, "  -> {transformation}");
    }
    out
}

/// Render a list of completed chapters.
pub fn render_timeline(events: &[TimelineEvent]) -> String {
    if events.is_empty() {
        return "No chapters completed yet.\n".to_string();
    }
    events.iter().map(render_timeline_event).collect()
}

/// Render a cost report.
pub fn render_cost(report: &CostReport) -> String {
    let mut out = format!(
        "Total: ${:.4} over {} calls ({} tokens)\n",
        report.total_cost_usd, report.num_api_calls, report.total_tokens
    );
    let mut states: Vec<_> = report.cost_by_state.iter().collect();
    states.sort_by(|a, b| a.0.cmp(b.0));
    for (state, cost) in states {
        let _ = writeln!(out, "  {state}: ${cost:.4}");
    }
    out
}
