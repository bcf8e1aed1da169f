/// Structured model decisions and their validation.
///
/// Two failure levels are kept apart:
/// - a reply that is not a JSON object at all is a [`GridZoomError::DecisionParse`]
///   and ends the session;
/// - a well-formed object with unusable content (unknown action, bad cell,
///   non-text `type` value) is an [`InvalidDecision`] and only aborts the iteration.
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{GridZoomError, GridZoomResult};
use crate::perception::types::GridAddress;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Click,
    Type,
    /// Explicit "nothing to do this turn".
    NoOp,
    /// The reply had no `action` key (or it was null).
    Missing,
    Unrecognized(String),
}

impl ActionKind {
    /// Any JSON value is accepted here; only the action names are meaningful.
    fn from_wire(action: &serde_json::Value) -> Self {
        let raw = match action {
            serde_json::Value::Null => return ActionKind::Missing,
            serde_json::Value::String(raw) => raw,
            other => return ActionKind::Unrecognized(other.to_string()),
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "move_mouse" | "move" => ActionKind::Move,
            "click" => ActionKind::Click,
            "type" => ActionKind::Type,
            "none" => ActionKind::NoOp,
            _ => ActionKind::Unrecognized(raw.clone()),
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Move => write!(f, "move_mouse"),
            ActionKind::Click => write!(f, "click"),
            ActionKind::Type => write!(f, "type"),
            ActionKind::NoOp => write!(f, "none"),
            ActionKind::Missing => write!(f, "<missing>"),
            ActionKind::Unrecognized(raw) => write!(f, "{raw}"),
        }
    }
}

/// What the model asked for, as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: ActionKind,
    pub value: serde_json::Value,
    pub reasoning: String,
}

/// A decision that passed validation for the active grid size.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MoveTo(GridAddress),
    Click,
    Type(String),
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidDecision {
    #[error("unrecognized action '{0}'")]
    UnrecognizedAction(String),

    #[error("decision has no action")]
    MissingAction,

    #[error("move value {0} is not a cell number")]
    NotACell(serde_json::Value),

    #[error("cell {cell} is outside 1..={max}")]
    CellOutOfRange { cell: i64, max: u32 },

    #[error("type value {0} is not text")]
    TypeValueNotText(serde_json::Value),
}

/// Field types are left open so that odd content is rejected per decision,
/// not as an unreadable reply.
#[derive(Deserialize)]
struct WireDecision {
    #[serde(default)]
    reasoning: serde_json::Value,
    #[serde(default)]
    action: serde_json::Value,
    #[serde(default, rename = "actionValue")]
    action_value: serde_json::Value,
}

fn reasoning_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("static regex is valid")
    })
}

/// Parse a model reply into a [`Decision`].
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence.
pub fn parse_decision(reply: &str) -> GridZoomResult<Decision> {
    let body = code_fence()
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply);

    let parse_err = |reason: String| GridZoomError::DecisionParse {
        reason,
        reply: reply.to_string(),
    };
    let value: serde_json::Value = serde_json::from_str(body.trim()).map_err(|e| parse_err(e.to_string()))?;
    if !value.is_object() {
        return Err(parse_err("reply is not a JSON object".into()));
    }
    let wire: WireDecision = serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;

    Ok(Decision {
        action: ActionKind::from_wire(&wire.action),
        value: wire.action_value,
        reasoning: reasoning_text(wire.reasoning),
    })
}

fn cell_number(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

impl Decision {
    /// Validate the decision against a `grid_size × grid_size` grid.
    pub fn command(&self, grid_size: u32) -> Result<Command, InvalidDecision> {
        match &self.action {
            ActionKind::Move => {
                let cell = cell_number(&self.value).ok_or_else(|| InvalidDecision::NotACell(self.value.clone()))?;
                let max = grid_size * grid_size;
                u32::try_from(cell)
                    .ok()
                    .and_then(|c| GridAddress::new(c, grid_size))
                    .map(Command::MoveTo)
                    .ok_or(InvalidDecision::CellOutOfRange { cell, max })
            }
            ActionKind::Click => Ok(Command::Click),
            ActionKind::Type => match &self.value {
                serde_json::Value::String(text) => Ok(Command::Type(text.clone())),
                other => Err(InvalidDecision::TypeValueNotText(other.clone())),
            },
            ActionKind::NoOp => Ok(Command::NoOp),
            ActionKind::Missing => Err(InvalidDecision::MissingAction),
            ActionKind::Unrecognized(raw) => Err(InvalidDecision::UnrecognizedAction(raw.clone())),
        }
    }
}
