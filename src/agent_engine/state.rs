use serde::{Deserialize, Serialize};

use crate::perception::types::{Region, ScreenPoint};

/// Where the controller is in the zoom cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ZoomState {
    /// `current_region` equals the full capture bounds.
    Full,
    /// `current_region` is a strict sub-rectangle, `depth` narrows deep.
    Narrowed { depth: u32 },
}

/// Result of a single controller iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Pointer moved; the next iteration looks at `region`.
    Narrowed { point: ScreenPoint, region: Region },
    /// Click or type committed; the view went back to the full screen.
    Reset,
    /// The model chose `none`.
    Idle,
    /// The decision could not be acted on; the view was reset.
    Rejected { reason: String },
    /// Pointer moved, but the chosen cell is too small to zoom into.
    ZoomFloorReached { point: ScreenPoint, region: Region },
}

/// Why a session ended without a fatal error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    Stopped,
    ZoomFloorReached,
    IterationLimit,
    TimeLimit,
    FailureLimit,
}

/// Events fed into a running session from outside the loop.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    Stop,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopConfig {
    pub max_iterations: Option<u32>,
    pub max_duration_minutes: Option<u32>,
    pub max_consecutive_failures: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    pub iterations: u32,
    pub end: SessionEnd,
    pub conversation_turns: usize,
}
