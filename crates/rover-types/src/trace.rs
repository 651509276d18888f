//! Frames and traces: the replayable output of one run.

use crate::level::{Direction, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Crystal,
    Rock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectState {
    Idle,
    Collected,
}

/// A world object as shown in a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObject {
    /// Stable id, e.g. `crystal-0`.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub pos: Position,
    pub state: ObjectState,
}

/// The observable world at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub player_pos: Position,
    pub player_dir: Direction,
    pub objects: Vec<WorldObject>,
}

impl Snapshot {
    /// Number of crystals collected so far.
    pub fn collected_count(&self) -> usize {
        self.objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Crystal && o.state == ObjectState::Collected)
            .count()
    }
}

/// One immutable snapshot tied to a single visible action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub step: u32,
    #[serde(flatten)]
    pub snapshot: Snapshot,
    /// Line emitted by `speak`, if this frame came from one.
    pub log: Option<String>,
    /// Source line of the statement that produced this frame.
    pub line_no: Option<u32>,
    /// Set only on the terminal frame of a failed run.
    pub error: Option<String>,
}

impl Frame {
    pub fn player_pos(&self) -> Position {
        self.snapshot.player_pos
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Classification of a runtime error that ended a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NameError,
    TypeError,
    ValueError,
    IndexError,
    KeyError,
    ZeroDivisionError,
    ArithmeticError,
    RecursionError,
    RuntimeMovementError,
    StepLimitExceeded,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Structured runtime error carried by a failed verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// Program finished and every goal was met.
    Success,
    /// Program finished but a goal is unmet.
    Incomplete,
    /// Program stopped on a runtime error.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub success: bool,
    pub reason: EndReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
}

impl Verdict {
    pub fn success() -> Self {
        Self {
            success: true,
            reason: EndReason::Success,
            message: None,
            error: None,
        }
    }

    pub fn incomplete(message: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: EndReason::Incomplete,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(error: RunError) -> Self {
        Self {
            success: false,
            reason: EndReason::Error,
            message: Some(error.message.clone()),
            error: Some(error),
        }
    }
}

/// The complete result of one interpretation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    /// World before the first statement ran.
    pub initial: Snapshot,
    pub frames: Vec<Frame>,
    /// Everything spoken, newline-joined.
    pub output: String,
    pub verdict: Verdict,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Where the rover ended up.
    pub fn final_position(&self) -> Position {
        self.last_frame()
            .map(Frame::player_pos)
            .unwrap_or(self.initial.player_pos)
    }

    pub fn is_success(&self) -> bool {
        self.verdict.success
    }
}
