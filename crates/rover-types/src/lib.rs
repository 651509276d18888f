//! Shared types for the Rover engine.
//!
//! Defines source spans, static error types, the AST, the [`Level`]
//! descriptor supplied by content authoring, and the [`Trace`] data model
//! consumed by playback.

mod error;
mod span;
pub mod ast;
pub mod level;
pub mod trace;

pub use error::{ErrorCategory, ErrorCode, RoverError};
pub use level::{Direction, GridSize, Level, LevelIssue, Position};
pub use span::{SourceFile, Span};
pub use trace::{
    EndReason, ErrorKind, Frame, ObjectKind, ObjectState, RunError, Snapshot, Trace, Verdict,
    WorldObject,
};

/// Result type used by the lexer and parser.
pub type Result<T> = std::result::Result<T, RoverError>;
