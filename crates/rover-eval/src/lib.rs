//! Rover tree-walking evaluator.
//!
//! Executes a parsed program against a [`Level`](rover_types::Level),
//! simulating the rover world and recording one Frame per visible action.
//! [`run`] is the entry point; it always returns a complete
//! [`Trace`](rover_types::Trace), runtime errors included.

pub mod budget;
pub mod commands;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod methods;
pub mod ops;
pub mod recorder;
pub mod run;
pub mod value;
pub mod world;

pub use commands::{Arity, Builtin, CommandContext, CommandRegistry};
pub use env::Environment;
pub use error::{EvalError, EvalResult, MoveBlocked};
pub use evaluator::{Evaluator, Flow};
pub use recorder::TraceRecorder;
pub use run::{run, run_with_registry, RunConfig};
pub use value::Value;
pub use world::World;
