//! Rover engine: orchestrates the full run pipeline.
//!
//! ```text
//! Learner source → Lexer → Parser → Evaluator (World + Recorder) → Trace
//! ```
//!
//! Static errors (lex, parse, unreadable level) come back as a structured
//! [`RoverError`] before anything runs. Runtime errors never do: they end the
//! [`Trace`] with an error Frame.

use rover_lexer::Lexer;
use rover_parser::Parser;
use rover_types::ast::Program;
use rover_types::{ErrorCode, Level, SourceFile, Span, Trace};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Once;
use thiserror::Error;

pub use rover_eval::{CommandRegistry, RunConfig};
pub use rover_types::RoverError;

/// File name used in diagnostics for learner code.
pub const SOURCE_NAME: &str = "main.py";
/// File name used in diagnostics for level descriptors.
pub const LEVEL_NAME: &str = "level.json";

/// Failures outside the language itself: files, JSON, static errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Config(#[source] serde_json::Error),
    #[error("failed to serialize trace: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Static(#[from] RoverError),
}

// ══════════════════════════════════════════════════════════════════════════════
// Pipeline
// ══════════════════════════════════════════════════════════════════════════════

/// Lex and parse learner source without running it.
pub fn check_source(source: &str) -> Result<Program, RoverError> {
    check_named(source, SOURCE_NAME)
}

/// [`check_source`] with an explicit file name for diagnostics.
pub fn check_named(source: &str, name: &str) -> Result<Program, RoverError> {
    let sf = SourceFile::new(name, source);
    let tokens = Lexer::new(&sf).lex()?;
    Parser::new(tokens, &sf).parse()
}

/// Parse and run `source` on `level`.
#[tracing::instrument(skip_all, fields(bytes = source.len()))]
pub fn run_source(level: &Level, source: &str, config: &RunConfig) -> Result<Trace, RoverError> {
    let program = check_source(source)?;
    Ok(rover_eval::run(&program, level, config))
}

/// Parse a level descriptor, reporting malformed JSON as a [`RoverError`]
/// pointing at the offending line.
pub fn parse_level(json: &str) -> Result<Level, RoverError> {
    Level::from_json(json).map_err(|e| {
        let sf = SourceFile::new(LEVEL_NAME, json);
        let line = u32::try_from(e.line()).unwrap_or(u32::MAX);
        let column = u32::try_from(e.column()).unwrap_or(u32::MAX);
        RoverError::new(
            LEVEL_NAME,
            ErrorCode::INVALID_LEVEL,
            format!("invalid level: {e}"),
            Span::point(line, column),
            sf.line(line).unwrap_or_default(),
        )
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Serializable result
// ══════════════════════════════════════════════════════════════════════════════

/// Outcome of [`run_to_result`], shaped for JSON hosts.
///
/// `trace` is present whenever the program ran (including runtime errors);
/// `error` only when it could not start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Trace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RoverError>,
}

impl RunResult {
    pub fn from_trace(trace: Trace) -> Self {
        Self {
            success: trace.is_success(),
            trace: Some(trace),
            error: None,
        }
    }

    pub fn from_error(error: RoverError) -> Self {
        Self {
            success: false,
            trace: None,
            error: Some(error),
        }
    }
}

/// Full pipeline from a level JSON string, with default limits.
pub fn run_to_result(level_json: &str, source: &str) -> RunResult {
    run_to_result_with(level_json, source, &RunConfig::default())
}

pub fn run_to_result_with(level_json: &str, source: &str, config: &RunConfig) -> RunResult {
    let outcome = parse_level(level_json).and_then(|level| run_source(&level, source, config));
    match outcome {
        Ok(trace) => RunResult::from_trace(trace),
        Err(err) => {
            tracing::debug!(code = %err.code, line = err.line(), "static error");
            RunResult::from_error(err)
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Fingerprints & files
// ══════════════════════════════════════════════════════════════════════════════

/// SHA-256 (lowercase hex) of the trace's JSON. Equal runs give equal
/// fingerprints.
pub fn trace_fingerprint(trace: &Trace) -> Result<String, EngineError> {
    let bytes = serde_json::to_vec(trace).map_err(EngineError::Serialize)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn read_file(path: &Path) -> Result<String, EngineError> {
    std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a [`RunConfig`] from a JSON file. Missing fields keep their defaults.
pub fn load_config(path: &Path) -> Result<RunConfig, EngineError> {
    parse_config(&read_file(path)?)
}

/// Parse a JSON [`RunConfig`]. Missing fields keep their defaults.
pub fn parse_config(json: &str) -> Result<RunConfig, EngineError> {
    serde_json::from_str(json).map_err(EngineError::Config)
}

// ══════════════════════════════════════════════════════════════════════════════
// Tracing
// ══════════════════════════════════════════════════════════════════════════════

static TRACING_INIT: Once = Once::new();

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
/// Enable with e.g. `RUST_LOG=rover_eval=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}
