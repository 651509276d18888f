//! Run driver: executes a program against a level and produces its Trace.

use crate::commands::CommandRegistry;
use crate::evaluator::Evaluator;
use crate::world::World;
use rover_types::ast::Program;
use rover_types::{Level, RunError, Trace, Verdict};
use serde::{Deserialize, Serialize};

/// Hard ceiling on visible actions when the level sets no lower `maxMoves`.
pub const DEFAULT_STEP_CEILING: u32 = 1000;
/// Statement and expression evaluations allowed per run.
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

/// Resource limits for one run. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub step_ceiling: u32,
    pub gas_limit: u64,
    pub max_call_depth: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            step_ceiling: DEFAULT_STEP_CEILING,
            gas_limit: DEFAULT_GAS_LIMIT,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Run `program` on `level` with the standard command set.
pub fn run(program: &Program, level: &Level, config: &RunConfig) -> Trace {
    run_with_registry(program, level, config, CommandRegistry::standard())
}

/// Run with a caller-supplied command table.
///
/// Never fails: runtime errors end the Trace with an error Frame and an
/// `error` verdict.
#[tracing::instrument(skip_all, fields(stmts = program.stmts.len()))]
pub fn run_with_registry(
    program: &Program,
    level: &Level,
    config: &RunConfig,
    registry: CommandRegistry,
) -> Trace {
    for issue in level.validate() {
        tracing::warn!(%issue, "level issue");
    }

    let mut eval = Evaluator::new(level, config, registry);
    let outcome = eval.exec_program(program);
    let mut ctx = eval.into_context();

    let verdict = match outcome {
        Ok(()) => completion_verdict(&ctx.world, &ctx.output, level),
        Err(err) => {
            let line = ctx.line;
            let message = err.to_string();
            ctx.recorder
                .record(&ctx.world, line, None, Some(message.clone()));
            tracing::debug!(kind = %err.kind(), line, %message, "run halted");
            Verdict::error(RunError {
                kind: err.kind(),
                message,
                line: (line > 0).then_some(line),
            })
        }
    };

    tracing::debug!(
        frames = ctx.recorder.len(),
        steps = ctx.budget.taken(),
        gas = ctx.gas.used(),
        success = verdict.success,
        "run finished"
    );
    let output = ctx.output.join("\n");
    ctx.recorder.finish(verdict, output)
}

/// Goals met after a clean finish: every crystal collected (if any) and the
/// spoken output equal to `requiredOutput` (if set).
fn completion_verdict(world: &World, output: &[String], level: &Level) -> Verdict {
    let mut unmet = Vec::new();
    let (collected, total) = world.crystal_progress();
    if collected < total {
        unmet.push(format!("collected {collected} of {total} crystals"));
    }
    if let Some(expected) = &level.required_output {
        let actual = output.join("\n");
        if actual != *expected {
            unmet.push(format!("expected output {expected:?}, got {actual:?}"));
        }
    }
    if unmet.is_empty() {
        Verdict::success()
    } else {
        Verdict::incomplete(unmet.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: RunConfig = serde_json::from_str(r#"{"step_ceiling": 50}"#).unwrap();
        assert_eq!(config.step_ceiling, 50);
        assert_eq!(config.gas_limit, DEFAULT_GAS_LIMIT);
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(serde_json::from_str::<RunConfig>("{}").unwrap(), RunConfig::default());
    }

    #[test]
    fn test_completion_verdict() {
        let level = Level::open(1, 3).with_target(2, 0).with_required_output("hi");
        let world = World::from_level(&level);
        let verdict = completion_verdict(&world, &["hey".to_string()], &level);
        assert!(!verdict.success);
        assert_eq!(
            verdict.message.as_deref(),
            Some("collected 0 of 1 crystals; expected output \"hi\", got \"hey\"")
        );

        let open = Level::open(1, 1);
        assert!(completion_verdict(&World::from_level(&open), &[], &open).success);
    }
}
