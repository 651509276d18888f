use clap::{Parser, Subcommand};
use rover_engine::{
    check_named, init_tracing, load_config, parse_level, read_file, run_source, trace_fingerprint,
    EngineError, RunConfig, RunResult,
};
use rover_types::{EndReason, RoverError, Trace};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Rover - run learner programs against a puzzle level
#[derive(Parser, Debug)]
#[command(name = "rover")]
#[command(about = "Run rover programs and inspect their traces", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program on a level and print the outcome
    Run {
        /// Level descriptor (JSON)
        level: PathBuf,
        /// Learner program
        source: PathBuf,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        /// Run limits (JSON); missing fields keep their defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the step ceiling
        #[arg(long)]
        ceiling: Option<u32>,
    },
    /// Lex and parse a program without running it
    Check {
        source: PathBuf,
    },
    /// Print the SHA-256 of the trace a run produces
    Fingerprint {
        level: PathBuf,
        source: PathBuf,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    match dispatch(args.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the command succeeded from the learner's point of view.
fn dispatch(command: Command) -> Result<bool, EngineError> {
    match command {
        Command::Run {
            level,
            source,
            json,
            config,
            ceiling,
        } => {
            let mut run_config = match config {
                Some(path) => load_config(&path)?,
                None => RunConfig::default(),
            };
            if let Some(ceiling) = ceiling {
                run_config.step_ceiling = ceiling;
            }
            let result = match load_and_run(&level, &source, &run_config) {
                Ok(trace) => RunResult::from_trace(trace),
                Err(EngineError::Static(e)) => RunResult::from_error(e),
                Err(e) => return Err(e),
            };
            if json {
                let text =
                    serde_json::to_string_pretty(&result).map_err(EngineError::Serialize)?;
                println!("{text}");
            } else {
                match (&result.trace, &result.error) {
                    (Some(trace), _) => print_summary(trace),
                    (None, Some(err)) => print_static_error(err),
                    (None, None) => {}
                }
            }
            Ok(result.success)
        }
        Command::Check { source } => {
            let text = read_file(&source)?;
            let name = source.display().to_string();
            match check_named(&text, &name) {
                Ok(program) => {
                    println!("ok: {} statement(s)", program.stmts.len());
                    Ok(true)
                }
                Err(err) => {
                    print_static_error(&err);
                    Ok(false)
                }
            }
        }
        Command::Fingerprint { level, source } => {
            let trace = load_and_run(&level, &source, &RunConfig::default())?;
            println!("{}", trace_fingerprint(&trace)?);
            Ok(true)
        }
    }
}

fn load_and_run(level: &Path, source: &Path, config: &RunConfig) -> Result<Trace, EngineError> {
    let level = parse_level(&read_file(level)?)?;
    let source = read_file(source)?;
    Ok(run_source(&level, &source, config)?)
}

fn print_summary(trace: &Trace) {
    for frame in &trace.frames {
        let pos = frame.player_pos();
        let line = frame
            .line_no
            .map(|n| format!("line {n}"))
            .unwrap_or_default();
        print!("#{:<4} ({}, {}) {:<8}", frame.step, pos.x, pos.y, line);
        if let Some(log) = &frame.log {
            print!(" {log}");
        }
        if let Some(err) = &frame.error {
            print!(" !! {err}");
        }
        println!();
    }
    if !trace.output.is_empty() {
        println!("--- output ---");
        println!("{}", trace.output);
    }
    let verdict = &trace.verdict;
    match verdict.reason {
        EndReason::Success => println!("SUCCESS in {} frame(s)", trace.len()),
        EndReason::Incomplete => println!(
            "INCOMPLETE: {}",
            verdict.message.as_deref().unwrap_or("goal not met")
        ),
        EndReason::Error => match &verdict.error {
            Some(err) => match err.line {
                Some(line) => println!("{} on line {line}: {}", err.kind, err.message),
                None => println!("{}: {}", err.kind, err.message),
            },
            None => println!("ERROR"),
        },
    }
}

fn print_static_error(err: &RoverError) {
    eprintln!("{err}");
    eprintln!("  --> {}:{}:{}", err.file, err.span.start_line, err.span.start_col);
    if !err.source_line.is_empty() {
        eprintln!("   | {}", err.source_line);
    }
    if let Some(hint) = &err.suggestion {
        eprintln!("   = hint: {hint}");
    }
}
