//! Command registry: built-in functions callable from learner code.
//!
//! Dispatch is table-driven. The evaluator looks a name up in the
//! [`CommandRegistry`], checks its [`Arity`] and invokes it with a
//! [`CommandContext`] holding everything a command may touch. Adding a
//! built-in means registering another [`Builtin`]; evaluator control flow
//! never changes.

use crate::budget::{Gas, StepBudget};
use crate::error::{EvalError, EvalResult, MoveBlocked};
use crate::ops;
use crate::recorder::TraceRecorder;
use crate::value::Value;
use crate::world::World;
use rover_types::ast::BinOp;
use rover_types::{Direction, Level};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Signature every built-in implements.
pub type BuiltinFn = fn(&mut CommandContext, Vec<Value>) -> EvalResult<Value>;

/// Accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive bounds.
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == k,
            Arity::Range(lo, hi) => (lo..=hi).contains(&n),
            Arity::AtLeast(lo) => n >= lo,
        }
    }

    /// `TypeError` unless `n` arguments are acceptable for `name`.
    pub fn check(self, name: &str, n: usize) -> EvalResult<()> {
        if self.accepts(n) {
            return Ok(());
        }
        let expected = match self {
            Arity::Exact(0) => "no arguments".to_string(),
            Arity::Exact(1) => "exactly 1 argument".to_string(),
            Arity::Exact(k) => format!("exactly {k} arguments"),
            Arity::Range(lo, hi) => format!("from {lo} to {hi} arguments"),
            Arity::AtLeast(1) => "at least 1 argument".to_string(),
            Arity::AtLeast(lo) => format!("at least {lo} arguments"),
        };
        let given = if n == 1 { "1 was given".to_string() } else { format!("{n} were given") };
        Err(EvalError::Type(format!("{name}() takes {expected} but {given}")))
    }
}

/// A registered built-in.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    /// Produces Frames (movement, `speak`).
    pub visible: bool,
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn invoke(&self, ctx: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
        self.arity.check(self.name, args.len())?;
        if self.visible {
            tracing::debug!(command = self.name, line = ctx.line, "visible command");
        }
        (self.func)(ctx, args)
    }
}

/// Name → [`Builtin`] table.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Builtin>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard rover command set.
    pub fn standard() -> Self {
        let mut reg = Self::new();
        // ── Visible commands ──
        reg.register(visible("move_right", Arity::Range(0, 1), move_right));
        reg.register(visible("move_left", Arity::Range(0, 1), move_left));
        reg.register(visible("move_up", Arity::Range(0, 1), move_up));
        reg.register(visible("move_down", Arity::Range(0, 1), move_down));
        reg.register(visible("speak", Arity::Exact(1), speak));
        // ── Pure built-ins ──
        reg.register(pure("abs", Arity::Exact(1), abs));
        reg.register(pure("sum", Arity::Exact(1), sum));
        reg.register(pure("max", Arity::AtLeast(1), max));
        reg.register(pure("min", Arity::AtLeast(1), min));
        reg.register(pure("len", Arity::Exact(1), len));
        reg.register(pure("range", Arity::Range(1, 3), range));
        reg.register(pure("str", Arity::Range(0, 1), str_));
        reg.register(pure("int", Arity::Range(0, 1), int));
        reg
    }

    /// Add or replace a built-in.
    pub fn register(&mut self, builtin: Builtin) {
        self.commands.insert(builtin.name, builtin);
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }
}

fn visible(name: &'static str, arity: Arity, func: BuiltinFn) -> Builtin {
    Builtin {
        name,
        arity,
        visible: true,
        func,
    }
}

fn pure(name: &'static str, arity: Arity, func: BuiltinFn) -> Builtin {
    Builtin {
        name,
        arity,
        visible: false,
        func,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Command context
// ══════════════════════════════════════════════════════════════════════════════

/// Everything a built-in may read or change during one run.
#[derive(Debug)]
pub struct CommandContext {
    pub world: World,
    pub recorder: TraceRecorder,
    pub budget: StepBudget,
    pub gas: Gas,
    /// Lines spoken so far.
    pub output: Vec<String>,
    /// Source line of the statement being executed.
    pub line: u32,
}

impl CommandContext {
    pub fn new(level: &Level, step_ceiling: u32, gas_limit: u64) -> Self {
        let world = World::from_level(level);
        let recorder = TraceRecorder::new(world.snapshot());
        Self {
            world,
            recorder,
            budget: StepBudget::new(level.max_moves, step_ceiling),
            gas: Gas::new(gas_limit),
            output: Vec::new(),
            line: 0,
        }
    }

    /// One unit step in `dir`: face, check, move, collect, record.
    pub fn step(&mut self, dir: Direction) -> EvalResult<()> {
        self.budget.consume()?;
        self.world.face(dir);
        let next = self
            .world
            .position()
            .step(dir)
            .ok_or(MoveBlocked::OutOfBounds)?;
        self.world.check_move(next)?;
        self.world.apply_move(next, dir);
        if self.world.collect_if_target(next) {
            tracing::debug!(pos = %next, "crystal collected");
        }
        self.recorder.record(&self.world, self.line, None, None);
        Ok(())
    }

    /// Append a line to the output and record a Frame carrying it.
    pub fn speak(&mut self, text: String) -> EvalResult<()> {
        self.budget.consume()?;
        self.output.push(text.clone());
        self.recorder.record(&self.world, self.line, Some(text), None);
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Visible commands
// ══════════════════════════════════════════════════════════════════════════════

fn move_n(ctx: &mut CommandContext, args: Vec<Value>, dir: Direction, name: &str) -> EvalResult<Value> {
    let n = match args.first() {
        None => 1,
        Some(Value::Int(n)) if *n >= 0 => *n,
        Some(Value::Int(_)) => {
            return Err(EvalError::Value(format!(
                "{name}() argument must be non-negative"
            )))
        }
        Some(other) => {
            return Err(EvalError::Type(format!(
                "{name}() argument must be an int, not {}",
                other.type_name()
            )))
        }
    };
    for _ in 0..n {
        ctx.step(dir)?;
    }
    Ok(Value::None)
}

fn move_right(ctx: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    move_n(ctx, args, Direction::Right, "move_right")
}

fn move_left(ctx: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    move_n(ctx, args, Direction::Left, "move_left")
}

fn move_up(ctx: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    move_n(ctx, args, Direction::Up, "move_up")
}

fn move_down(ctx: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    move_n(ctx, args, Direction::Down, "move_down")
}

fn speak(ctx: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    let text = args.first().map(Value::to_string).unwrap_or_default();
    ctx.speak(text)?;
    Ok(Value::None)
}

// ══════════════════════════════════════════════════════════════════════════════
// Pure built-ins
// ══════════════════════════════════════════════════════════════════════════════

fn abs(_: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    match args.first() {
        Some(Value::Int(n)) => n.checked_abs().map(Value::Int).ok_or_else(EvalError::overflow),
        Some(Value::Float(n)) => Ok(Value::Float(n.abs())),
        Some(other) => Err(EvalError::Type(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
        None => Ok(Value::None),
    }
}

fn sum(ctx: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    let items = match args.first() {
        Some(v) => ops::iterate(v)?,
        None => Vec::new(),
    };
    ctx.gas.charge(items.len() as u64)?;
    items.iter().try_fold(Value::Int(0), |acc, item| {
        ops::binary(BinOp::Add, &acc, item)
    })
}

fn extreme(args: Vec<Value>, name: &str, want: Ordering) -> EvalResult<Value> {
    let items = if args.len() == 1 {
        ops::iterate(&args[0])?
    } else {
        args
    };
    let mut iter = items.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| EvalError::Value(format!("{name}() arg is an empty sequence")))?;
    for item in iter {
        let ord = item.compare(&best).ok_or_else(|| {
            EvalError::Type(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                if want == Ordering::Greater { ">" } else { "<" },
                item.type_name(),
                best.type_name()
            ))
        })?;
        if ord == want {
            best = item;
        }
    }
    Ok(best)
}

fn max(ctx: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    ctx.gas.charge(args.len() as u64)?;
    extreme(args, "max", Ordering::Greater)
}

fn min(ctx: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    ctx.gas.charge(args.len() as u64)?;
    extreme(args, "min", Ordering::Less)
}

fn len(_: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    let n = match args.first() {
        Some(Value::Str(s)) => s.chars().count(),
        Some(Value::List(items)) => items.len(),
        Some(Value::Dict(entries)) => entries.len(),
        Some(other) => {
            return Err(EvalError::Type(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
        None => 0,
    };
    Ok(Value::Int(n as i64))
}

/// Integer arguments of `range()`.
pub(crate) fn range_args(args: &[Value]) -> EvalResult<(i64, i64, i64)> {
    let ints = args
        .iter()
        .map(|v| match v {
            Value::Int(n) => Ok(*n),
            other => Err(EvalError::Type(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            ))),
        })
        .collect::<EvalResult<Vec<i64>>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(EvalError::Type(format!(
                "range expected at most 3 arguments, got {}",
                ints.len()
            )))
        }
    };
    if step == 0 {
        return Err(EvalError::Value("range() arg 3 must not be zero".into()));
    }
    Ok((start, stop, step))
}

fn range(ctx: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    let (start, stop, step) = range_args(&args)?;
    let count = ops::range_len(start, stop, step);
    ctx.gas.charge(count)?;
    if count > ops::MAX_SEQUENCE_LEN as u64 {
        return Err(EvalError::Value(format!("range() of {count} items is too large")));
    }
    let items = (0..count as i128)
        .map(|i| Value::Int((start as i128 + i * step as i128) as i64))
        .collect();
    Ok(Value::List(items))
}

fn str_(_: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    Ok(Value::Str(
        args.first().map(Value::to_string).unwrap_or_default(),
    ))
}

fn int(_: &mut CommandContext, args: Vec<Value>) -> EvalResult<Value> {
    match args.into_iter().next() {
        None => Ok(Value::Int(0)),
        Some(Value::Int(n)) => Ok(Value::Int(n)),
        Some(Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
        Some(Value::Float(f)) => {
            if f.is_nan() {
                Err(EvalError::Value("cannot convert float NaN to integer".into()))
            } else if f.is_infinite() {
                Err(EvalError::Arithmetic(
                    "cannot convert float infinity to integer".into(),
                ))
            } else if f.trunc() >= -(i64::MIN as f64) || f.trunc() < i64::MIN as f64 {
                Err(EvalError::overflow())
            } else {
                Ok(Value::Int(f.trunc() as i64))
            }
        }
        Some(Value::Str(s)) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            EvalError::Value(format!(
                "invalid literal for int() with base 10: {}",
                Value::Str(s.clone()).repr()
            ))
        }),
        Some(other) => Err(EvalError::Type(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_types::Position;

    fn ctx() -> CommandContext {
        let level = Level::open(3, 3).with_target(2, 0).with_obstacle(1, 1);
        CommandContext::new(&level, 1000, 1_000_000)
    }

    fn call(ctx: &mut CommandContext, name: &str, args: Vec<Value>) -> EvalResult<Value> {
        let reg = CommandRegistry::standard();
        let builtin = *reg.get(name).unwrap();
        builtin.invoke(ctx, args)
    }

    #[test]
    fn test_standard_registry() {
        let reg = CommandRegistry::standard();
        assert!(reg.get("move_right").unwrap().visible);
        assert!(reg.get("speak").unwrap().visible);
        assert!(!reg.get("len").unwrap().visible);
        assert!(!reg.contains("print"));
        assert_eq!(reg.names().count(), 13);
    }

    #[test]
    fn test_move_records_one_frame_per_step() {
        let mut ctx = ctx();
        call(&mut ctx, "move_right", vec![Value::Int(2)]).unwrap();
        assert_eq!(ctx.recorder.len(), 2);
        assert_eq!(ctx.world.position(), Position::new(2, 0));
        assert!(ctx.world.all_targets_collected());
    }

    #[test]
    fn test_move_zero_is_a_no_op() {
        let mut ctx = ctx();
        call(&mut ctx, "move_right", vec![Value::Int(0)]).unwrap();
        assert!(ctx.recorder.is_empty());
    }

    #[test]
    fn test_move_halts_at_first_illegal_step() {
        let mut ctx = ctx();
        let err = call(&mut ctx, "move_left", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "out of bounds");
        assert_eq!(ctx.world.direction(), Direction::Left);
        assert_eq!(ctx.world.position(), Position::new(0, 0));

        call(&mut ctx, "move_right", vec![]).unwrap();
        let err = call(&mut ctx, "move_down", vec![Value::Int(2)]).unwrap_err();
        assert_eq!(err.to_string(), "blocked by rock");
    }

    #[test]
    fn test_move_argument_validation() {
        let mut ctx = ctx();
        assert!(matches!(
            call(&mut ctx, "move_up", vec![Value::Int(-1)]),
            Err(EvalError::Value(_))
        ));
        assert!(matches!(
            call(&mut ctx, "move_up", vec![Value::Float(1.0)]),
            Err(EvalError::Type(_))
        ));
        let err = call(&mut ctx, "move_up", vec![Value::Int(1), Value::Int(2)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: move_up() takes from 0 to 1 arguments but 2 were given"
        );
    }

    #[test]
    fn test_speak_stringifies() {
        let mut ctx = ctx();
        call(&mut ctx, "speak", vec![Value::Int(15)]).unwrap();
        call(&mut ctx, "speak", vec![Value::List(vec!["a".into()])]).unwrap();
        assert_eq!(ctx.output, vec!["15", "['a']"]);
        assert_eq!(ctx.recorder.len(), 2);
    }

    #[test]
    fn test_step_budget_stops_visible_actions() {
        let level = Level::open(1, 10).with_max_moves(3);
        let mut ctx = CommandContext::new(&level, 1000, 1_000_000);
        let err = call(&mut ctx, "move_right", vec![Value::Int(5)]).unwrap_err();
        assert_eq!(err, EvalError::StepLimitExceeded);
        assert_eq!(ctx.world.position(), Position::new(3, 0));
    }

    #[test]
    fn test_pure_builtins() {
        let mut ctx = ctx();
        let nums = Value::List(vec![Value::Int(3), Value::Int(-1), Value::Int(2)]);
        assert_eq!(call(&mut ctx, "sum", vec![nums.clone()]), Ok(Value::Int(4)));
        assert_eq!(call(&mut ctx, "max", vec![nums.clone()]), Ok(Value::Int(3)));
        assert_eq!(call(&mut ctx, "min", vec![nums.clone()]), Ok(Value::Int(-1)));
        assert_eq!(
            call(&mut ctx, "max", vec![Value::Int(1), Value::Float(1.5)]),
            Ok(Value::Float(1.5))
        );
        assert_eq!(call(&mut ctx, "len", vec!["héllo".into()]), Ok(Value::Int(5)));
        assert_eq!(call(&mut ctx, "abs", vec![Value::Int(-4)]), Ok(Value::Int(4)));
        assert_eq!(call(&mut ctx, "str", vec![Value::Float(2.0)]), Ok("2.0".into()));
        assert_eq!(call(&mut ctx, "int", vec![" 42 ".into()]), Ok(Value::Int(42)));
        assert_eq!(call(&mut ctx, "int", vec![Value::Float(-2.7)]), Ok(Value::Int(-2)));
        assert!(ctx.recorder.is_empty());
    }

    #[test]
    fn test_pure_builtin_errors() {
        let mut ctx = ctx();
        assert!(matches!(
            call(&mut ctx, "max", vec![Value::List(vec![])]),
            Err(EvalError::Value(_))
        ));
        assert!(matches!(
            call(&mut ctx, "len", vec![Value::Int(1)]),
            Err(EvalError::Type(_))
        ));
        let err = call(&mut ctx, "int", vec!["abc".into()]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ValueError: invalid literal for int() with base 10: 'abc'"
        );
        assert!(matches!(
            call(&mut ctx, "sum", vec![Value::List(vec!["a".into()])]),
            Err(EvalError::Type(_))
        ));
    }

    #[test]
    fn test_range() {
        let mut ctx = ctx();
        assert_eq!(
            call(&mut ctx, "range", vec![Value::Int(3)]),
            Ok(Value::List(vec![Value::Int(0), Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(
            call(&mut ctx, "range", vec![Value::Int(5), Value::Int(0), Value::Int(-2)]),
            Ok(Value::List(vec![Value::Int(5), Value::Int(3), Value::Int(1)]))
        );
        assert!(matches!(
            call(&mut ctx, "range", vec![Value::Int(0), Value::Int(5), Value::Int(0)]),
            Err(EvalError::Value(_))
        ));
        assert_eq!(
            call(&mut ctx, "range", vec![Value::Int(i64::MAX)]),
            Err(EvalError::StepLimitExceeded)
        );
    }

    #[test]
    fn test_register_custom_command() {
        fn beep(ctx: &mut CommandContext, _: Vec<Value>) -> EvalResult<Value> {
            ctx.speak("beep".into())?;
            Ok(Value::None)
        }
        let mut reg = CommandRegistry::standard();
        reg.register(visible("beep", Arity::Exact(0), beep));
        let mut ctx = ctx();
        reg.get("beep").unwrap().invoke(&mut ctx, vec![]).unwrap();
        assert_eq!(ctx.output, vec!["beep"]);
    }
}
