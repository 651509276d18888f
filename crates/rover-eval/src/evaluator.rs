//! Core statement and expression evaluator.

use crate::commands::{Arity, CommandContext, CommandRegistry};
use crate::env::{Environment, GLOBAL};
use crate::error::{EvalError, EvalResult};
use crate::methods;
use crate::ops;
use crate::run::RunConfig;
use crate::value::{Value, MAX_VALUE_DEPTH};
use rover_types::ast::*;
use rover_types::Level;
use std::collections::BTreeMap;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// An assignable location: a variable plus the subscripts applied to it.
type Place = (String, Vec<Value>);

/// The tree-walking evaluator for one run.
///
/// Owns every piece of run state: variables, defined functions, the command
/// table and the [`CommandContext`] (world, recorder, budgets, output).
pub struct Evaluator<'p> {
    env: Environment,
    /// Functions bound so far by executed `def` statements.
    functions: BTreeMap<&'p str, &'p FunctionDef>,
    registry: CommandRegistry,
    ctx: CommandContext,
    call_depth: usize,
    max_call_depth: usize,
}

impl<'p> Evaluator<'p> {
    pub fn new(level: &Level, config: &RunConfig, registry: CommandRegistry) -> Self {
        Self {
            env: Environment::new(),
            functions: BTreeMap::new(),
            registry,
            ctx: CommandContext::new(level, config.step_ceiling, config.gas_limit),
            call_depth: 0,
            max_call_depth: config.max_call_depth,
        }
    }

    /// Execute every top-level statement in order.
    pub fn exec_program(&mut self, program: &'p Program) -> EvalResult<()> {
        self.exec_block(&program.stmts)?;
        Ok(())
    }

    pub fn context(&self) -> &CommandContext {
        &self.ctx
    }

    /// Give up the run state once execution is over.
    pub fn into_context(self) -> CommandContext {
        self.ctx
    }

    /// Module-level variables.
    pub fn globals(&self) -> &BTreeMap<String, Value> {
        self.env.global_bindings()
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn exec_block(&mut self, stmts: &'p [Stmt]) -> EvalResult<Flow> {
        for stmt in stmts {
            let flow = self.exec_stmt(stmt)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    pub fn exec_stmt(&mut self, stmt: &'p Stmt) -> EvalResult<Flow> {
        self.ctx.gas.tick()?;
        self.ctx.line = stmt.span().line();
        match stmt {
            Stmt::Assign(assign) => {
                self.exec_assign(assign)?;
                Ok(Flow::Normal)
            }
            Stmt::If(if_stmt) => self.exec_if(if_stmt),
            Stmt::ForRange(for_range) => self.exec_for_range(for_range),
            Stmt::ForEach(for_each) => self.exec_for_each(for_each),
            Stmt::FunctionDef(def) => {
                tracing::trace!(name = %def.name.name, "def");
                self.functions.insert(def.name.name.as_str(), def);
                Ok(Flow::Normal)
            }
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::None,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),
            Stmt::Pass(_) => Ok(Flow::Normal),
            Stmt::Expr(expr_stmt) => {
                self.eval_expr(&expr_stmt.expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    // ── Assignment ────────────────────────────────────────────────────────

    fn exec_assign(&mut self, assign: &'p AssignStmt) -> EvalResult<()> {
        match &assign.target {
            AssignTarget::Name(ident) => {
                let value = match assign.op.bin_op() {
                    None => self.eval_expr(&assign.value)?,
                    Some(op) => {
                        let current = self.eval_identifier(&ident.name)?;
                        let rhs = self.eval_expr(&assign.value)?;
                        ops::binary(op, &current, &rhs)?
                    }
                };
                // Always binds in the innermost scope: a function never
                // rebinds a caller's or a global variable.
                self.env.define(&ident.name, value);
                Ok(())
            }
            AssignTarget::Index { object, index } => {
                let value = self.eval_expr(&assign.value)?;
                match self.resolve_place(object)? {
                    Some((root, path)) => {
                        let key = self.eval_expr(index)?;
                        let container = place_mut(&mut self.env, &root, &path)?;
                        store(container, key, assign.op, value)
                    }
                    None => {
                        let mut temp = self.eval_expr(object)?;
                        let key = self.eval_expr(index)?;
                        store(&mut temp, key, assign.op, value)
                    }
                }
            }
        }
    }

    /// Evaluate the subscripts of `expr` if it names a variable location.
    /// Returns `None` without evaluating anything for other expressions.
    fn resolve_place(&mut self, expr: &'p Expr) -> EvalResult<Option<Place>> {
        match &expr.kind {
            ExprKind::Identifier(name) => Ok(Some((name.clone(), Vec::new()))),
            ExprKind::Index { object, index } => {
                let Some((root, mut path)) = self.resolve_place(object)? else {
                    return Ok(None);
                };
                path.push(self.eval_expr(index)?);
                Ok(Some((root, path)))
            }
            _ => Ok(None),
        }
    }

    // ── Control flow ──────────────────────────────────────────────────────

    fn exec_if(&mut self, stmt: &'p IfStmt) -> EvalResult<Flow> {
        for (cond, body) in &stmt.branches {
            self.ctx.line = cond.span.line();
            if self.eval_expr(cond)?.is_truthy() {
                return self.exec_block(&body.stmts);
            }
        }
        match &stmt.else_block {
            Some(body) => self.exec_block(&body.stmts),
            None => Ok(Flow::Normal),
        }
    }

    fn exec_for_range(&mut self, stmt: &'p ForRangeStmt) -> EvalResult<Flow> {
        let mut bounds = Vec::with_capacity(3);
        if let Some(start) = &stmt.start {
            bounds.push(self.eval_expr(start)?);
        }
        bounds.push(self.eval_expr(&stmt.stop)?);
        if let Some(step) = &stmt.step {
            bounds.push(self.eval_expr(step)?);
        }

        // A user-defined `range` shadows the built-in.
        if self.functions.contains_key("range") {
            let values = self.call_named("range", bounds)?;
            return self.exec_loop(&stmt.var, ops::iterate(&values)?, &stmt.body);
        }

        let (start, stop, step) = crate::commands::range_args(&bounds)?;
        let count = ops::range_len(start, stop, step);
        for i in 0..count {
            let n = (i128::from(start) + i128::from(i) * i128::from(step)) as i64;
            if let Some(flow) = self.iteration(&stmt.var, Value::Int(n), &stmt.body)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for_each(&mut self, stmt: &'p ForEachStmt) -> EvalResult<Flow> {
        let iterable = self.eval_expr(&stmt.iterable)?;
        self.exec_loop(&stmt.var, ops::iterate(&iterable)?, &stmt.body)
    }

    fn exec_loop(&mut self, var: &Ident, items: Vec<Value>, body: &'p Block) -> EvalResult<Flow> {
        for item in items {
            if let Some(flow) = self.iteration(var, item, body)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Bind the loop variable and run the body once. `Some` ends the loop.
    fn iteration(&mut self, var: &Ident, value: Value, body: &'p Block) -> EvalResult<Option<Flow>> {
        self.ctx.gas.tick()?;
        self.env.define(&var.name, value);
        Ok(match self.exec_block(&body.stmts)? {
            Flow::Break => Some(Flow::Normal),
            Flow::Return(value) => Some(Flow::Return(value)),
            Flow::Normal | Flow::Continue => None,
        })
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate `expr`. Costs one unit of gas plus the weight of the value
    /// produced, so copying large lists is paid for.
    pub fn eval_expr(&mut self, expr: &'p Expr) -> EvalResult<Value> {
        self.ctx.gas.tick()?;
        let value = self.eval_kind(expr)?;
        self.account(value)
    }

    /// Charge for a produced value and reject runaway nesting.
    fn account(&mut self, value: Value) -> EvalResult<Value> {
        let (weight, depth) = value.extent();
        if depth > MAX_VALUE_DEPTH {
            return Err(EvalError::Value(format!(
                "value nested too deeply (limit {MAX_VALUE_DEPTH})"
            )));
        }
        self.ctx.gas.charge(weight)?;
        Ok(value)
    }

    fn eval_kind(&mut self, expr: &'p Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(n) => Ok(Value::Float(*n)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::NoneLit => Ok(Value::None),
            ExprKind::List(items) => self.eval_list(items),
            ExprKind::Dict(entries) => self.eval_dict(entries),

            ExprKind::Identifier(name) => self.eval_identifier(name),
            ExprKind::Call { callee, args } => self.eval_call(callee, args),
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => self.eval_method_call(object, method, args),

            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                ops::unary(*op, &value)
            }

            ExprKind::Index { object, index } => {
                let container = self.eval_expr(object)?;
                let key = self.eval_expr(index)?;
                ops::index(&container, &key)
            }
            ExprKind::Slice {
                object,
                start,
                stop,
            } => self.eval_slice(object, start.as_deref(), stop.as_deref()),
        }
    }

    // ── Literals ──────────────────────────────────────────────────────────

    fn eval_list(&mut self, items: &'p [Expr]) -> EvalResult<Value> {
        self.eval_args(items).map(Value::List)
    }

    fn eval_dict(&mut self, entries: &'p [(Expr, Expr)]) -> EvalResult<Value> {
        let mut dict = Value::Dict(Vec::with_capacity(entries.len()));
        for (key, value) in entries {
            let key = self.eval_expr(key)?;
            let value = self.eval_expr(value)?;
            ops::set_index(&mut dict, key, value)?;
        }
        Ok(dict)
    }

    fn eval_args(&mut self, args: &'p [Expr]) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }
        Ok(values)
    }

    fn eval_identifier(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.env.get(name) {
            return Ok(value.clone());
        }
        if self.functions.contains_key(name) || self.registry.contains(name) {
            return Err(EvalError::Type(format!(
                "function '{name}' must be called with ()"
            )));
        }
        Err(EvalError::Name(format!("name '{name}' is not defined")))
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    fn eval_call(&mut self, callee: &Ident, args: &'p [Expr]) -> EvalResult<Value> {
        let args = self.eval_args(args)?;
        self.call_named(&callee.name, args)
    }

    /// Dispatch to a user function first, then to the command registry.
    fn call_named(&mut self, name: &str, args: Vec<Value>) -> EvalResult<Value> {
        if let Some(&func) = self.functions.get(name) {
            return self.call_function(func, args);
        }
        if let Some(&builtin) = self.registry.get(name) {
            return builtin.invoke(&mut self.ctx, args);
        }
        match self.env.get(name) {
            Some(value) => Err(EvalError::Type(format!(
                "'{}' object is not callable",
                value.type_name()
            ))),
            None => Err(EvalError::Name(format!("name '{name}' is not defined"))),
        }
    }

    fn call_function(&mut self, func: &'p FunctionDef, args: Vec<Value>) -> EvalResult<Value> {
        Arity::Exact(func.params.len()).check(&func.name.name, args.len())?;
        if self.call_depth >= self.max_call_depth {
            return Err(EvalError::Recursion);
        }
        let call_line = self.ctx.line;
        self.call_depth += 1;
        self.env.push_scope(GLOBAL);
        for (param, arg) in func.params.iter().zip(args) {
            self.env.define(&param.name, arg);
        }

        let result = self.exec_block(&func.body.stmts);

        self.env.pop_scope();
        self.call_depth -= 1;
        // On error the failing line stays current for the error Frame.
        let flow = result?;
        self.ctx.line = call_line;
        Ok(match flow {
            Flow::Return(value) => value,
            _ => Value::None,
        })
    }

    fn eval_method_call(
        &mut self,
        object: &'p Expr,
        method: &Ident,
        args: &'p [Expr],
    ) -> EvalResult<Value> {
        match self.resolve_place(object)? {
            Some((root, path)) => {
                let args = self.eval_args(args)?;
                let receiver = place_mut(&mut self.env, &root, &path)?;
                methods::call(receiver, &method.name, args)
            }
            None => {
                let mut receiver = self.eval_expr(object)?;
                let args = self.eval_args(args)?;
                methods::call(&mut receiver, &method.name, args)
            }
        }
    }

    // ── Operators ─────────────────────────────────────────────────────────

    fn eval_binary(&mut self, left: &'p Expr, op: BinOp, right: &'p Expr) -> EvalResult<Value> {
        let lhs = self.eval_expr(left)?;
        match op {
            BinOp::And if !lhs.is_truthy() => Ok(lhs),
            BinOp::Or if lhs.is_truthy() => Ok(lhs),
            BinOp::And | BinOp::Or => self.eval_expr(right),
            _ => {
                let rhs = self.eval_expr(right)?;
                ops::binary(op, &lhs, &rhs)
            }
        }
    }

    fn eval_slice(
        &mut self,
        object: &'p Expr,
        start: Option<&'p Expr>,
        stop: Option<&'p Expr>,
    ) -> EvalResult<Value> {
        let container = self.eval_expr(object)?;
        let start = start.map(|e| self.eval_expr(e)).transpose()?;
        let stop = stop.map(|e| self.eval_expr(e)).transpose()?;
        ops::slice(&container, start.as_ref(), stop.as_ref())
    }
}

/// Follow `path` from variable `root` to a mutable slot.
fn place_mut<'e>(env: &'e mut Environment, root: &str, path: &[Value]) -> EvalResult<&'e mut Value> {
    let mut slot = env
        .get_mut(root)
        .ok_or_else(|| EvalError::Name(format!("name '{root}' is not defined")))?;
    for key in path {
        slot = ops::index_mut(slot, key)?;
    }
    Ok(slot)
}

/// `container[key] = value` or `container[key] op= value`.
fn store(container: &mut Value, key: Value, op: AssignOp, value: Value) -> EvalResult<()> {
    let value = match op.bin_op() {
        None => value,
        Some(op) => {
            let current = ops::index(container, &key)?;
            ops::binary(op, &current, &value)?
        }
    };
    ops::set_index(container, key, value)
}
