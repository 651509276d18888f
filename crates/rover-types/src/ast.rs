//! AST node types for the rover scripting language.
//!
//! Every node carries a [`Span`]; the evaluator uses its line to attribute
//! Frames to source lines. Recursive variants are boxed.

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete learner program: top-level statements in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// An indented statement suite.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `x = expr`, `xs[i] = expr`, `x += expr`
    Assign(AssignStmt),
    /// `if cond: ... elif cond: ... else: ...`
    If(IfStmt),
    /// `for i in range(...): ...`
    ForRange(ForRangeStmt),
    /// `for x in iterable: ...`
    ForEach(ForEachStmt),
    /// `def name(params): ...`
    FunctionDef(FunctionDef),
    /// `return [expr]`
    Return(ReturnStmt),
    /// `break`
    Break(Span),
    /// `continue`
    Continue(Span),
    /// `pass`
    Pass(Span),
    /// A bare expression, usually a call.
    Expr(ExprStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::ForRange(s) => s.span,
            Stmt::ForEach(s) => s.span,
            Stmt::FunctionDef(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) | Stmt::Pass(span) => *span,
            Stmt::Expr(s) => s.span,
        }
    }
}

/// Where an assignment stores its value.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    /// `name = ...`
    Name(Ident),
    /// `object[index] = ...`
    Index { object: Box<Expr>, index: Box<Expr> },
}

/// `=`, `+=`, `-=`, `*=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
}

impl AssignOp {
    /// The binary operator an augmented assignment applies.
    pub fn bin_op(self) -> Option<BinOp> {
        match self {
            AssignOp::Set => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: AssignTarget,
    pub op: AssignOp,
    pub value: Expr,
    pub span: Span,
}

/// `if` with its `elif` chain folded into `branches`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    /// `(condition, body)` for the `if` and every `elif`, in order.
    pub branches: Vec<(Expr, Block)>,
    pub else_block: Option<Block>,
    pub span: Span,
}

/// `for var in range(start, stop, step)`
#[derive(Debug, Clone, PartialEq)]
pub struct ForRangeStmt {
    pub var: Ident,
    /// Defaults to `0`.
    pub start: Option<Expr>,
    pub stop: Expr,
    /// Defaults to `1`.
    pub step: Option<Expr>,
    pub body: Block,
    pub span: Span,
}

/// `for var in iterable`
#[derive(Debug, Clone, PartialEq)]
pub struct ForEachStmt {
    pub var: Ident,
    pub iterable: Expr,
    pub body: Block,
    pub span: Span,
}

/// `def name(a, b): body` (top level only)
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Height of the tree rooted here; literals and names are 1.
    pub depth: u32,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        let depth = kind.child_depth().saturating_add(1);
        Self { kind, span, depth }
    }
}

impl ExprKind {
    /// Height of the deepest direct child, 0 for leaves.
    fn child_depth(&self) -> u32 {
        fn deepest<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> u32 {
            exprs.into_iter().map(|e| e.depth).max().unwrap_or(0)
        }
        match self {
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::NoneLit
            | ExprKind::Identifier(_) => 0,
            ExprKind::List(items) | ExprKind::Call { args: items, .. } => deepest(items),
            ExprKind::Dict(entries) => deepest(entries.iter().flat_map(|(k, v)| [k, v])),
            ExprKind::MethodCall { object, args, .. } => {
                deepest(std::iter::once(&**object).chain(args))
            }
            ExprKind::Binary { left, right, .. } => left.depth.max(right.depth),
            ExprKind::Unary { operand, .. } => operand.depth,
            ExprKind::Index { object, index } => object.depth.max(index.depth),
            ExprKind::Slice {
                object,
                start,
                stop,
            } => deepest(
                std::iter::once(&**object)
                    .chain(start.as_deref())
                    .chain(stop.as_deref()),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    NoneLit,
    /// `[a, b, c]`
    List(Vec<Expr>),
    /// `{k: v, ...}`
    Dict(Vec<(Expr, Expr)>),

    // ── Names & calls ──
    Identifier(String),
    /// `name(args...)`: user function or built-in command
    Call { callee: Ident, args: Vec<Expr> },
    /// `object.method(args...)`
    MethodCall {
        object: Box<Expr>,
        method: Ident,
        args: Vec<Expr>,
    },

    // ── Operators ──
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },

    // ── Subscripts ──
    /// `object[index]`
    Index { object: Box<Expr>, index: Box<Expr> },
    /// `object[start:stop]`
    Slice {
        object: Box<Expr>,
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
    },
}

/// Binary operators (in precedence order, lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    In,
    NotIn,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl BinOp {
    /// Operator text, for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::In => "in",
            BinOp::NotIn => "not in",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Pos,
    /// `not x`
    Not,
}
