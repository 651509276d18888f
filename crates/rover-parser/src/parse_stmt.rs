//! Statement parsing: programs, suites, compound and simple statements.

use crate::parser::{PResult, Parser};
use rover_lexer::token::TokenKind;
use rover_types::ast::*;
use rover_types::{ErrorCode, Span};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Program & Suites
    // ══════════════════════════════════════════════════════════════════════════

    /// `program := statement* EOF`
    pub(crate) fn parse_program(&mut self) -> PResult<Program> {
        let mut stmts = Vec::new();
        while !self.at_end() {
            if self.eat(&TokenKind::Newline) {
                continue;
            }
            stmts.push(self.parse_statement()?);
        }
        let span = match (stmts.first(), stmts.last()) {
            (Some(first), Some(last)) => first.span().merge(last.span()),
            _ => Span::point(1, 1),
        };
        Ok(Program { stmts, span })
    }

    /// `suite := simple NEWLINE | NEWLINE INDENT statement+ DEDENT`
    fn parse_suite(&mut self, owner: &str) -> PResult<Block> {
        if !self.check_exact(&TokenKind::Newline) {
            // Inline suite: `if done: break`
            let stmt = self.parse_simple()?;
            self.expect_newline()?;
            let span = stmt.span();
            return Ok(Block {
                stmts: vec![stmt],
                span,
            });
        }

        self.advance();
        if !self.check_exact(&TokenKind::Indent) {
            return Err(self
                .error_at_current(
                    ErrorCode::EXPECTED_INDENT,
                    format!("expected an indented block after {owner}"),
                )
                .with_suggestion("indent the body by 4 spaces"));
        }
        self.advance();

        self.block_depth += 1;
        let mut stmts = Vec::new();
        while !self.check_exact(&TokenKind::Dedent) && !self.at_end() {
            stmts.push(self.parse_statement()?);
        }
        self.block_depth -= 1;
        self.eat(&TokenKind::Dedent);

        let span = match (stmts.first(), stmts.last()) {
            (Some(first), Some(last)) => first.span().merge(last.span()),
            _ => self.previous_span(),
        };
        Ok(Block { stmts, span })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> PResult<Stmt> {
        match self.peek_kind() {
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Def => self.parse_def(),
            TokenKind::Indent => Err(self
                .error_at_current(ErrorCode::UNEXPECTED_INDENT, "unexpected indent")
                .with_suggestion("remove the extra spaces at the start of the line")),
            TokenKind::Elif | TokenKind::Else => Err(self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("'{}' without a matching 'if'", self.peek_kind()),
            )),
            _ => {
                let stmt = self.parse_simple()?;
                self.expect_newline()?;
                Ok(stmt)
            }
        }
    }

    /// `if expr: suite (elif expr: suite)* (else: suite)?`
    fn parse_if(&mut self) -> PResult<Stmt> {
        let start = self.advance().span; // eat `if`
        let mut branches = Vec::new();

        let condition = self.parse_expression()?;
        self.expect_colon("if condition")?;
        let body = self.parse_suite("'if'")?;
        branches.push((condition, body));

        while self.eat(&TokenKind::Elif) {
            let condition = self.parse_expression()?;
            self.expect_colon("elif condition")?;
            let body = self.parse_suite("'elif'")?;
            branches.push((condition, body));
        }

        let else_block = if self.eat(&TokenKind::Else) {
            self.expect_colon("'else'")?;
            Some(self.parse_suite("'else'")?)
        } else {
            None
        };

        let end = else_block
            .as_ref()
            .map(|b| b.span)
            .or_else(|| branches.last().map(|(_, b)| b.span))
            .unwrap_or(start);
        Ok(Stmt::If(IfStmt {
            branches,
            else_block,
            span: start.merge(end),
        }))
    }

    /// `for IDENT in expr: suite`
    ///
    /// An iterable written as `range(...)` with one to three arguments
    /// becomes a [`ForRangeStmt`]; anything else iterates a value.
    fn parse_for(&mut self) -> PResult<Stmt> {
        let start = self.advance().span; // eat `for`
        let var = self.expect_identifier("a loop variable")?;
        self.expect(&TokenKind::In)?;
        let iterable = self.parse_expression()?;
        self.expect_colon("for clause")?;

        self.loop_depth += 1;
        let body = self.parse_suite("'for'");
        self.loop_depth -= 1;
        let body = body?;
        let span = start.merge(body.span);

        match iterable.kind {
            ExprKind::Call { callee, mut args }
                if callee.name == "range" && (1..=3).contains(&args.len()) =>
            {
                let (start_expr, stop, step) = match args.len() {
                    1 => (None, args.remove(0), None),
                    2 => {
                        let stop = args.remove(1);
                        (Some(args.remove(0)), stop, None)
                    }
                    _ => {
                        let step = args.remove(2);
                        let stop = args.remove(1);
                        (Some(args.remove(0)), stop, Some(step))
                    }
                };
                Ok(Stmt::ForRange(ForRangeStmt {
                    var,
                    start: start_expr,
                    stop,
                    step,
                    body,
                    span,
                }))
            }
            kind => Ok(Stmt::ForEach(ForEachStmt {
                var,
                iterable: Expr::new(kind, iterable.span),
                body,
                span,
            })),
        }
    }

    /// `def IDENT(params): suite`, top level only.
    fn parse_def(&mut self) -> PResult<Stmt> {
        if self.block_depth > 0 {
            return Err(self
                .error_at_current(
                    ErrorCode::NESTED_FUNCTION,
                    "functions can only be defined at the top level",
                )
                .with_suggestion("move this 'def' out to column 1"));
        }
        let start = self.advance().span; // eat `def`
        let name = self.expect_identifier("a function name")?;

        self.expect(&TokenKind::LParen)?;
        let mut params: Vec<Ident> = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            let param = self.expect_identifier("a parameter name")?;
            if params.iter().any(|p| p.name == param.name) {
                return Err(self.error_at(
                    ErrorCode::DUPLICATE_PARAMETER,
                    format!("duplicate parameter '{}' in function definition", param.name),
                    param.span,
                ));
            }
            params.push(param);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        self.expect_colon("function signature")?;

        self.in_function = true;
        let body = self.parse_suite("'def'");
        self.in_function = false;
        let body = body?;

        Ok(Stmt::FunctionDef(FunctionDef {
            span: start.merge(body.span),
            name,
            params,
            body,
        }))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Simple Statements
    // ══════════════════════════════════════════════════════════════════════════

    /// `break | continue | pass | return [expr] | target op= expr | expr`
    fn parse_simple(&mut self) -> PResult<Stmt> {
        match self.peek_kind() {
            TokenKind::Break | TokenKind::Continue => {
                let keyword = self.peek_kind().to_string();
                if self.loop_depth == 0 {
                    return Err(self.error_at_current(
                        ErrorCode::OUTSIDE_LOOP,
                        format!("'{keyword}' outside loop"),
                    ));
                }
                let token = self.advance();
                Ok(match token.kind {
                    TokenKind::Break => Stmt::Break(token.span),
                    _ => Stmt::Continue(token.span),
                })
            }
            TokenKind::Pass => Ok(Stmt::Pass(self.advance().span)),
            TokenKind::Return => self.parse_return(),
            TokenKind::Def | TokenKind::If | TokenKind::For => Err(self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("'{}' must start its own line", self.peek_kind()),
            )),
            _ => self.parse_assign_or_expr(),
        }
    }

    /// `return [expr]`
    fn parse_return(&mut self) -> PResult<Stmt> {
        if !self.in_function {
            return Err(self.error_at_current(
                ErrorCode::OUTSIDE_FUNCTION,
                "'return' outside function",
            ));
        }
        let start = self.advance().span; // eat `return`
        let value = match self.peek_kind() {
            TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent => None,
            _ => Some(self.parse_expression()?),
        };
        let span = value.as_ref().map_or(start, |v| start.merge(v.span));
        Ok(Stmt::Return(ReturnStmt { value, span }))
    }

    /// An expression, optionally followed by `=`, `+=`, `-=` or `*=`.
    fn parse_assign_or_expr(&mut self) -> PResult<Stmt> {
        let expr = self.parse_expression()?;

        let op = match self.peek_kind() {
            TokenKind::Eq => AssignOp::Set,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            _ => {
                let span = expr.span;
                return Ok(Stmt::Expr(ExprStmt { expr, span }));
            }
        };

        let target_span = expr.span;
        let target = match expr.kind {
            ExprKind::Identifier(name) => AssignTarget::Name(Ident::new(name, target_span)),
            ExprKind::Index { object, index } => AssignTarget::Index { object, index },
            _ => {
                return Err(self
                    .error_at(
                        ErrorCode::INVALID_TARGET,
                        "cannot assign to this expression",
                        target_span,
                    )
                    .with_suggestion("assign to a variable name or an item like xs[0]"));
            }
        };
        self.advance(); // eat the assignment operator

        let value = self.parse_expression()?;
        Ok(Stmt::Assign(AssignStmt {
            span: target_span.merge(value.span),
            target,
            op,
            value,
        }))
    }
}
