//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 7. `or`
//! 6. `and`
//! 5. `not`
//! 4. `==`, `!=`, `<`, `>`, `<=`, `>=`, `in`, `not in` (no chaining)
//! 3. `+`, `-`
//! 2. `*`, `/`, `//`, `%`
//! 1. unary `-`, `+`
//! 0. `()` (call), `[]` (index / slice), `.name()` (method call)

use rover_lexer::token::TokenKind;
use rover_types::ast::*;
use rover_types::ErrorCode;

use crate::parser::{PResult, Parser, MAX_EXPR_DEPTH, MAX_EXPR_HEIGHT};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> PResult<Expr> {
        let expr = self.nested(Self::parse_or)?;
        self.bounded(expr)
    }

    /// Reject a tree taller than [`MAX_EXPR_HEIGHT`]. Chains are built in
    /// loops, so `nested` alone never sees them.
    fn bounded(&self, expr: Expr) -> PResult<Expr> {
        if expr.depth <= MAX_EXPR_HEIGHT {
            return Ok(expr);
        }
        Err(self
            .error_at(
                ErrorCode::NESTING_LIMIT,
                format!("expression is too long (limit {MAX_EXPR_HEIGHT} operations deep)"),
                expr.span,
            )
            .with_suggestion("split it into several assignments"))
    }

    /// Run `f` one nesting level deeper, rejecting runaway nesting.
    fn nested(&mut self, f: fn(&mut Self) -> PResult<Expr>) -> PResult<Expr> {
        self.expr_depth += 1;
        if self.expr_depth > MAX_EXPR_DEPTH {
            let err = self.error_at_current(
                ErrorCode::NESTING_LIMIT,
                format!("expression is nested too deeply (limit {MAX_EXPR_DEPTH})"),
            );
            self.expr_depth -= 1;
            return Err(err);
        }
        let result = f(self);
        self.expr_depth -= 1;
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `or := and ("or" and)*`
    fn parse_or(&mut self) -> PResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = self.bounded(binary(left, BinOp::Or, right))?;
        }
        Ok(left)
    }

    /// `and := not ("and" not)*`
    fn parse_and(&mut self) -> PResult<Expr> {
        let mut left = self.parse_not()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_not()?;
            left = self.bounded(binary(left, BinOp::And, right))?;
        }
        Ok(left)
    }

    /// `not := "not" not | comparison`
    fn parse_not(&mut self) -> PResult<Expr> {
        if !self.check_exact(&TokenKind::Not) {
            return self.parse_comparison();
        }
        let start = self.advance().span;
        let operand = self.nested(Self::parse_not)?;
        let span = start.merge(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `comparison := additive [compop additive]`
    ///
    /// Comparison operators do NOT chain: `a < b < c` is a parse error.
    fn parse_comparison(&mut self) -> PResult<Expr> {
        let left = self.parse_additive()?;
        let Some(op) = self.eat_comparison_op() else {
            return Ok(left);
        };
        let right = self.parse_additive()?;
        if self.peek_comparison_op().is_some() {
            return Err(self
                .error_at_current(
                    ErrorCode::CHAINED_COMPARISON,
                    "comparison operators cannot be chained",
                )
                .with_suggestion("use 'and' to combine them: a < b and b < c"));
        }
        Ok(binary(left, op, right))
    }

    /// The comparison operator at the cursor, and how many tokens it spans.
    fn peek_comparison_op(&self) -> Option<(BinOp, usize)> {
        let op = match self.peek_kind() {
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::BangEq => BinOp::NotEq,
            TokenKind::Less => BinOp::Less,
            TokenKind::Greater => BinOp::Greater,
            TokenKind::LessEq => BinOp::LessEq,
            TokenKind::GreaterEq => BinOp::GreaterEq,
            TokenKind::In => BinOp::In,
            TokenKind::Not if self.look_ahead(1) == &TokenKind::In => return Some((BinOp::NotIn, 2)),
            _ => return None,
        };
        Some((op, 1))
    }

    fn eat_comparison_op(&mut self) -> Option<BinOp> {
        let (op, len) = self.peek_comparison_op()?;
        for _ in 0..len {
            self.advance();
        }
        Some(op)
    }

    /// `additive := multiplicative (("+" | "-") multiplicative)*`
    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.bounded(binary(left, op, right))?;
        }
        Ok(left)
    }

    /// `multiplicative := unary (("*" | "/" | "//" | "%") unary)*`
    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::SlashSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.bounded(binary(left, op, right))?;
        }
        Ok(left)
    }

    /// `unary := ("-" | "+") unary | postfix`
    fn parse_unary(&mut self) -> PResult<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_postfix(),
        };
        let start = self.advance().span;
        let operand = self.nested(Self::parse_unary)?;
        let span = start.merge(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Postfix: calls, subscripts, method calls
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    let ExprKind::Identifier(name) = &expr.kind else {
                        return Err(self
                            .error_at_current(
                                ErrorCode::UNEXPECTED_TOKEN,
                                "only named functions can be called",
                            )
                            .with_suggestion("call a function by its name, like move_right()"));
                    };
                    let callee = Ident::new(name.clone(), expr.span);
                    self.advance();
                    let args = self.parse_args()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(ExprKind::Call { callee, args }, span);
                }
                TokenKind::LBracket => {
                    self.advance();
                    expr = self.parse_subscript(expr)?;
                }
                TokenKind::Dot => {
                    self.advance();
                    let method = self.expect_identifier("a method name")?;
                    if !self.check_exact(&TokenKind::LParen) {
                        return Err(self.error_at(
                            ErrorCode::UNEXPECTED_TOKEN,
                            format!(
                                "attribute access is not supported; call it as a method: .{}()",
                                method.name
                            ),
                            method.span,
                        ));
                    }
                    self.advance();
                    let args = self.parse_args()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::MethodCall {
                            object: Box::new(expr),
                            method,
                            args,
                        },
                        span,
                    );
                }
                _ => break,
            }
            expr = self.bounded(expr)?;
        }
        Ok(expr)
    }

    /// Arguments after `(`, through the closing `)`.
    fn parse_args(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            args.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    /// `[index]` or `[start:stop]` after the opening `[`.
    fn parse_subscript(&mut self, object: Expr) -> PResult<Expr> {
        let start = if self.check_exact(&TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        if !self.eat(&TokenKind::Colon) {
            let index = match start {
                Some(index) => index,
                None => {
                    return Err(self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "expected an index inside '[]'",
                    ))
                }
            };
            self.expect(&TokenKind::RBracket)?;
            let span = object.span.merge(self.previous_span());
            return Ok(Expr::new(
                ExprKind::Index {
                    object: Box::new(object),
                    index: Box::new(index),
                },
                span,
            ));
        }

        let stop = if self.check_exact(&TokenKind::RBracket) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RBracket)?;
        let span = object.span.merge(self.previous_span());
        Ok(Expr::new(
            ExprKind::Slice {
                object: Box::new(object),
                start: start.map(Box::new),
                stop: stop.map(Box::new),
            },
            span,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> PResult<Expr> {
        let token = self.peek().clone();
        let kind = match token.kind {
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Float(n) => ExprKind::Float(n),
            TokenKind::Str(s) => ExprKind::Str(s),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::None => ExprKind::NoneLit,
            TokenKind::Identifier(name) => ExprKind::Identifier(name),
            TokenKind::LParen => return self.parse_paren(),
            TokenKind::LBracket => return self.parse_list(),
            TokenKind::LBrace => return self.parse_dict(),
            TokenKind::Newline | TokenKind::Eof => {
                return Err(self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    "unexpected end of line, expected an expression",
                ))
            }
            other => {
                return Err(self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected an expression, got '{other}'"),
                ))
            }
        };
        self.advance();
        Ok(Expr::new(kind, token.span))
    }

    /// `"(" expr ")"`
    fn parse_paren(&mut self) -> PResult<Expr> {
        let start = self.advance().span;
        let inner = self.parse_expression()?;
        if self.check_exact(&TokenKind::Comma) {
            return Err(self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                "tuples are not supported; use a list like [a, b]",
            ));
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::new(inner.kind, start.merge(self.previous_span())))
    }

    /// `"[" [expr ("," expr)* [","]] "]"`
    fn parse_list(&mut self) -> PResult<Expr> {
        let start = self.advance().span;
        let mut items = Vec::new();
        while !self.check_exact(&TokenKind::RBracket) {
            items.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(
            ExprKind::List(items),
            start.merge(self.previous_span()),
        ))
    }

    /// `"{" [expr ":" expr ("," expr ":" expr)* [","]] "}"`
    fn parse_dict(&mut self) -> PResult<Expr> {
        let start = self.advance().span;
        let mut entries = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) {
            let key = self.parse_expression()?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Expr::new(
            ExprKind::Dict(entries),
            start.merge(self.previous_span()),
        ))
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}
