//! Core parser infrastructure: token cursor, error reporting, helpers.

use rover_lexer::token::{Token, TokenKind};
use rover_types::ast::{Ident, Program};
use rover_types::{ErrorCode, RoverError, SourceFile, Span};

/// Maximum nesting of expressions (parentheses, unary chains, literals).
pub const MAX_EXPR_DEPTH: u32 = 64;

/// Maximum height of one expression tree, counting operator chains such as
/// `1 + 1 + 1` and subscript chains such as `x[0][0]` one level per link.
pub const MAX_EXPR_HEIGHT: u32 = 256;

pub(crate) type PResult<T> = Result<T, RoverError>;

/// The rover parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Stops at the first error.
pub struct Parser<'src> {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    /// Current expression nesting depth.
    pub(crate) expr_depth: u32,
    /// Number of enclosing loops (for `break` / `continue`).
    pub(crate) loop_depth: u32,
    /// Number of enclosing indented suites.
    pub(crate) block_depth: u32,
    /// Inside a `def` body (for `return`).
    pub(crate) in_function: bool,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(mut tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(Span::point(1, 1), |t| t.span);
            tokens.push(Token::new(TokenKind::Eof, end));
        }
        Self {
            tokens,
            pos: 0,
            source_file,
            expr_depth: 0,
            loop_depth: 0,
            block_depth: 0,
            in_function: false,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> PResult<Token> {
        if self.check_exact(expected) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '{}', got '{}'", expected, self.peek_kind()),
            ))
        }
    }

    /// Expect the `:` that opens a suite.
    pub(crate) fn expect_colon(&mut self, after: &str) -> PResult<Token> {
        if self.check_exact(&TokenKind::Colon) {
            return Ok(self.advance());
        }
        Err(self
            .error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected ':' after {after}"),
            )
            .with_suggestion("add ':' at the end of the line"))
    }

    /// Expect the end of a simple statement.
    pub(crate) fn expect_newline(&mut self) -> PResult<()> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof | TokenKind::Dedent => Ok(()),
            other => Err(self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected end of line, got '{other}'"),
            )),
        }
    }

    /// Expect an identifier token.
    pub(crate) fn expect_identifier(&mut self, what: &str) -> PResult<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Ok(Ident::new(name, span))
            }
            other if other.is_keyword() => Err(self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("'{other}' is a reserved word and cannot be used as {what}"),
            )),
            other => Err(self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected {what}, got '{other}'"),
            )),
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Build an error at the current token position.
    pub(crate) fn error_at_current(
        &self,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> RoverError {
        self.error_at(code, message, self.current_span())
    }

    /// Build an error at a specific span.
    pub(crate) fn error_at(
        &self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
    ) -> RoverError {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        RoverError::new(&self.source_file.name, code, message, span, source_line)
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a `Program` AST.
    pub fn parse(mut self) -> PResult<Program> {
        let _span = tracing::debug_span!("parse", file = %self.source_file.name).entered();
        let program = self.parse_program()?;
        tracing::debug!(stmts = program.stmts.len(), "parsed");
        Ok(program)
    }
}
