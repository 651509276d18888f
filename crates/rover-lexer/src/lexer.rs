//! Core rover lexer: converts source text to a token stream.
//!
//! Features:
//! - Significant indentation: `Indent` / `Dedent` tokens from an indentation stack
//! - Blank and comment-only lines produce no tokens
//! - Newlines inside `()`, `[]`, `{}` are implicit line joins
//! - `#` comments stripped
//! - Single- or double-quoted strings with escapes
//! - Stops at the first error; no partial token stream is returned

use rover_types::{ErrorCode, RoverError, SourceFile, Span};
use tracing::{debug, trace};

use crate::token::{Token, TokenKind};

/// Tab stops are every 4 columns.
const TAB_WIDTH: u32 = 4;

type LexResult<T> = Result<T, RoverError>;

/// The rover lexer.
///
/// Converts source text into a vector of [`Token`]s, always terminated by
/// [`TokenKind::Eof`].
pub struct Lexer<'src> {
    /// The full source text.
    source: &'src str,
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    /// Widths of the open indentation levels; the bottom entry is always 0.
    indent_stack: Vec<u32>,
    /// Open `(`, `[`, `{` count.
    bracket_depth: u32,
    /// True before the first token of a logical line has been scanned.
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: &source_file.source,
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            bracket_depth: 0,
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        let _span = tracing::debug_span!("lex", file = %self.source_file.name).entered();

        loop {
            if self.at_line_start && self.bracket_depth == 0 {
                if !self.scan_indentation()? {
                    continue;
                }
                self.at_line_start = false;
            }

            self.skip_whitespace();
            let Some(ch) = self.peek() else {
                break;
            };

            match ch {
                b'#' => self.skip_comment(),
                b'\n' => {
                    let start = (self.line, self.col);
                    self.advance();
                    if self.bracket_depth == 0 {
                        self.push(TokenKind::Newline, start);
                        self.at_line_start = true;
                    }
                }
                _ => {
                    let token = self.scan_token()?;
                    trace!(kind = ?token.kind, line = token.span.start_line, "token");
                    self.tokens.push(token);
                }
            }
        }

        self.finish();
        debug!(count = self.tokens.len(), "lexed");
        Ok(self.tokens)
    }

    /// Close the stream: a final `Newline`, every pending `Dedent`, then `Eof`.
    fn finish(&mut self) {
        let end = (self.line, self.col);
        let needs_newline = self
            .tokens
            .last()
            .is_some_and(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Dedent));
        if needs_newline {
            self.push(TokenKind::Newline, end);
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, end);
        }
        self.push(TokenKind::Eof, end);
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + offset).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    /// Consume one full character (which may span several bytes).
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn span_from(&self, start: (u32, u32)) -> Span {
        Span::new(start.0, start.1, self.line, self.col.saturating_sub(1).max(1))
    }

    fn push(&mut self, kind: TokenKind, start: (u32, u32)) {
        let span = self.span_from(start);
        self.tokens.push(Token::new(kind, span));
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> RoverError {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        RoverError::new(&self.source_file.name, code, message, span, source_line)
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace, comments & indentation
    // ─────────────────────────────────────────────────────────────

    /// Skip spaces, tabs and carriage returns (not newlines).
    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r')) {
            self.advance();
        }
    }

    /// Skip a `#` comment up to, but not including, the newline.
    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == b'\n' {
                break;
            }
            self.advance();
        }
    }

    /// Measure the indentation of the line at the cursor and emit
    /// `Indent`/`Dedent` tokens for it.
    ///
    /// Returns `false` when the line was blank or comment-only and has been
    /// consumed; the caller then starts over on the next line.
    fn scan_indentation(&mut self) -> LexResult<bool> {
        let mut width = 0u32;
        loop {
            match self.peek() {
                Some(b' ') => width += 1,
                Some(b'\t') => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                Some(b'\r') => {}
                _ => break,
            }
            self.advance();
        }

        match self.peek() {
            None => return Ok(true),
            Some(b'#') => {
                self.skip_comment();
                self.advance();
                return Ok(false);
            }
            Some(b'\n') => {
                self.advance();
                return Ok(false);
            }
            Some(_) => {}
        }

        let start = (self.line, self.col);
        let current = self.indent_stack.last().copied().unwrap_or(0);
        if width > current {
            self.indent_stack.push(width);
            self.push(TokenKind::Indent, start);
        } else if width < current {
            while self.indent_stack.last().is_some_and(|&w| w > width) {
                self.indent_stack.pop();
                self.push(TokenKind::Dedent, start);
            }
            if self.indent_stack.last() != Some(&width) {
                return Err(self
                    .error(
                        ErrorCode::INCONSISTENT_INDENT,
                        "unindent does not match any outer indentation level",
                        Span::point(self.line, self.col),
                    )
                    .with_suggestion("line this statement up with an enclosing block"));
            }
        }
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> LexResult<Token> {
        let start = (self.line, self.col);
        let Some(ch) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, Span::point(start.0, start.1)));
        };

        let kind = match ch {
            '"' | '\'' => return self.scan_string(ch, start),
            '0'..='9' => return self.scan_number(start),
            'a'..='z' | 'A'..='Z' | '_' => return Ok(self.scan_identifier(start)),

            '+' if self.eat(b'=') => TokenKind::PlusEq,
            '+' => TokenKind::Plus,
            '-' if self.eat(b'=') => TokenKind::MinusEq,
            '-' => TokenKind::Minus,
            '*' if self.eat(b'=') => TokenKind::StarEq,
            '*' => TokenKind::Star,
            '/' if self.eat(b'/') => TokenKind::SlashSlash,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' if self.eat(b'=') => TokenKind::EqEq,
            '=' => TokenKind::Eq,
            '!' if self.eat(b'=') => TokenKind::BangEq,
            '<' if self.eat(b'=') => TokenKind::LessEq,
            '<' => TokenKind::Less,
            '>' if self.eat(b'=') => TokenKind::GreaterEq,
            '>' => TokenKind::Greater,

            '(' | '[' | '{' => {
                self.bracket_depth += 1;
                match ch {
                    '(' => TokenKind::LParen,
                    '[' => TokenKind::LBracket,
                    _ => TokenKind::LBrace,
                }
            }
            ')' | ']' | '}' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                match ch {
                    ')' => TokenKind::RParen,
                    ']' => TokenKind::RBracket,
                    _ => TokenKind::RBrace,
                }
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,

            '!' => {
                let span = self.span_from(start);
                return Err(self
                    .error(ErrorCode::INVALID_CHARACTER, "invalid character '!'", span)
                    .with_suggestion("use 'not' for negation, or '!=' for inequality"));
            }
            other => {
                let span = self.span_from(start);
                return Err(self.error(
                    ErrorCode::INVALID_CHARACTER,
                    format!("invalid character '{other}'"),
                    span,
                ));
            }
        };

        Ok(Token::new(kind, self.span_from(start)))
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: (u32, u32)) -> LexResult<Token> {
        // The first digit was already consumed.
        let begin = self.pos - 1;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == Some(b'.') {
            if matches!(self.peek_at(1), Some(b'0'..=b'9')) {
                is_float = true;
                self.advance();
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.advance();
                }
            } else if !matches!(self.peek_at(1), Some(b'a'..=b'z' | b'A'..=b'Z' | b'_')) {
                // `1.` with nothing after the dot; `1.x` is left to the parser.
                self.advance();
                let span = self.span_from(start);
                let text = &self.source[begin..self.pos];
                return Err(self
                    .error(
                        ErrorCode::INVALID_NUMBER,
                        format!("invalid number literal '{text}'"),
                        span,
                    )
                    .with_suggestion(format!("write '{text}0'")));
            }
        }

        if matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'_')) {
            while matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
                self.advance();
            }
            let span = self.span_from(start);
            let text = &self.source[begin..self.pos];
            return Err(self.error(
                ErrorCode::INVALID_NUMBER,
                format!("invalid number literal '{text}'"),
                span,
            ));
        }

        let span = self.span_from(start);
        let text = &self.source[begin..self.pos];
        let kind = if is_float {
            match text.parse::<f64>() {
                Ok(value) => TokenKind::Float(value),
                Err(_) => {
                    return Err(self.error(
                        ErrorCode::INVALID_NUMBER,
                        format!("invalid number literal '{text}'"),
                        span,
                    ))
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => TokenKind::Int(value),
                Err(_) => {
                    return Err(self.error(
                        ErrorCode::INVALID_NUMBER,
                        format!("integer literal '{text}' is too large"),
                        span,
                    ))
                }
            }
        };
        Ok(Token::new(kind, span))
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: (u32, u32)) -> Token {
        let begin = self.pos - 1;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[begin..self.pos];
        let kind =
            TokenKind::from_keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()));
        Token::new(kind, self.span_from(start))
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a string literal after its opening `quote`.
    fn scan_string(&mut self, quote: char, start: (u32, u32)) -> LexResult<Token> {
        let mut buf = String::new();

        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    let span = self.span_from(start);
                    return Err(self
                        .error(
                            ErrorCode::UNTERMINATED_STRING,
                            "unterminated string literal",
                            span,
                        )
                        .with_suggestion(format!("close the string with {quote}")));
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    return Ok(Token::new(TokenKind::Str(buf), self.span_from(start)));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        None | Some('\n') => continue,
                        Some(escaped) => {
                            self.advance();
                            match escaped {
                                'n' => buf.push('\n'),
                                't' => buf.push('\t'),
                                'r' => buf.push('\r'),
                                '0' => buf.push('\0'),
                                '\\' | '\'' | '"' => buf.push(escaped),
                                // Unknown escapes are kept verbatim.
                                other => {
                                    buf.push('\\');
                                    buf.push(other);
                                }
                            }
                        }
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }
}
