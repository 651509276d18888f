//! Token types for the rover lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the rover language and
//! [`Token`], which pairs a kind with a source [`Span`].

use rover_types::Span;
use std::fmt;

/// All reserved words. These cannot be used as variable or function names.
pub const ALL_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "in", "def", "return", "break", "continue", "pass", "and", "or",
    "not", "True", "False", "None",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// 1-based source line of this token.
    pub fn line(&self) -> u32 {
        self.span.start_line
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ─────────────────────────────────────────────
    /// `42`
    Int(i64),
    /// `3.5`
    Float(f64),
    /// `"text"` or `'text'`, escapes resolved
    Str(String),
    /// `move_right`, `x`
    Identifier(String),

    // ── Keywords ─────────────────────────────────────────────
    If,
    Elif,
    Else,
    For,
    In,
    Def,
    Return,
    Break,
    Continue,
    Pass,
    And,
    Or,
    Not,
    True,
    False,
    None,

    // ── Operators ────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `//`
    SlashSlash,
    /// `%`
    Percent,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEq,
    /// `>=`
    GreaterEq,
    /// `=`
    Eq,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,

    // ── Punctuation ──────────────────────────────────────────
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,

    // ── Layout ───────────────────────────────────────────────
    /// End of a logical line.
    Newline,
    /// Indentation increased: a block opens.
    Indent,
    /// Indentation decreased: a block closes.
    Dedent,
    Eof,
}

impl TokenKind {
    /// Look up a reserved word. Returns `None` for user identifiers.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "def" => TokenKind::Def,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "pass" => TokenKind::Pass,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::If
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::In
                | TokenKind::Def
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Pass
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Not
                | TokenKind::True
                | TokenKind::False
                | TokenKind::None
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "{n}"),
            TokenKind::Float(n) => write!(f, "{n:?}"),
            TokenKind::Str(s) => write!(f, "'{s}'"),
            TokenKind::Identifier(s) => f.write_str(s),
            TokenKind::If => f.write_str("if"),
            TokenKind::Elif => f.write_str("elif"),
            TokenKind::Else => f.write_str("else"),
            TokenKind::For => f.write_str("for"),
            TokenKind::In => f.write_str("in"),
            TokenKind::Def => f.write_str("def"),
            TokenKind::Return => f.write_str("return"),
            TokenKind::Break => f.write_str("break"),
            TokenKind::Continue => f.write_str("continue"),
            TokenKind::Pass => f.write_str("pass"),
            TokenKind::And => f.write_str("and"),
            TokenKind::Or => f.write_str("or"),
            TokenKind::Not => f.write_str("not"),
            TokenKind::True => f.write_str("True"),
            TokenKind::False => f.write_str("False"),
            TokenKind::None => f.write_str("None"),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::SlashSlash => f.write_str("//"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::Less => f.write_str("<"),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::GreaterEq => f.write_str(">="),
            TokenKind::Eq => f.write_str("="),
            TokenKind::PlusEq => f.write_str("+="),
            TokenKind::MinusEq => f.write_str("-="),
            TokenKind::StarEq => f.write_str("*="),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Newline => f.write_str("end of line"),
            TokenKind::Indent => f.write_str("indent"),
            TokenKind::Dedent => f.write_str("dedent"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keyword_recognises_all() {
        for &kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw).unwrap();
            assert!(kind.is_keyword(), "'{kw}' should be a keyword");
            assert_eq!(kind.to_string(), kw, "display should match '{kw}'");
        }
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        for name in ["true", "false", "none", "If", "DEF", "move_right", "range"] {
            assert!(TokenKind::from_keyword(name).is_none(), "'{name}'");
        }
    }

    #[test]
    fn test_non_keywords() {
        let kinds = [
            TokenKind::Int(1),
            TokenKind::Str("hi".into()),
            TokenKind::Identifier("x".into()),
            TokenKind::Plus,
            TokenKind::Indent,
            TokenKind::Eof,
        ];
        for kind in &kinds {
            assert!(!kind.is_keyword(), "{kind:?}");
        }
    }

    #[test]
    fn test_display_operators() {
        assert_eq!(TokenKind::SlashSlash.to_string(), "//");
        assert_eq!(TokenKind::BangEq.to_string(), "!=");
        assert_eq!(TokenKind::PlusEq.to_string(), "+=");
        assert_eq!(TokenKind::Float(2.0).to_string(), "2.0");
        assert_eq!(TokenKind::Str("a".into()).to_string(), "'a'");
        assert_eq!(TokenKind::Newline.to_string(), "end of line");
    }

    #[test]
    fn test_token_line() {
        let token = Token::new(TokenKind::Colon, Span::new(4, 9, 4, 9));
        assert_eq!(token.line(), 4);
    }
}
