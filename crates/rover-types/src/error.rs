use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage that rejected the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Lex,
    Parse,
    /// The level descriptor itself could not be read.
    Level,
}

/// Numeric error code for static (pre-execution) errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lex errors (E100–E199) ──
    pub const UNTERMINATED_STRING: Self = Self(100);
    pub const INVALID_CHARACTER: Self = Self(101);
    pub const INCONSISTENT_INDENT: Self = Self(102);
    pub const INVALID_NUMBER: Self = Self(103);

    // ── Parse errors (E200–E299) ──
    pub const UNEXPECTED_TOKEN: Self = Self(200);
    pub const EXPECTED_INDENT: Self = Self(201);
    pub const UNEXPECTED_INDENT: Self = Self(202);
    pub const NESTED_FUNCTION: Self = Self(203);
    pub const OUTSIDE_LOOP: Self = Self(204);
    pub const OUTSIDE_FUNCTION: Self = Self(205);
    pub const INVALID_TARGET: Self = Self(206);
    pub const DUPLICATE_PARAMETER: Self = Self(207);
    pub const CHAINED_COMPARISON: Self = Self(208);
    pub const NESTING_LIMIT: Self = Self(209);

    // ── Level errors (E300–E399) ──
    pub const INVALID_LEVEL: Self = Self(300);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Lex,
            300..=399 => ErrorCategory::Level,
            _ => ErrorCategory::Parse,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex => write!(f, "LexError"),
            Self::Parse => write!(f, "ParseError"),
            Self::Level => write!(f, "LevelError"),
        }
    }
}

/// A structured error that stops a run before any frame exists.
///
/// The lesson UI renders these directly; it must not parse free-form strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoverError {
    /// Source file name.
    pub file: String,
    pub code: ErrorCode,
    /// Derived from `code`.
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, for context.
    pub source_line: String,
    /// Optional hint for the learner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl RoverError {
    /// Create a new error.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a hint.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// 1-based line of the error.
    pub fn line(&self) -> u32 {
        self.span.start_line
    }
}

impl fmt::Display for RoverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] line {}: {}",
            self.category, self.code, self.span.start_line, self.message
        )
    }
}

impl std::error::Error for RoverError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::UNTERMINATED_STRING.category(), ErrorCategory::Lex);
        assert_eq!(ErrorCode::INVALID_NUMBER.category(), ErrorCategory::Lex);
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.category(), ErrorCategory::Parse);
        assert_eq!(ErrorCode::NESTING_LIMIT.category(), ErrorCategory::Parse);
        assert_eq!(ErrorCode::INVALID_LEVEL.category(), ErrorCategory::Level);
    }

    #[test]
    fn test_error_display() {
        let err = RoverError::new(
            "main.py",
            ErrorCode::INVALID_CHARACTER,
            "invalid character '$'",
            Span::new(2, 5, 2, 5),
            "x = $",
        );
        assert_eq!(format!("{}", err.code), "E101");
        assert_eq!(err.to_string(), "LexError [E101] line 2: invalid character '$'");
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_error_json_shape() {
        let err = RoverError::new(
            "main.py",
            ErrorCode::UNEXPECTED_TOKEN,
            "expected ':' after if condition",
            Span::new(1, 9, 1, 9),
            "if x > 1",
        )
        .with_suggestion("add ':' at the end of the line");

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["category"], "parse");
        assert_eq!(json["line"], 1);
        assert_eq!(json["column"], 9);
        assert_eq!(json["source_line"], "if x > 1");
        assert_eq!(json["suggestion"], "add ':' at the end of the line");

        let back: RoverError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_suggestion_omitted_when_absent() {
        let err = RoverError::new(
            "main.py",
            ErrorCode::UNTERMINATED_STRING,
            "unterminated string literal",
            Span::point(1, 7),
            "speak('hi",
        );
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("suggestion"));
    }
}
