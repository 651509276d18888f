//! Runtime error types for the rover evaluator.

use rover_types::ErrorKind;
use thiserror::Error;

/// Why a unit step could not be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveBlocked {
    #[error("out of bounds")]
    OutOfBounds,
    #[error("blocked by rock")]
    BlockedByRock,
}

/// Evaluation error. Any of these ends the run with an error Frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Unknown variable or function.
    #[error("NameError: {0}")]
    Name(String),
    /// Operation applied to a value of the wrong type, or wrong arity.
    #[error("TypeError: {0}")]
    Type(String),
    /// Right type, unacceptable value.
    #[error("ValueError: {0}")]
    Value(String),
    #[error("IndexError: {0}")]
    Index(String),
    /// Carries the `repr()` of the missing key.
    #[error("KeyError: {0}")]
    Key(String),
    #[error("ZeroDivisionError: {0}")]
    ZeroDivision(String),
    /// Integer overflow.
    #[error("ArithmeticError: {0}")]
    Arithmetic(String),
    #[error("RecursionError: maximum recursion depth exceeded")]
    Recursion,
    /// An illegal unit step; displays exactly as the Frame error text.
    #[error(transparent)]
    Movement(#[from] MoveBlocked),
    /// Step ceiling, `maxMoves`, or operation budget exhausted.
    #[error("step limit exceeded")]
    StepLimitExceeded,
}

impl EvalError {
    /// The tag carried in the run verdict.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Name(_) => ErrorKind::NameError,
            Self::Type(_) => ErrorKind::TypeError,
            Self::Value(_) => ErrorKind::ValueError,
            Self::Index(_) => ErrorKind::IndexError,
            Self::Key(_) => ErrorKind::KeyError,
            Self::ZeroDivision(_) => ErrorKind::ZeroDivisionError,
            Self::Arithmetic(_) => ErrorKind::ArithmeticError,
            Self::Recursion => ErrorKind::RecursionError,
            Self::Movement(_) => ErrorKind::RuntimeMovementError,
            Self::StepLimitExceeded => ErrorKind::StepLimitExceeded,
        }
    }

    pub(crate) fn overflow() -> Self {
        Self::Arithmetic("integer overflow".into())
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_errors_display_bare() {
        let err = EvalError::from(MoveBlocked::BlockedByRock);
        assert_eq!(err.to_string(), "blocked by rock");
        assert_eq!(err.kind(), ErrorKind::RuntimeMovementError);
        assert_eq!(
            EvalError::from(MoveBlocked::OutOfBounds).to_string(),
            "out of bounds"
        );
    }

    #[test]
    fn test_python_style_display() {
        let err = EvalError::Name("name 'x' is not defined".into());
        assert_eq!(err.to_string(), "NameError: name 'x' is not defined");
        assert_eq!(err.kind(), ErrorKind::NameError);
        assert_eq!(EvalError::StepLimitExceeded.to_string(), "step limit exceeded");
        assert_eq!(EvalError::overflow().kind(), ErrorKind::ArithmeticError);
    }
}
