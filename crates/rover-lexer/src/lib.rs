//! Rover lexer: converts source text into a token stream with
//! indentation-significant blocks.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind, ALL_KEYWORDS};
