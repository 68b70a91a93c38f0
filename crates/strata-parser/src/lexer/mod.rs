//! Lexical analysis for the strata surface language.

mod config;
mod cursor;
mod lexer;
mod token;

pub use config::LanguageConfig;
pub use lexer::Lexer;
pub use token::{Token, TokenKind, lookup_keyword};
