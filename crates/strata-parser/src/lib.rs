//! Strata parser crate.
//!
//! This crate provides the lexer and parser for strata source code:
//! - lexical analysis (tokenization) with configurable identifier rules
//! - the mutable syntax tree every compilation stage edits in place
//! - a lenient parser that recovers at statement boundaries
//! - visitors for tree traversal
//!
//! # Example
//!
//! ```
//! use strata_core::{Diagnostics, ModuleName};
//! use strata_parser::{LanguageConfig, Parser};
//!
//! let log = Diagnostics::new();
//! let block = Parser::parse_source(
//!     "fn double(x: Int32) -> Int32 { x * 2 }",
//!     ModuleName::from("main"),
//!     &LanguageConfig::default(),
//!     &log,
//! );
//! assert!(log.is_empty());
//! assert_eq!(block.len(), 1);
//! ```

// Lexer module
pub mod lexer;

// AST module
pub mod ast;

// Re-export commonly used types at crate root
pub use ast::Parser;
pub use lexer::{LanguageConfig, Lexer, Token, TokenKind};
