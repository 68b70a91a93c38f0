//! Syntax tree for strata modules.
//!
//! This module provides:
//! - tree node definitions (blocks, statements, expressions)
//! - the parser that turns tokens into a tree
//! - s-expression rendering used by snapshots and tree dumps
//! - visitor traits for traversal and in-place rewriting
//!
//! # Example
//!
//! ```
//! use strata_parser::Parser;
//!
//! let expr = Parser::expression("1 + 2 * 3").unwrap();
//! assert_eq!(expr.to_string(), "(+ 1 (* 2 3))");
//! ```

// Core types
pub mod node;
pub mod ops;

mod parser;
mod type_parser;

pub mod expr;
mod expr_parser;

mod stmt_parser;

mod display;
pub mod visitor;

pub use strata_core::{ParseError, ParseErrorKind};

pub use expr::*;
pub use node::*;
pub use ops::*;
pub use parser::Parser;
pub use visitor::{Visit, VisitMut};
