//! # JMESPath - Abstract Syntax Tree
//!
//! This module defines the syntax tree produced by [`parse`](crate::parse).
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer, with binding powers
//! - **[expressions]** - The [`Expression`] node and its closed set of variants
//! - **[operators]** - Comparison operators
//! - **[visitor]** - Per-variant traversal and the canonical serializer
//!
//! ## Quick Start
//!
//! ```text
//! people[?age > `20`].name | sort(@)
//! ```
//!
//! This selects the names of everyone older than twenty, sorted.
//!
//! ## Core Concepts
//!
//! ### Sub-expressions vs. pipes
//!
//! `a.b` and `a[0]` are sub-expressions: if `a` is null the chain stops and
//! yields null. `a | b` is a pipe: `b` always runs with `a`'s result as the
//! current node, even when it is null.
//!
//! ### Projections
//!
//! `[*]`, `*`, `[]`, slices and filters are projections. The right-hand side
//! runs once per element, and elements whose result is null are dropped.
//! A projection keeps going through `.field` and `[index]` chains until a pipe
//! (or a lower-precedence operator) stops it:
//!
//! ```text
//! foo[*].bar[0]      // [0] applies to each projected bar
//! foo[*].bar | [0]   // [0] applies to the projected list
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;
pub mod visitor;

pub use expressions::{Binary, ExprKind, Expression};
pub use operators::ComparatorType;
pub use tokens::Token;
pub use visitor::ExpressionVisitor;
