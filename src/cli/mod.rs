//! CLI support for jmespath-lang
//!
//! Provides programmatic access to the `jmes` subcommands so other tools can
//! embed them without spawning a process.

mod check;
mod fmt;
mod infer;
mod lint;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use fmt::execute_fmt;
pub use infer::{InferOptions, execute_infer};
pub use lint::{LintOptions, execute_lint};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// The expression does not parse
    #[error("Parse error: {0}")]
    Parse(#[from] crate::SyntaxError),

    /// The expression parsed but failed to evaluate
    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    /// The input document is not JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No input document given
    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}
