//! A JMESPath engine that evaluates one parsed expression against any
//! document representation, and infers result types from input types.
//!
//! ```
//! use jmespath_lang::{parse, Value};
//! use jmespath_lang::runtime::ValueRuntime;
//!
//! let expr = parse("people[?age > `20`].name | sort(@)").unwrap();
//! let doc = Value::from(serde_json::json!({
//!     "people": [
//!         {"name": "b", "age": 30},
//!         {"name": "c", "age": 10},
//!         {"name": "a", "age": 40}
//!     ]
//! }));
//!
//! let names = expr.evaluate(&doc, &ValueRuntime).unwrap();
//! assert_eq!(names, Value::Array(vec![Value::from("a"), Value::from("b")]));
//! ```
pub mod ast;
pub mod cli;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod lint;
pub mod output;
pub mod parser;
pub mod runtime;
pub mod value;

pub use ast::{ComparatorType, ExprKind, Expression, ExpressionVisitor, Token};
pub use evaluator::{EvalError, EvalOptions, Evaluator};
pub use functions::{Function, FunctionArgument, FunctionRegistry};
pub use lexer::{Lexer, Position, SyntaxError};
pub use lint::{Problem, Severity, lint};
pub use output::{to_json, to_json_pretty};
pub use parser::Parser;
pub use runtime::{Runtime, RuntimeType, Shape};
pub use value::Value;

/// Parse a JMESPath expression.
///
/// # Errors
///
/// A [`SyntaxError`] locating the first offending token; no partial tree is
/// ever returned.
pub fn parse(text: &str) -> Result<Expression, SyntaxError> {
    let expr = Parser::new(Lexer::new(text))?.parse()?;
    tracing::debug!(expression = text, "parsed");
    Ok(expr)
}
