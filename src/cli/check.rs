//! Evaluate an expression against JSON input

use super::CliError;
use crate::{Value, parse, runtime::ValueRuntime};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON input string
    pub input: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated successfully
    Success(Value),
}

/// Parse the expression and, unless only the syntax is wanted, evaluate it
/// against the input document.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let expr = parse(&options.expression)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let input = options.input.as_ref().ok_or(CliError::NoInput)?;
    let document = Value::from(serde_json::from_str::<serde_json::Value>(input)?);

    let result = expr.evaluate(&document, &ValueRuntime)?;
    Ok(CheckResult::Success(result))
}

#[test]
fn test_check_evaluates() {
    let options = CheckOptions {
        expression: "a.b".to_string(),
        input: Some(r#"{"a": {"b": [1, 2]}}"#.to_string()),
        syntax_only: false,
    };
    assert_eq!(
        execute_check(&options).unwrap(),
        CheckResult::Success(Value::Array(vec![Value::Integer(1), Value::Integer(2)]))
    );
}

#[test]
fn test_check_requires_input() {
    let options = CheckOptions {
        expression: "a".to_string(),
        ..CheckOptions::default()
    };
    assert!(matches!(execute_check(&options), Err(CliError::NoInput)));
}
