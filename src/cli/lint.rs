//! Report suspicious steps in an expression

use super::CliError;
use crate::{
    Problem, Value, lint, parse,
    runtime::Shape,
};

/// Options for the lint command
#[derive(Debug, Clone, Default)]
pub struct LintOptions {
    /// The expression to check
    pub expression: String,
    /// Sample JSON document describing the input; any input when absent
    pub sample: Option<String>,
}

/// Lint the expression against the sample's shape.
pub fn execute_lint(options: &LintOptions) -> Result<Vec<Problem>, CliError> {
    let expr = parse(&options.expression)?;

    let context = match &options.sample {
        Some(sample) => Shape::of_value(&Value::from(serde_json::from_str::<serde_json::Value>(sample)?)),
        None => Shape::Any,
    };

    Ok(lint(&expr, &context))
}

#[test]
fn test_lint_against_sample() {
    let options = LintOptions {
        expression: "people[*].nmae".to_string(),
        sample: Some(r#"{"people": [{"name": "a"}]}"#.to_string()),
    };
    let problems: Vec<String> = execute_lint(&options).unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(
        problems,
        vec!["[DANGER] Object field 'nmae' does not exist in object with properties [name] (1:11)"]
    );
}

#[test]
fn test_lint_clean_expression() {
    let options = LintOptions {
        expression: "length(@)".to_string(),
        sample: None,
    };
    assert!(execute_lint(&options).unwrap().is_empty());
}
