//! Infer the result shape of an expression

use super::CliError;
use crate::{
    EvalOptions, Evaluator, Value, parse,
    runtime::{Shape, ShapeRuntime},
};

/// Options for the infer command
#[derive(Debug, Clone, Default)]
pub struct InferOptions {
    /// The expression to analyze
    pub expression: String,
    /// Sample JSON document describing the input; any input when absent
    pub sample: Option<String>,
    /// Override for the fixed-point iteration limit
    pub max_iterations: Option<usize>,
}

/// Infer the shape of the expression's result.
pub fn execute_infer(options: &InferOptions) -> Result<Shape, CliError> {
    let expr = parse(&options.expression)?;

    let context = match &options.sample {
        Some(sample) => Shape::of_value(&Value::from(serde_json::from_str::<serde_json::Value>(sample)?)),
        None => Shape::Any,
    };

    let mut eval_options = EvalOptions::default();
    if let Some(limit) = options.max_iterations {
        eval_options.max_fixed_point_iterations = limit;
    }

    let shape = Evaluator::new(&ShapeRuntime)
        .with_options(eval_options)
        .evaluate(&expr, &context)?;
    Ok(shape)
}

#[test]
fn test_infer_from_sample() {
    let options = InferOptions {
        expression: "people[*].name".to_string(),
        sample: Some(r#"{"people": [{"name": "a"}]}"#.to_string()),
        max_iterations: None,
    };
    assert_eq!(execute_infer(&options).unwrap().to_string(), "array<string>");
}
