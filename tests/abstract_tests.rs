// tests/abstract_tests.rs

use std::collections::BTreeMap;

use jmespath_lang::runtime::{Shape, ShapeRuntime, ValueRuntime};
use jmespath_lang::{parse, EvalError, EvalOptions, Evaluator, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn record(fields: &[(&str, Shape)]) -> Shape {
    Shape::Record(
        fields
            .iter()
            .map(|(key, shape)| (key.to_string(), shape.clone()))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn infer(expression: &str, context: &Shape) -> Shape {
    parse(expression)
        .unwrap()
        .infer(context)
        .unwrap_or_else(|e| panic!("{expression}: {e}"))
}

fn infer_err(expression: &str, context: &Shape) -> EvalError {
    parse(expression).unwrap().infer(context).unwrap_err()
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_field_types() {
    let context = record(&[("foo", record(&[("bar", Shape::Number)]))]);
    assert_eq!(infer("foo.bar", &context), Shape::Number);
    assert_eq!(infer("foo.missing", &context), Shape::Null);
    assert_eq!(infer("foo.bar", &Shape::Any), Shape::Any);
}

#[test]
fn test_nullable_path() {
    let context = record(&[("foo", Shape::Null.union(record(&[("bar", Shape::String)])))]);
    assert_eq!(infer("foo.bar", &context).to_string(), "null | string");
}

#[test]
fn test_index_and_slice() {
    let tuple = Shape::Tuple(vec![Shape::Number, Shape::String, Shape::Boolean]);
    assert_eq!(infer("[0]", &tuple), Shape::Number);
    assert_eq!(infer("[-1]", &tuple), Shape::Boolean);
    assert_eq!(infer("[5]", &tuple), Shape::Null);
    assert_eq!(infer("[1:]", &tuple).to_string(), "[string, boolean]");
    assert_eq!(infer("[0]", &Shape::array(Shape::Number)).to_string(), "null | number");
}

#[test]
fn test_tuple_slice_extreme_steps() {
    let tuple = Shape::Tuple(vec![Shape::Number, Shape::String, Shape::Boolean]);
    assert_eq!(infer("[1::9223372036854775807]", &tuple).to_string(), "[string]");
    assert_eq!(infer("[::-9223372036854775808]", &tuple).to_string(), "[boolean]");
}

#[test]
fn test_literals() {
    assert_eq!(
        infer(r#"`{"a": [1, "x"]}`"#, &Shape::Any).to_string(),
        "{a: [number, string]}"
    );
    assert_eq!(infer("'raw'", &Shape::Any), Shape::String);
}

// ============================================================================
// Projections
// ============================================================================

#[test]
fn test_projection_over_array() {
    let person = record(&[("name", Shape::String), ("age", Shape::Number)]);
    let context = record(&[("people", Shape::array(person))]);
    assert_eq!(infer("people[*].name", &context), Shape::array(Shape::String));
}

#[test]
fn test_projection_over_tuple() {
    let context = Shape::Tuple(vec![
        record(&[("a", Shape::Number)]),
        record(&[("a", Shape::String)]),
    ]);
    assert_eq!(infer("[*].a", &context).to_string(), "[number, string]");
}

#[test]
fn test_object_projection_over_map() {
    let context = Shape::map(record(&[("a", Shape::Number)]));
    assert_eq!(infer("*.a", &context).to_string(), "array<number>");
}

#[test]
fn test_object_projection_skips_null_members() {
    let context = record(&[("a", Shape::Null), ("b", Shape::Number)]);
    assert_eq!(infer("*.not_null(@, 'x')", &context).to_string(), "[number]");
}

#[test]
fn test_filter_projection() {
    let item = record(&[("a", Shape::Number), ("b", Shape::String)]);
    assert_eq!(
        infer("[?a > `1`].b", &Shape::array(item)).to_string(),
        "array<string>"
    );
}

#[test]
fn test_flatten() {
    let nested = Shape::array(Shape::array(Shape::Number));
    assert_eq!(infer("[]", &nested).to_string(), "array<number>");
}

#[test]
fn test_projection_on_wrong_type_is_null() {
    assert_eq!(infer("[*].a", &Shape::String), Shape::Null);
}

// ============================================================================
// Multi-select and Logic
// ============================================================================

#[test]
fn test_multi_select_hash() {
    let context = record(&[("name", Shape::String), ("tags", Shape::array(Shape::String))]);
    assert_eq!(
        infer("{n: name, c: length(tags)}", &context).to_string(),
        "{c: number, n: string}"
    );
}

#[test]
fn test_logic() {
    let context = record(&[("a", Shape::Number), ("b", Shape::String), ("flag", Shape::Boolean)]);
    // numbers are always truthy
    assert_eq!(infer("a && b", &context), Shape::String);
    assert_eq!(infer("!flag", &context), Shape::Boolean);
    assert_eq!(infer("a == b", &context), Shape::Boolean);
    assert_eq!(infer("flag || b", &context).to_string(), "boolean | string");
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_length_on_string() {
    assert_eq!(infer("length(@)", &Shape::String), Shape::Number);
    assert_eq!(infer("length(@)", &Shape::Any), Shape::Number);
    assert_eq!(infer("length(@)", &Shape::Boolean.union(Shape::String)), Shape::Number);
}

#[test]
fn test_definite_type_error() {
    let err = infer_err("length(@)", &Shape::Boolean);
    assert!(matches!(
        err.kind(),
        EvalError::InvalidType {
            argument: 1,
            actual: jmespath_lang::RuntimeType::Boolean,
            ..
        }
    ));

    let context = record(&[("name", Shape::String)]);
    let err = infer_err("abs(name)", &context);
    assert_eq!(
        err.kind(),
        &EvalError::InvalidType {
            function: "abs".to_string(),
            argument: 1,
            expected: "number".to_string(),
            actual: jmespath_lang::RuntimeType::String,
        }
    );
}

#[test]
fn test_unknown_function() {
    assert!(matches!(
        infer_err("nope()", &Shape::Any).kind(),
        EvalError::UnknownFunction { .. }
    ));
}

#[test]
fn test_map() {
    let context = Shape::array(record(&[("a", Shape::Number)]));
    assert_eq!(infer("map(&a, @)", &context).to_string(), "array<number>");
}

#[test]
fn test_sort_by_keeps_length() {
    let context = Shape::Tuple(vec![
        record(&[("n", Shape::Number)]),
        record(&[("n", Shape::Number), ("x", Shape::String)]),
    ]);
    assert_eq!(
        infer("sort_by(@, &n)", &context).to_string(),
        "[{n: number, x: null | string}, {n: number, x: null | string}]"
    );
}

#[test]
fn test_min_by_may_be_null() {
    let context = Shape::array(record(&[("a", Shape::Number)]));
    assert_eq!(infer("min_by(@, &a)", &context).to_string(), "null | {a: number}");
}

#[test]
fn test_avg_may_be_null() {
    assert_eq!(infer("avg(@)", &Shape::array(Shape::Number)).to_string(), "null | number");
}

#[test]
fn test_either_is_union() {
    let context = record(&[("a", Shape::array(Shape::Number)), ("b", Shape::String)]);
    assert_eq!(infer("either(a, b)", &context).to_string(), "string | array<number>");
}

// ============================================================================
// Fixed Points
// ============================================================================

#[test]
fn test_fold_left_converges() {
    let context = Shape::array(Shape::Number.union(Shape::String));
    assert_eq!(
        infer("fold_left(`null`, &element, @)", &context).to_string(),
        "null | number | string"
    );
    assert_eq!(
        infer("fold_left(`0`, &sum([acc, element]), @)", &Shape::array(Shape::Number)),
        Shape::Number
    );
}

#[test]
fn test_fold_left_over_tuple_is_exact() {
    let context = Shape::Tuple(vec![Shape::Number, Shape::String]);
    assert_eq!(infer("fold_left(`null`, &element, @)", &context), Shape::String);
    assert_eq!(infer("fold_left(`[]`, &[acc], @)", &context).to_string(), "[[[]]]");
}

#[test]
fn test_fold_left_non_convergence() {
    let context = Shape::array(Shape::Number);
    let err = infer_err("fold_left(`[]`, &[acc], @)", &context);
    assert_eq!(err.kind(), &EvalError::NonConvergence { iterations: 64 });
}

#[test]
fn test_iteration_limit_is_configurable() {
    let expr = parse("fold_left(`[]`, &[acc], @)").unwrap();
    let evaluator = Evaluator::new(&ShapeRuntime).with_options(EvalOptions {
        max_fixed_point_iterations: 5,
    });
    let err = evaluator.evaluate(&expr, &Shape::array(Shape::Number)).unwrap_err();
    assert_eq!(err.kind(), &EvalError::NonConvergence { iterations: 5 });
    assert_eq!(evaluator.options().max_fixed_point_iterations, 5);
}

#[test]
fn test_inferred_shape_covers_concrete_results() {
    let expression = "fold_left(`null`, &element, @)";
    let inferred = infer(expression, &Shape::array(Shape::Number.union(Shape::String)));

    let documents = [json!([]), json!([1]), json!(["a", 2]), json!([1, "b"])];
    for doc in documents {
        let expr = parse(expression).unwrap();
        let concrete = expr.evaluate(&Value::from(doc.clone()), &ValueRuntime).unwrap();
        let actual = Shape::of_value(&concrete);
        assert_eq!(
            inferred.clone().union(actual),
            inferred,
            "Failed for document: {}",
            doc
        );
    }
}

#[test]
fn test_sample_document_context() {
    let sample = Value::from(json!({"a": [1, "x"], "b": {"c": true}}));
    let context = Shape::of_value(&sample);
    assert_eq!(context.to_string(), "{a: array<number | string>, b: {c: boolean}}");
    assert_eq!(infer("a[0]", &context).to_string(), "null | number | string");
    assert_eq!(infer("b.c", &context), Shape::Boolean);
}
