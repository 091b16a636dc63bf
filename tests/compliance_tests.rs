// tests/compliance_tests.rs
//
// The documented guarantees of the engine, one test each, against both
// concrete backends where a document is involved.

use jmespath_lang::lexer::Position;
use jmespath_lang::runtime::{JsonRuntime, Shape, ValueRuntime};
use jmespath_lang::{parse, EvalError, RuntimeType, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Evaluate with both backends and check they agree.
fn search(expression: &str, doc: serde_json::Value) -> serde_json::Value {
    let expr = parse(expression).unwrap();
    let from_json = expr.evaluate(&doc, &JsonRuntime).unwrap();
    let from_value = expr.evaluate(&Value::from(doc), &ValueRuntime).unwrap();
    assert_eq!(Value::from(from_json.clone()), from_value, "backends disagree on {expression}");
    from_json
}

#[test]
fn test_pipe_composes() {
    let docs = [
        json!({"a": {"b": [1, 2]}}),
        json!({"a": null}),
        json!({"a": {"b": "x"}}),
        json!([]),
    ];
    for doc in docs {
        let intermediate = search("a", doc.clone());
        assert_eq!(search("a | b", doc.clone()), search("b", intermediate), "Failed for: {}", doc);
    }
}

#[test]
fn test_projection_drops_null_elements() {
    let doc = json!({"items": [{"a": {"b": 1}}, {"a": null}, {"x": 1}, {"a": {"b": 2}}]});
    assert_eq!(search("items[*].a.b", doc.clone()), json!([1, 2]));
    // a pipe applies to the whole projected array instead
    assert_eq!(search("items[*].a | [*].b", doc), json!([1, 2]));
}

#[test]
fn test_flatten_properties() {
    assert_eq!(search("@[]", json!([[1, 2], [3]])), json!([1, 2, 3]));
    assert_eq!(search("@[]", json!([1, [2, 3]])), json!([1, 2, 3]));
    assert_eq!(search("@[]", json!("x")), json!(null));
}

#[test]
fn test_sub_expression_properties() {
    assert_eq!(search("foo.bar", json!({"foo": {"bar": 5}})), json!(5));
    assert_eq!(search("foo.bar", json!({"foo": null})), json!(null));
    assert_eq!(search("foo.bar", json!({})), json!(null));
}

#[test]
fn test_negative_index() {
    assert_eq!(search("foo[-1]", json!({"foo": [1, 2, 3]})), json!(3));
}

#[test]
fn test_filter_equality() {
    assert_eq!(
        search("foo[?bar==`1`]", json!({"foo": [{"bar": 1}, {"bar": 2}]})),
        json!([{"bar": 1}])
    );
}

#[test]
fn test_length_properties() {
    assert_eq!(search("length('hello')", json!(null)), json!(5));
    assert_eq!(search("length(`[1,2,3]`)", json!(null)), json!(3));

    let err = parse("length(`true`)")
        .unwrap()
        .evaluate(&json!(null), &JsonRuntime)
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        EvalError::InvalidType {
            actual: RuntimeType::Boolean,
            ..
        }
    ));
}

#[test]
fn test_not_null_on_null_current() {
    assert_eq!(search("not_null(@, `null`, 'x')", json!(null)), json!("x"));
}

#[test]
fn test_min_by_properties() {
    assert_eq!(search(r#"min_by(`[{"a":3},{"a":1}]`, &a)"#, json!(null)), json!({"a": 1}));
    assert_eq!(search("min_by(`[]`, &a)", json!(null)), json!(null));
}

#[test]
fn test_double_dot_position() {
    let err = parse("foo..bar").unwrap_err();
    assert_eq!(err.position, Position::new(1, 5));
    assert_eq!(err.found, "'.'");
}

#[test]
fn test_fold_left_fixed_point() {
    // the union of the element types, plus the initial null for empty arrays
    let converging = parse("fold_left(`null`, &element, @)").unwrap();
    let context = Shape::array(Shape::Number.union(Shape::String));
    assert_eq!(
        converging.infer(&context).unwrap(),
        Shape::Union(vec![Shape::Null, Shape::Number, Shape::String])
    );

    let growing = parse("fold_left(`[]`, &[acc], @)").unwrap();
    assert!(matches!(
        growing.infer(&Shape::array(Shape::Number)).unwrap_err().kind(),
        EvalError::NonConvergence { .. }
    ));
}
