// tests/function_tests.rs

use std::sync::Arc;

use jmespath_lang::functions::{ArgType, Function, FunctionArgument, FunctionRegistry, Signature};
use jmespath_lang::lexer::Position;
use jmespath_lang::runtime::{JsonRuntime, Number, Runtime, RuntimeType, ValueRuntime};
use jmespath_lang::{parse, EvalError, Evaluator, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn search(expression: &str, doc: serde_json::Value) -> Value {
    let expr = parse(expression).unwrap();
    expr.evaluate(&Value::from(doc), &ValueRuntime)
        .unwrap_or_else(|e| panic!("{expression}: {e}"))
}

fn call(expression: &str) -> Value {
    search(expression, json!(null))
}

fn call_err(expression: &str) -> EvalError {
    let expr = parse(expression).unwrap();
    expr.evaluate(&Value::Null, &ValueRuntime).unwrap_err()
}

fn v(doc: serde_json::Value) -> Value {
    Value::from(doc)
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_abs() {
    assert_eq!(call("abs(`-3`)"), v(json!(3)));
    assert_eq!(call("abs(`-1.5`)"), v(json!(1.5)));
}

#[test]
fn test_ceil_floor() {
    assert_eq!(call("ceil(`1.2`)"), Value::Integer(2));
    assert_eq!(call("floor(`1.8`)"), Value::Integer(1));
    assert_eq!(call("floor(`-1.2`)"), Value::Integer(-2));
    assert_eq!(call("ceil(`3`)"), Value::Integer(3));
}

#[test]
fn test_sum_and_avg() {
    assert_eq!(call("sum(`[1, 2, 3]`)"), Value::Integer(6));
    assert_eq!(call("sum(`[1, 2.5]`)"), Value::Float(3.5));
    assert_eq!(call("sum(`[]`)"), Value::Integer(0));
    assert_eq!(call("avg(`[1, 2, 3]`)"), Value::Integer(2));
    assert_eq!(call("avg(`[1, 2]`)"), Value::Float(1.5));
    assert_eq!(call("avg(`[]`)"), Value::Null);
}

#[test]
fn test_numeric_array_types() {
    let err = call_err("sum(`[1, \"2\"]`)");
    assert_eq!(
        err.kind(),
        &EvalError::InvalidType {
            function: "sum".to_string(),
            argument: 1,
            expected: "array of number".to_string(),
            actual: RuntimeType::Array,
        }
    );
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_predicates() {
    assert_eq!(call("starts_with('foobar', 'foo')"), Value::Boolean(true));
    assert_eq!(call("starts_with('foobar', 'bar')"), Value::Boolean(false));
    assert_eq!(call("ends_with('foobar', 'bar')"), Value::Boolean(true));
    assert_eq!(call("contains('foobar', 'oba')"), Value::Boolean(true));
    assert_eq!(call("contains('foobar', `1`)"), Value::Boolean(false));
}

#[test]
fn test_contains_array() {
    assert_eq!(call("contains(`[1, \"a\", {\"b\": 2}]`, `2.0`)"), Value::Boolean(false));
    assert_eq!(call("contains(`[1, 2]`, `2.0`)"), Value::Boolean(true));
    assert_eq!(call("contains(`[{\"b\": 2}]`, `{\"b\": 2}`)"), Value::Boolean(true));
}

#[test]
fn test_join() {
    assert_eq!(call("join(', ', `[\"a\", \"b\", \"c\"]`)"), v(json!("a, b, c")));
    assert_eq!(call("join('-', `[]`)"), v(json!("")));

    let err = call_err("join(', ', `[\"a\", 1]`)");
    assert!(matches!(err.kind(), EvalError::InvalidType { argument: 2, .. }));
}

#[test]
fn test_reverse() {
    assert_eq!(call("reverse('abc')"), v(json!("cba")));
    assert_eq!(call("reverse(`[1, 2, 3]`)"), v(json!([3, 2, 1])));
    assert_eq!(call("reverse(`[]`)"), v(json!([])));
}

// ============================================================================
// Objects
// ============================================================================

#[test]
fn test_keys_and_values() {
    let doc = json!({"b": 1, "a": 2});
    assert_eq!(search("keys(@)", doc.clone()), v(json!(["a", "b"])));
    assert_eq!(search("values(@)", doc), v(json!([2, 1])));
}

#[test]
fn test_merge() {
    assert_eq!(
        call("merge(`{\"a\": 1, \"b\": 2}`, `{\"b\": 3}`, `{\"c\": 4}`)"),
        v(json!({"a": 1, "b": 3, "c": 4}))
    );
    assert_eq!(call("merge(`{}`)"), v(json!({})));
}

// ============================================================================
// Length and Types
// ============================================================================

#[test]
fn test_length() {
    assert_eq!(call("length('hello')"), Value::Integer(5));
    assert_eq!(call("length('été')"), Value::Integer(3));
    assert_eq!(call("length(`[1, 2, 3]`)"), Value::Integer(3));
    assert_eq!(call("length(`{\"a\": 1}`)"), Value::Integer(1));
}

#[test]
fn test_length_type_error() {
    let err = call_err("length(`true`)");
    assert_eq!(err.position(), Some(Position::new(1, 1)));
    assert_eq!(
        err.kind(),
        &EvalError::InvalidType {
            function: "length".to_string(),
            argument: 1,
            expected: "string, array or object".to_string(),
            actual: RuntimeType::Boolean,
        }
    );
    assert_eq!(
        err.to_string(),
        "length() argument 1: expected string, array or object, found boolean at line 1 column 1"
    );
}

#[test]
fn test_type() {
    let cases = vec![
        ("`null`", "null"),
        ("`true`", "boolean"),
        ("`1.5`", "number"),
        ("'s'", "string"),
        ("`[]`", "array"),
        ("`{}`", "object"),
    ];
    for (arg, expected) in cases {
        assert_eq!(call(&format!("type({arg})")), v(json!(expected)), "Failed for: {}", arg);
    }
}

#[test]
fn test_conversions() {
    assert_eq!(call("to_array(`1`)"), v(json!([1])));
    assert_eq!(call("to_array(`[1]`)"), v(json!([1])));
    assert_eq!(call("to_number('12')"), Value::Integer(12));
    assert_eq!(call("to_number('1.5')"), Value::Float(1.5));
    assert_eq!(call("to_number('abc')"), Value::Null);
    assert_eq!(call("to_number(`true`)"), Value::Null);
    assert_eq!(call("to_number(`5`)"), Value::Integer(5));
    assert_eq!(call("to_string('x')"), v(json!("x")));
    assert_eq!(call("to_string(`[1, 2]`)"), v(json!("[1,2]")));
    assert_eq!(call("to_string(`{\"a\": null}`)"), v(json!("{\"a\":null}")));
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn test_min_max() {
    assert_eq!(call("max(`[1, 3, 2]`)"), Value::Integer(3));
    assert_eq!(call("min(`[1, 3, 2]`)"), Value::Integer(1));
    assert_eq!(call("max(`[\"a\", \"c\", \"b\"]`)"), v(json!("c")));
    assert_eq!(call("max(`[]`)"), Value::Null);

    let err = call_err("max(`[1, \"a\"]`)");
    assert_eq!(
        err.kind(),
        &EvalError::InvalidType {
            function: "max".to_string(),
            argument: 1,
            expected: "array of number or array of string".to_string(),
            actual: RuntimeType::String,
        }
    );
}

#[test]
fn test_min_by_max_by() {
    assert_eq!(call("min_by(`[{\"a\": 3}, {\"a\": 1}]`, &a)"), v(json!({"a": 1})));
    assert_eq!(call("max_by(`[{\"a\": 3}, {\"a\": 1}]`, &a)"), v(json!({"a": 3})));
    assert_eq!(call("min_by(`[]`, &a)"), Value::Null);
    // ties keep the first element
    assert_eq!(
        call("max_by(`[{\"a\": 1, \"i\": 0}, {\"a\": 1, \"i\": 1}]`, &a).i"),
        Value::Integer(0)
    );
}

#[test]
fn test_min_by_key_type() {
    let err = call_err("min_by(`[{\"a\": 1}, {\"a\": true}]`, &a)");
    assert!(matches!(
        err.kind(),
        EvalError::InvalidType {
            argument: 2,
            actual: RuntimeType::Boolean,
            ..
        }
    ));
}

#[test]
fn test_sort() {
    assert_eq!(call("sort(`[3, 1.5, 2]`)"), v(json!([1.5, 2, 3])));
    assert_eq!(call("sort(`[\"b\", \"a\"]`)"), v(json!(["a", "b"])));
    assert!(matches!(
        call_err("sort(`[1, \"a\"]`)").kind(),
        EvalError::InvalidType { .. }
    ));
}

#[test]
fn test_sort_by_is_stable() {
    let doc = json!({"people": [
        {"name": "a", "age": 30},
        {"name": "b", "age": 20},
        {"name": "c", "age": 30},
        {"name": "d", "age": 10}
    ]});
    assert_eq!(search("sort_by(people, &age)[*].name", doc), v(json!(["d", "b", "a", "c"])));
}

#[test]
fn test_map() {
    let doc = json!([{"a": 1}, {"b": 2}, {"a": 3}]);
    assert_eq!(search("map(&a, @)", doc), v(json!([1, null, 3])));
    assert_eq!(call("map(&length(@), `[\"ab\", [1]]`)"), v(json!([2, 1])));
}

#[test]
fn test_not_null() {
    assert_eq!(call("not_null(missing, `null`, 'x', 'y')"), v(json!("x")));
    assert_eq!(call("not_null(`null`)"), Value::Null);
    assert_eq!(
        call_err("not_null()").kind(),
        &EvalError::Arity {
            function: "not_null".to_string(),
            expected: "at least 1 argument".to_string(),
            actual: 0,
        }
    );
}

#[test]
fn test_either() {
    assert_eq!(call("either(`[]`, 'x')"), v(json!("x")));
    assert_eq!(call("either(`[1]`, 'x')"), v(json!([1])));
    assert_eq!(call("either('a', 'b')"), v(json!("b")));
}

#[test]
fn test_fold_left() {
    assert_eq!(call("fold_left(`0`, &sum([acc, element]), `[1, 2, 3]`)"), Value::Integer(6));
    assert_eq!(call("fold_left(`0`, &sum([acc, element]), `[]`)"), Value::Integer(0));
    assert_eq!(
        call("fold_left('', &join('', [acc, element]), `[\"a\", \"b\", \"c\"]`)"),
        v(json!("abc"))
    );
}

// ============================================================================
// Argument Checking
// ============================================================================

#[test]
fn test_expression_where_value_expected() {
    let err = call_err("length(&a)");
    assert!(matches!(
        err.kind(),
        EvalError::InvalidType {
            actual: RuntimeType::Expression,
            ..
        }
    ));
}

#[test]
fn test_value_where_expression_expected() {
    let err = search_err_at("people | sort_by(@, 'age')", json!({"people": []}));
    assert_eq!(err.position(), Some(Position::new(1, 10)));
    assert_eq!(
        err.kind(),
        &EvalError::InvalidType {
            function: "sort_by".to_string(),
            argument: 2,
            expected: "expression".to_string(),
            actual: RuntimeType::String,
        }
    );
}

fn search_err_at(expression: &str, doc: serde_json::Value) -> EvalError {
    let expr = parse(expression).unwrap();
    expr.evaluate(&Value::from(doc), &ValueRuntime).unwrap_err()
}

// ============================================================================
// Registry
// ============================================================================

struct Double;

impl<R: Runtime> Function<R> for Double {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(RuntimeType::Number)], RuntimeType::Number)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let n = args
            .first()
            .and_then(FunctionArgument::as_value)
            .and_then(|value| rt.as_number(value))
            .ok_or_else(|| EvalError::InvalidValue("expected a number".to_string()))?;
        Ok(rt.create_number(Number::from_f64(n.as_f64() * 2.0)))
    }
}

#[test]
fn test_register_custom_function() {
    let mut functions = FunctionRegistry::<ValueRuntime>::builtin();
    assert!(!functions.contains("double"));
    functions.register("double", Double);
    assert!(functions.contains("double"));

    let expr = parse("items[*].n | map(&double(@), @)").unwrap();
    let doc = v(json!({"items": [{"n": 1}, {"n": 2.5}]}));
    let result = Evaluator::with_functions(&ValueRuntime, &functions).evaluate(&expr, &doc);
    assert_eq!(result, Ok(v(json!([2, 5]))));

    // the default registry is unaffected
    assert!(matches!(
        expr.evaluate(&doc, &ValueRuntime).unwrap_err().kind(),
        EvalError::UnknownFunction { .. }
    ));
}

#[test]
fn test_builtin_names() {
    let functions = FunctionRegistry::<JsonRuntime>::builtin();
    let names = functions.names();
    assert_eq!(names.len(), 28);
    assert_eq!(names.first(), Some(&"abs"));
    assert!(names.contains(&"to_string"));
    assert!(names.contains(&"fold_left"));
}

#[test]
fn test_shared_builtin_registry() {
    let first = FunctionRegistry::<ValueRuntime>::shared();
    let second = FunctionRegistry::<ValueRuntime>::shared();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.names(), FunctionRegistry::<ValueRuntime>::builtin().names());

    // each runtime type gets its own table
    let json = FunctionRegistry::<JsonRuntime>::shared();
    assert_eq!(json.names().len(), 28);
}

#[test]
fn test_functions_on_json_runtime() {
    let doc = json!({"xs": [3, 1, 2], "o": {"k": "v"}});
    let cases = vec![
        ("sort(xs)", json!([1, 2, 3])),
        ("sum(xs)", json!(6)),
        ("avg(xs)", json!(2)),
        ("keys(o)", json!(["k"])),
        ("to_string(o)", json!("{\"k\":\"v\"}")),
        ("length(xs)", json!(3)),
        ("max_by(xs, &@)", json!(3)),
    ];
    for (expression, expected) in cases {
        let expr = parse(expression).unwrap();
        assert_eq!(expr.evaluate(&doc, &JsonRuntime).unwrap(), expected, "Failed for: {}", expression);
    }
}
