// tests/lint_tests.rs

use jmespath_lang::runtime::Shape;
use jmespath_lang::{lint, parse, Severity, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn check(expression: &str) -> Vec<String> {
    check_with(expression, &Shape::Any)
}

fn check_with(expression: &str, context: &Shape) -> Vec<String> {
    let expr = parse(expression).unwrap_or_else(|e| panic!("{expression}: {e}"));
    lint(&expr, context).iter().map(ToString::to_string).collect()
}

fn assert_clean(cases: &[&str]) {
    for expression in cases {
        assert_eq!(check(expression), Vec::<String>::new(), "Failed for input: {expression}");
    }
}

// ============================================================================
// Projections
// ============================================================================

#[test]
fn test_array_projection_on_object() {
    assert_eq!(
        check(r#"`{"foo": true}` | [*]"#),
        vec!["[DANGER] Array projection performed on object (1:19)"]
    );
}

#[test]
fn test_object_projection_on_array() {
    assert_eq!(
        check("`[1]` | *"),
        vec!["[DANGER] Object projection performed on array (1:9)"]
    );
}

#[test]
fn test_flatten_on_boolean() {
    assert_eq!(
        check("`true` | []"),
        vec!["[DANGER] Array flatten performed on boolean (1:10)"]
    );
}

#[test]
fn test_object_projection_checks_members() {
    assert_eq!(
        check(r#"`{"foo": ["hi"]}`.*.nope"#),
        vec!["[DANGER] Object field 'nope' extraction performed on array (1:21)"]
    );
    assert_eq!(
        check(r#"`{"foo": [true]}`.*[0].length(@)"#),
        vec!["[ERROR] length() argument 1: expected string, array or object, found boolean (1:31)"]
    );
}

// ============================================================================
// Fields, Indexes, Slices
// ============================================================================

#[test]
fn test_field_on_array() {
    assert_eq!(
        check("`[1]`.baz"),
        vec!["[DANGER] Object field 'baz' extraction performed on array (1:7)"]
    );
}

#[test]
fn test_missing_record_property() {
    assert_eq!(
        check("`{}` | foo"),
        vec!["[DANGER] Object field 'foo' does not exist in object with properties [] (1:8)"]
    );
    assert_clean(&[r#"`{"foo": true}` | foo"#]);
}

#[test]
fn test_multi_select_items_are_checked() {
    assert_eq!(
        check("`true` | [foo, [1], {bar: foo}]"),
        vec![
            "[DANGER] Object field 'foo' extraction performed on boolean (1:11)",
            "[DANGER] Array index '1' extraction performed on boolean (1:16)",
            "[DANGER] Object field 'foo' extraction performed on boolean (1:27)",
        ]
    );
}

#[test]
fn test_comparison_operands_are_checked() {
    assert_eq!(
        check("`true` | foo == [1]"),
        vec![
            "[DANGER] Object field 'foo' extraction performed on boolean (1:10)",
            "[DANGER] Array index '1' extraction performed on boolean (1:17)",
        ]
    );
}

#[test]
fn test_index_on_tuple_is_clean() {
    assert_clean(&["`[1]` | [1]", "`[1]` | [0]"]);
}

#[test]
fn test_slice_on_boolean() {
    assert_eq!(
        check("`true` | [1:10]"),
        vec!["[DANGER] Slice performed on boolean (1:10)"]
    );
    assert_clean(&["`[]` | [1:10]", "[::-1]"]);
}

#[test]
fn test_zero_slice_step() {
    assert_eq!(
        check("foo[::0]"),
        vec!["[ERROR] invalid value: slice step cannot be 0 (1:4)"]
    );
}

// ============================================================================
// Logical Operators
// ============================================================================

#[test]
fn test_expression_ref_body_is_checked() {
    assert_eq!(
        check("&(`true` | foo)"),
        vec!["[DANGER] Object field 'foo' extraction performed on boolean (1:12)"]
    );
}

#[test]
fn test_and_or_operands_are_checked() {
    let cases = [
        ("(`true` | foo) && baz", "(1:11)"),
        ("foo && (`true` | foo)", "(1:18)"),
        ("(`true` | foo) || baz", "(1:11)"),
        ("foo || (`true` | foo)", "(1:18)"),
    ];
    for (expression, position) in cases {
        assert_eq!(
            check(expression),
            vec![format!("[DANGER] Object field 'foo' extraction performed on boolean {position}")],
            "Failed for input: {expression}"
        );
    }
}

#[test]
fn test_not_operand_is_checked() {
    assert_eq!(
        check("`true` | !foo"),
        vec!["[DANGER] Object field 'foo' extraction performed on boolean (1:11)"]
    );
    assert_clean(&[r#"`{"foo": true}` | !foo"#, "`true` && `true` == `true`"]);
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_filter_on_boolean() {
    assert_eq!(
        check("`true` | [?baz == bar]"),
        vec!["[DANGER] Filter projection performed on boolean (1:10)"]
    );
}

#[test]
fn test_filter_right_side_is_checked() {
    assert_eq!(
        check("[?baz == bar].[`true` | bam]"),
        vec!["[DANGER] Object field 'bam' extraction performed on boolean (1:25)"]
    );
}

#[test]
fn test_filter_condition_is_checked() {
    assert_eq!(
        check("[?(`true` | baz) == bar]"),
        vec!["[DANGER] Object field 'baz' extraction performed on boolean (1:13)"]
    );
}

#[test]
fn test_filter_against_sample_shape() {
    let sample = Value::from(json!({"people": [{"name": "a", "age": 30}]}));
    let context = Shape::of_value(&sample);
    assert_eq!(
        check_with("people[?age > `20`].nmae", &context),
        vec!["[DANGER] Object field 'nmae' does not exist in object with properties [age, name] (1:21)"]
    );
    assert_eq!(check_with("people[?age > `20`].name", &context), Vec::<String>::new());
}

// ============================================================================
// Comparators
// ============================================================================

#[test]
fn test_ordering_comparator_on_boolean() {
    assert_eq!(
        check("`true` < `false`"),
        vec!["[WARNING] Invalid comparator '<' for boolean (1:8)"]
    );
    assert_clean(&["`true` == `false`", "`1` < `2`", "foo < bar"]);
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_unknown_function() {
    assert_eq!(
        check("does_not_exist(@)"),
        vec!["[ERROR] unknown function 'does_not_exist' (1:1)"]
    );
}

#[test]
fn test_wrong_arity() {
    assert_eq!(check("length(@, @)"), vec!["[ERROR] length() takes 1 argument, got 2 (1:1)"]);
    assert_eq!(check("length()"), vec!["[ERROR] length() takes 1 argument, got 0 (1:1)"]);
}

#[test]
fn test_arguments_of_unknown_shape_are_clean() {
    assert_clean(&[
        "length(@)",
        "starts_with(@, @)",
        "ends_with(@, @)",
        "avg(@)",
        "length(a || b)",
        "length(a && b)",
        "length(a || `true`)",
        "not_null(@, @, @, @, @)",
    ]);
}

#[test]
fn test_static_arguments_of_the_right_type() {
    assert_clean(&[
        "length('foo')",
        "starts_with('foo', 'f')",
        "ends_with('foo', 'o')",
        "avg(`[10, 15]`)",
    ]);
}

#[test]
fn test_static_arguments_of_the_wrong_type() {
    assert_eq!(
        check("length(`true`)"),
        vec!["[ERROR] length() argument 1: expected string, array or object, found boolean (1:8)"]
    );
    assert_eq!(
        check("starts_with(`true`, `false`)"),
        vec![
            "[ERROR] starts_with() argument 1: expected string, found boolean (1:13)",
            "[ERROR] starts_with() argument 2: expected string, found boolean (1:21)",
        ]
    );
    assert_eq!(
        check("avg(`true`)"),
        vec!["[ERROR] avg() argument 1: expected array of number, found boolean (1:5)"]
    );
    assert_eq!(
        check(r#"avg(`["a", false]`)"#),
        vec!["[ERROR] avg() argument 1: expected array of number, found array (1:5)"]
    );
}

#[test]
fn test_argument_shapes_follow_the_context() {
    assert_eq!(
        check(r#"`{"foo": true}`.length(foo)"#),
        vec!["[ERROR] length() argument 1: expected string, array or object, found boolean (1:24)"]
    );
    assert_eq!(
        check(r#"`{"foo": true}` | floor(@)"#),
        vec!["[ERROR] floor() argument 1: expected number, found object (1:25)"]
    );
    // `&&` takes the right side once the left side is known to be truthy
    assert_eq!(
        check("length(`1` && `true`)"),
        vec!["[ERROR] length() argument 1: expected string, array or object, found boolean (1:12)"]
    );
}

#[test]
fn test_flattened_elements_are_typed() {
    assert_clean(&[r#"`[null, "hello", null, "goodbye"]`[] | length([0]) || length([1])"#]);
    assert_eq!(
        check("`[null, true]` | length([0]) || length([1])"),
        vec![
            "[ERROR] length() argument 1: expected string, array or object, found null (1:25)",
            "[ERROR] length() argument 1: expected string, array or object, found boolean (1:40)",
        ]
    );
}

#[test]
fn test_non_convergence_is_an_error() {
    assert_eq!(
        check_with("fold_left(`[]`, &[acc], @)", &Shape::array(Shape::Number)),
        vec!["[ERROR] type inference did not converge after 64 iterations (1:1)"]
    );
}

// ============================================================================
// Problems
// ============================================================================

#[test]
fn test_problem_fields() {
    let problems = lint(&parse("`true` < `false` || `[1]`.baz").unwrap(), &Shape::Any);
    let found: Vec<(Severity, usize)> = problems
        .iter()
        .map(|p| (p.severity, p.position.column))
        .collect();
    assert_eq!(found, vec![(Severity::Warning, 8), (Severity::Danger, 27)]);
    assert!(Severity::Error < Severity::Danger && Severity::Danger < Severity::Warning);
}

#[test]
fn test_lint_shorthand() {
    let expr = parse("`[1]`.baz").unwrap();
    assert_eq!(expr.lint(&Shape::Any), lint(&expr, &Shape::Any));
}
