//! Static checks of an expression against the shape of its input.
//!
//! [`lint`] walks an expression the way abstract evaluation does, but it
//! does not stop at the first failure. Every step that can only fail,
//! always yields null, or compares values that have no order is reported
//! as a [`Problem`] at the position of the offending expression.
//!
//! ```
//! use jmespath_lang::{lint, parse};
//! use jmespath_lang::runtime::Shape;
//!
//! let expr = parse("`true` | [foo, length(@)]").unwrap();
//! let problems: Vec<String> = lint(&expr, &Shape::Any).iter().map(ToString::to_string).collect();
//! assert_eq!(
//!     problems,
//!     vec![
//!         "[DANGER] Object field 'foo' extraction performed on boolean (1:11)",
//!         "[ERROR] length() argument 1: expected string, array or object, found boolean (1:23)",
//!     ]
//! );
//! ```
use std::{fmt, mem};

use tracing::debug;

use crate::{
    ast::{Binary, ComparatorType, ExprKind, Expression, ExpressionVisitor},
    evaluator::{EvalError, Evaluator},
    functions::FunctionArgument,
    lexer::Position,
    runtime::{Elements, Runtime, RuntimeType, Shape, ShapeRuntime, Truth},
    value::Value,
};

/// How bad a [`Problem`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Evaluation fails whenever it gets here
    Error,
    /// Always null or empty here, almost certainly a mistake
    Danger,
    /// Legal but never useful
    Warning,
}

impl Severity {
    pub fn name(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Danger => "DANGER",
            Severity::Warning => "WARNING",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A finding of [`lint`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Problem {
    pub severity: Severity,
    pub message: String,
    pub position: Position,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}:{})",
            self.severity, self.message, self.position.line, self.position.column
        )
    }
}

/// Check `expr` against input of shape `context`.
///
/// Problems come back in the order the walk finds them, each reported once.
/// Expression references are checked against any input, since what they
/// are applied to is up to the function receiving them.
pub fn lint(expr: &Expression, context: &Shape) -> Vec<Problem> {
    let mut linter = Linter {
        evaluator: Evaluator::new(&ShapeRuntime),
        current: context.clone(),
        problems: Vec::new(),
    };
    expr.accept(&mut linter);
    debug!(problems = linter.problems.len(), "linted");
    linter.problems
}

impl Expression {
    /// Shorthand for [`lint`].
    pub fn lint(&self, context: &Shape) -> Vec<Problem> {
        lint(self, context)
    }
}

struct Linter<'r> {
    evaluator: Evaluator<'r, ShapeRuntime>,
    current: Shape,
    problems: Vec<Problem>,
}

impl<'r> Linter<'r> {
    fn runtime(&self) -> &'r ShapeRuntime {
        self.evaluator.runtime()
    }

    /// Walk `expr` with `context` as the current node.
    fn check(&mut self, expr: &Expression, context: &Shape) -> Shape {
        let saved = mem::replace(&mut self.current, context.clone());
        let shape = expr.accept(self);
        self.current = saved;
        shape
    }

    /// Walk `expr` once per context, or once against anything when there
    /// are none.
    fn check_each(&mut self, expr: &Expression, contexts: &[Shape]) {
        if contexts.is_empty() {
            self.check(expr, &Shape::Any);
        }
        for context in contexts {
            self.check(expr, context);
        }
    }

    /// What `expr` evaluates to from the current node.
    fn result(&self, expr: &Expression) -> Shape {
        self.evaluator.evaluate(expr, &self.current).unwrap_or(Shape::Any)
    }

    fn report(&mut self, severity: Severity, expr: &Expression, message: String) {
        let problem = Problem {
            severity,
            message,
            position: expr.position,
        };
        if !self.problems.contains(&problem) {
            self.problems.push(problem);
        }
    }

    fn is_never(&self, shape: &Shape, ty: RuntimeType) -> bool {
        self.runtime().classify(shape, ty) == Truth::False
    }

    fn is_unordered(&self, shape: &Shape) -> bool {
        self.is_never(shape, RuntimeType::Number) && self.is_never(shape, RuntimeType::String)
    }
}

fn element_shapes(elements: Elements<Shape>) -> Vec<Shape> {
    match elements {
        Elements::Known(items) => items,
        Elements::Repeated(item) => vec![item],
    }
}

/// Type names of a shape's members, such as `null | array`.
fn describe(shape: &Shape) -> String {
    let mut names: Vec<&str> = Vec::new();
    for member in shape.members() {
        let name = ShapeRuntime.type_of(member).name();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names.join(" | ")
}

impl ExpressionVisitor<Shape> for Linter<'_> {
    fn visit_field(&mut self, expr: &Expression, name: &str) -> Shape {
        let message = match &self.current {
            Shape::Record(fields) if !fields.contains_key(name) => {
                let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
                Some(format!(
                    "Object field '{name}' does not exist in object with properties [{}]",
                    keys.join(", ")
                ))
            }
            current if self.is_never(current, RuntimeType::Object) => {
                Some(format!("Object field '{name}' extraction performed on {}", describe(current)))
            }
            _ => None,
        };
        if let Some(message) = message {
            self.report(Severity::Danger, expr, message);
        }
        self.runtime().field(&self.current, name)
    }

    fn visit_index(&mut self, expr: &Expression, index: i64) -> Shape {
        if self.is_never(&self.current, RuntimeType::Array) {
            let message = format!("Array index '{index}' extraction performed on {}", describe(&self.current));
            self.report(Severity::Danger, expr, message);
        }
        self.runtime().element(&self.current, index)
    }

    fn visit_slice(&mut self, expr: &Expression, start: Option<i64>, stop: Option<i64>, step: i64) -> Shape {
        if step == 0 {
            let error = EvalError::InvalidValue("slice step cannot be 0".to_string());
            self.report(Severity::Error, expr, error.to_string());
            return Shape::Any;
        }
        if self.is_never(&self.current, RuntimeType::Array) {
            let message = format!("Slice performed on {}", describe(&self.current));
            self.report(Severity::Danger, expr, message);
        }
        self.runtime().slice(&self.current, start, stop, step)
    }

    fn visit_flatten(&mut self, expr: &Expression, inner: &Expression) -> Shape {
        let value = inner.accept(self);
        if self.is_never(&value, RuntimeType::Array) {
            let message = format!("Array flatten performed on {}", describe(&value));
            self.report(Severity::Danger, expr, message);
        }
        self.result(expr)
    }

    fn visit_projection(&mut self, expr: &Expression, operands: &Binary) -> Shape {
        let left = operands.left.accept(self);
        // slices and flattens report their own input
        let projects_itself = matches!(operands.left.kind, ExprKind::Slice { .. } | ExprKind::Flatten(_));

        if self.is_never(&left, RuntimeType::Array) {
            if !projects_itself {
                let message = format!("Array projection performed on {}", describe(&left));
                self.report(Severity::Danger, expr, message);
            }
            self.check(&operands.right, &Shape::Any);
        } else {
            let elements = element_shapes(self.runtime().iterate(&left));
            self.check_each(&operands.right, &elements);
        }
        self.result(expr)
    }

    fn visit_object_projection(&mut self, expr: &Expression, operands: &Binary) -> Shape {
        let left = operands.left.accept(self);

        if self.is_never(&left, RuntimeType::Object) {
            let message = format!("Object projection performed on {}", describe(&left));
            self.report(Severity::Danger, expr, message);
            self.check(&operands.right, &Shape::Any);
        } else {
            let members: Vec<Shape> = element_shapes(self.runtime().iterate_values(&left))
                .into_iter()
                .filter(|member| self.runtime().classify(member, RuntimeType::Null) != Truth::True)
                .collect();
            self.check_each(&operands.right, &members);
        }
        self.result(expr)
    }

    fn visit_filter_projection(&mut self, expr: &Expression, operands: &Binary, condition: &Expression) -> Shape {
        let left = operands.left.accept(self);

        let elements = if self.is_never(&left, RuntimeType::Array) {
            let message = format!("Filter projection performed on {}", describe(&left));
            self.report(Severity::Danger, expr, message);
            vec![Shape::Any]
        } else {
            match element_shapes(self.runtime().iterate(&left)) {
                elements if elements.is_empty() => vec![Shape::Any],
                elements => elements,
            }
        };

        for element in &elements {
            let matched = self.check(condition, element);
            if self.runtime().truthiness(&matched) != Truth::False {
                self.check(&operands.right, element);
            }
        }
        self.result(expr)
    }

    fn visit_pipe(&mut self, _expr: &Expression, operands: &Binary) -> Shape {
        let left = operands.left.accept(self);
        self.check(&operands.right, &left)
    }

    fn visit_subexpression(&mut self, _expr: &Expression, operands: &Binary) -> Shape {
        let left = operands.left.accept(self);
        let right = self.check(&operands.right, &left);
        self.evaluator
            .branch(
                self.runtime().classify(&left, RuntimeType::Null),
                || Ok(Shape::Null),
                || Ok(right.clone()),
            )
            .unwrap_or(Shape::Any)
    }

    fn visit_multi_select_list(&mut self, expr: &Expression, items: &[Expression]) -> Shape {
        for item in items {
            item.accept(self);
        }
        self.result(expr)
    }

    fn visit_multi_select_hash(&mut self, expr: &Expression, entries: &[(String, Expression)]) -> Shape {
        for (_, value) in entries {
            value.accept(self);
        }
        self.result(expr)
    }

    fn visit_and(&mut self, expr: &Expression, operands: &Binary) -> Shape {
        operands.left.accept(self);
        operands.right.accept(self);
        self.result(expr)
    }

    fn visit_or(&mut self, expr: &Expression, operands: &Binary) -> Shape {
        operands.left.accept(self);
        operands.right.accept(self);
        self.result(expr)
    }

    fn visit_not(&mut self, expr: &Expression, inner: &Expression) -> Shape {
        inner.accept(self);
        self.result(expr)
    }

    fn visit_comparison(&mut self, expr: &Expression, comparator: ComparatorType, operands: &Binary) -> Shape {
        let left = operands.left.accept(self);
        let right = operands.right.accept(self);

        if !matches!(comparator, ComparatorType::Equal | ComparatorType::NotEqual) {
            for side in [&left, &right] {
                if self.is_unordered(side) {
                    let message = format!("Invalid comparator '{comparator}' for {}", describe(side));
                    self.report(Severity::Warning, expr, message);
                }
            }
        }
        self.runtime().comparison(comparator, &left, &right)
    }

    fn visit_current(&mut self, _expr: &Expression) -> Shape {
        self.current.clone()
    }

    fn visit_literal(&mut self, _expr: &Expression, value: &Value) -> Shape {
        self.runtime().create_literal(value)
    }

    fn visit_raw_string(&mut self, _expr: &Expression, value: &str) -> Shape {
        self.runtime().create_string(value)
    }

    fn visit_function(&mut self, expr: &Expression, name: &str, args: &[Expression]) -> Shape {
        let mut arguments = Vec::with_capacity(args.len());
        for arg in args {
            arguments.push(match &arg.kind {
                ExprKind::ExpressionRef(inner) => {
                    self.check(inner, &Shape::Any);
                    FunctionArgument::Expression(inner.as_ref())
                }
                _ => FunctionArgument::Value(arg.accept(self)),
            });
        }

        let Some(signature) = self.evaluator.functions().get(name).map(|f| f.signature()) else {
            let error = EvalError::UnknownFunction { name: name.to_string() };
            self.report(Severity::Error, expr, error.to_string());
            return Shape::Any;
        };
        let fallback = self.runtime().create_any(signature.returns());

        if !signature.accepts_count(arguments.len()) {
            let error = EvalError::Arity {
                function: name.to_string(),
                expected: signature.describe_arity(),
                actual: arguments.len(),
            };
            self.report(Severity::Error, expr, error.to_string());
            return fallback;
        }

        let mut well_typed = true;
        for (index, (arg, argument)) in args.iter().zip(&arguments).enumerate() {
            let Some(expected) = signature.param(index) else {
                continue;
            };
            if self.evaluator.accepts(expected, argument) {
                continue;
            }
            well_typed = false;
            let found = match argument {
                FunctionArgument::Value(shape) => describe(shape),
                FunctionArgument::Expression(_) => RuntimeType::Expression.name().to_string(),
            };
            let message = format!("{name}() argument {}: expected {expected}, found {found}", index + 1);
            self.report(Severity::Error, arg, message);
        }
        if !well_typed {
            return fallback;
        }

        match self.evaluator.evaluate(expr, &self.current) {
            Ok(shape) => shape,
            Err(error) => {
                // failures inside the arguments were reported where they happened
                if error.position() == Some(expr.position) {
                    self.report(Severity::Error, expr, error.kind().to_string());
                }
                fallback
            }
        }
    }

    fn visit_expression_ref(&mut self, _expr: &Expression, inner: &Expression) -> Shape {
        inner.accept(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_describe_union() {
        assert_eq!(describe(&Shape::Null.union(Shape::array(Shape::Number))), "null | array");
        assert_eq!(describe(&Shape::Boolean), "boolean");
        assert_eq!(describe(&Shape::Any), "any");
    }

    #[test]
    fn test_problem_display() {
        let problems = lint(&parse("nope()").unwrap(), &Shape::Any);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].to_string(), "[ERROR] unknown function 'nope' (1:1)");
    }
}
