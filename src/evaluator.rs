use std::{ops::Deref, sync::Arc};

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast::{ExprKind, Expression},
    functions::{ArgType, FunctionArgument, FunctionRegistry, Signature},
    lexer::Position,
    runtime::{ArrayBuilder, Elements, ObjectBuilder, Runtime, RuntimeType, Shape, ShapeRuntime, Truth},
};

/// Errors that can occur while evaluating an expression.
///
/// Missing fields, out-of-range indices and projections over the wrong kind
/// of value are not errors; they evaluate to null. Only broken function
/// contracts, invalid slice steps and abstract evaluation that never settles
/// end up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Call to a function the registry does not know
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    /// Too few or too many arguments
    #[error("{function}() takes {expected}, got {actual}")]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Argument of the wrong type; `argument` counts from 1
    #[error("{function}() argument {argument}: expected {expected}, found {actual}")]
    InvalidType {
        function: String,
        argument: usize,
        expected: String,
        actual: RuntimeType,
    },

    /// A value of the right type that cannot be used, such as a zero slice step
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Abstract evaluation of a fold kept widening
    #[error("type inference did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    /// Any of the above, located at the expression that raised it
    #[error("{error} at {position}")]
    At { position: Position, error: Box<EvalError> },
}

impl EvalError {
    /// Attach a source position, unless a more precise one is already there.
    pub fn at(self, position: Position) -> Self {
        match self {
            located @ EvalError::At { .. } => located,
            error => EvalError::At {
                position,
                error: Box::new(error),
            },
        }
    }

    /// The error without its location.
    pub fn kind(&self) -> &EvalError {
        match self {
            EvalError::At { error, .. } => error.kind(),
            error => error,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            EvalError::At { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Tuning knobs for an [`Evaluator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// How many widening rounds a fold over an unknown number of elements
    /// may take before abstract evaluation gives up with
    /// [`EvalError::NonConvergence`]
    pub max_fixed_point_iterations: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            max_fixed_point_iterations: 64,
        }
    }
}

/// Walks an [`Expression`] against a document through a [`Runtime`].
///
/// The same walk serves concrete and abstract runtimes. Decisions the
/// runtime cannot make (`Truth::Unknown`) follow both branches and join the
/// results with [`Runtime::either`]; iteration over an unknown number of
/// elements runs to a fixed point (see [`Evaluator::fold_left`]).
///
/// # Examples
///
/// ```
/// use jmespath_lang::{Evaluator, Value, parse};
/// use jmespath_lang::runtime::ValueRuntime;
///
/// let expr = parse("foo[?bar > `1`].bar").unwrap();
/// let doc = Value::from(serde_json::json!({"foo": [{"bar": 1}, {"bar": 2}]}));
///
/// let result = Evaluator::new(&ValueRuntime).evaluate(&expr, &doc).unwrap();
/// assert_eq!(result, Value::Array(vec![Value::Integer(2)]));
/// ```
pub struct Evaluator<'r, R: Runtime> {
    runtime: &'r R,
    functions: Functions<'r, R>,
    options: EvalOptions,
}

enum Functions<'r, R: Runtime> {
    Shared(Arc<FunctionRegistry<R>>),
    Borrowed(&'r FunctionRegistry<R>),
}

impl<R: Runtime> Deref for Functions<'_, R> {
    type Target = FunctionRegistry<R>;

    fn deref(&self) -> &FunctionRegistry<R> {
        match self {
            Functions::Shared(registry) => registry,
            Functions::Borrowed(registry) => registry,
        }
    }
}

impl<'r, R: Runtime + 'static> Evaluator<'r, R> {
    /// An evaluator with the built-in functions.
    ///
    /// The function table is built once per runtime type and shared, so
    /// creating evaluators is cheap.
    pub fn new(runtime: &'r R) -> Self {
        Evaluator {
            runtime,
            functions: Functions::Shared(FunctionRegistry::shared()),
            options: EvalOptions::default(),
        }
    }
}

impl<'r, R: Runtime> Evaluator<'r, R> {
    /// An evaluator with a caller-supplied function table.
    pub fn with_functions(runtime: &'r R, functions: &'r FunctionRegistry<R>) -> Self {
        Evaluator {
            runtime,
            functions: Functions::Borrowed(functions),
            options: EvalOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn runtime(&self) -> &'r R {
        self.runtime
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    pub fn functions(&self) -> &FunctionRegistry<R> {
        &self.functions
    }

    /// Evaluate `expr` with `current` as the current node.
    pub fn evaluate(&self, expr: &Expression, current: &R::Value) -> Result<R::Value, EvalError> {
        let rt = self.runtime;

        match &expr.kind {
            ExprKind::Field(name) => Ok(rt.field(current, name)),
            ExprKind::Index(index) => Ok(rt.element(current, *index)),
            ExprKind::Slice { start, stop, step } => {
                if *step == 0 {
                    return Err(EvalError::InvalidValue("slice step cannot be 0".to_string()).at(expr.position));
                }
                Ok(rt.slice(current, *start, *stop, *step))
            }
            ExprKind::Flatten(inner) => {
                let value = self.evaluate(inner, current)?;
                self.when_type(&value, RuntimeType::Array, || self.flatten(rt.iterate(&value)))
            }
            ExprKind::Projection(operands) => {
                let left = self.evaluate(&operands.left, current)?;
                self.when_type(&left, RuntimeType::Array, || {
                    self.project(rt.iterate(&left), &operands.right)
                })
            }
            ExprKind::ObjectProjection(operands) => {
                let left = self.evaluate(&operands.left, current)?;
                self.when_type(&left, RuntimeType::Object, || {
                    self.project_members(rt.iterate_values(&left), &operands.right)
                })
            }
            ExprKind::FilterProjection { operands, condition } => {
                let left = self.evaluate(&operands.left, current)?;
                self.when_type(&left, RuntimeType::Array, || {
                    self.filter(rt.iterate(&left), condition, &operands.right)
                })
            }
            ExprKind::Pipe(operands) => {
                let left = self.evaluate(&operands.left, current)?;
                self.evaluate(&operands.right, &left)
            }
            ExprKind::Subexpression(operands) => {
                let left = self.evaluate(&operands.left, current)?;
                self.branch(
                    rt.classify(&left, RuntimeType::Null),
                    || Ok(rt.create_null()),
                    || self.evaluate(&operands.right, &left),
                )
            }
            ExprKind::MultiSelectList(items) => self.branch(
                rt.classify(current, RuntimeType::Null),
                || Ok(rt.create_null()),
                || {
                    let mut builder = rt.array_builder();
                    for item in items {
                        builder.add(self.evaluate(item, current)?);
                    }
                    Ok(builder.build())
                },
            ),
            ExprKind::MultiSelectHash(entries) => self.branch(
                rt.classify(current, RuntimeType::Null),
                || Ok(rt.create_null()),
                || {
                    let mut builder = rt.object_builder();
                    for (key, value) in entries {
                        builder.put(key.clone(), self.evaluate(value, current)?);
                    }
                    Ok(builder.build())
                },
            ),
            ExprKind::And(operands) => {
                let left = self.evaluate(&operands.left, current)?;
                self.branch(
                    rt.truthiness(&left),
                    || self.evaluate(&operands.right, current),
                    || Ok(left.clone()),
                )
            }
            ExprKind::Or(operands) => {
                let left = self.evaluate(&operands.left, current)?;
                self.branch(
                    rt.truthiness(&left),
                    || Ok(left.clone()),
                    || self.evaluate(&operands.right, current),
                )
            }
            ExprKind::Not(inner) => {
                let value = self.evaluate(inner, current)?;
                Ok(match rt.truthiness(&value) {
                    Truth::True => rt.create_boolean(false),
                    Truth::False => rt.create_boolean(true),
                    Truth::Unknown => rt.create_any(RuntimeType::Boolean),
                })
            }
            ExprKind::Comparison { comparator, operands } => {
                let left = self.evaluate(&operands.left, current)?;
                let right = self.evaluate(&operands.right, current)?;
                Ok(rt.comparison(*comparator, &left, &right))
            }
            ExprKind::Current => Ok(current.clone()),
            ExprKind::Literal(value) => Ok(rt.create_literal(value)),
            ExprKind::RawString(value) => Ok(rt.create_string(value)),
            ExprKind::Function { name, args } => self.call(expr, name, args, current),
            // only meaningful as a function argument; elsewhere it is its body
            ExprKind::ExpressionRef(inner) => self.evaluate(inner, current),
        }
    }

    /// Take `then` when `truth` holds and `otherwise` when it does not.
    ///
    /// When the runtime cannot tell, both run and their results are joined
    /// with [`Runtime::either`].
    pub fn branch(
        &self,
        truth: Truth,
        then: impl FnOnce() -> Result<R::Value, EvalError>,
        otherwise: impl FnOnce() -> Result<R::Value, EvalError>,
    ) -> Result<R::Value, EvalError> {
        match truth {
            Truth::True => then(),
            Truth::False => otherwise(),
            Truth::Unknown => {
                let a = then()?;
                let b = otherwise()?;
                Ok(self.runtime.either(&a, &b))
            }
        }
    }

    /// Left fold of `folder` over `elements`, starting from `init`.
    ///
    /// Known elements are folded one by one. A repeated element stands for
    /// any number of them, so the accumulator is widened with
    /// `either(acc, folder(acc, element))` until it stops changing. Zero
    /// iterations are covered because the initial value stays part of the
    /// union.
    ///
    /// # Errors
    ///
    /// [`EvalError::NonConvergence`] when the accumulator is still changing
    /// after [`EvalOptions::max_fixed_point_iterations`] rounds, plus
    /// whatever `folder` returns.
    pub fn fold_left<F>(&self, init: R::Value, elements: Elements<R::Value>, mut folder: F) -> Result<R::Value, EvalError>
    where
        F: FnMut(&R::Value, &R::Value) -> Result<R::Value, EvalError>,
    {
        match elements {
            Elements::Known(items) => items.iter().try_fold(init, |acc, item| folder(&acc, item)),
            Elements::Repeated(item) => {
                let limit = self.options.max_fixed_point_iterations;
                let mut acc = init;
                for iteration in 1..=limit {
                    let step = folder(&acc, &item)?;
                    let next = self.runtime.either(&acc, &step);
                    trace!(iteration, ?next, "fixed-point iteration");
                    if next == acc {
                        debug!(iterations = iteration, "fixed point reached");
                        return Ok(acc);
                    }
                    acc = next;
                }
                debug!(limit, "fixed point not reached");
                Err(EvalError::NonConvergence { iterations: limit })
            }
        }
    }

    /// `array` with `value` appended.
    pub fn append(&self, array: &R::Value, value: R::Value) -> R::Value {
        let mut builder = self.runtime.array_builder();
        builder.add_all(array.clone());
        builder.add(value);
        builder.build()
    }

    /// Map `f` over `elements` into a new array.
    pub fn map_elements<F>(&self, elements: Elements<R::Value>, mut f: F) -> Result<R::Value, EvalError>
    where
        F: FnMut(&R::Value) -> Result<R::Value, EvalError>,
    {
        match elements {
            Elements::Known(items) => {
                let mut builder = self.runtime.array_builder();
                for item in &items {
                    builder.add(f(item)?);
                }
                Ok(builder.build())
            }
            repeated => {
                let empty = self.runtime.array_builder().build();
                self.fold_left(empty, repeated, |acc, item| Ok(self.append(acc, f(item)?)))
            }
        }
    }

    fn when_type(
        &self,
        value: &R::Value,
        ty: RuntimeType,
        then: impl FnOnce() -> Result<R::Value, EvalError>,
    ) -> Result<R::Value, EvalError> {
        self.branch(self.runtime.classify(value, ty), then, || Ok(self.runtime.create_null()))
    }

    fn flatten(&self, elements: Elements<R::Value>) -> Result<R::Value, EvalError> {
        let rt = self.runtime;
        match elements {
            Elements::Known(items) if !rt.is_abstract() => {
                let mut builder = rt.array_builder();
                for item in items {
                    builder.add_all(item);
                }
                Ok(builder.build())
            }
            elements => self.fold_left(rt.array_builder().build(), elements, |acc, item| {
                let mut builder = rt.array_builder();
                builder.add_all(acc.clone());
                builder.add_all(item.clone());
                Ok(builder.build())
            }),
        }
    }

    /// Evaluate `right` per element, dropping null results.
    fn project(&self, elements: Elements<R::Value>, right: &Expression) -> Result<R::Value, EvalError> {
        let rt = self.runtime;
        match elements {
            Elements::Known(items) if !rt.is_abstract() => {
                let mut builder = rt.array_builder();
                for item in &items {
                    let value = self.evaluate(right, item)?;
                    if !rt.is(&value, RuntimeType::Null) {
                        builder.add(value);
                    }
                }
                Ok(builder.build())
            }
            elements => self.fold_left(rt.array_builder().build(), elements, |acc, item| {
                self.project_one(acc, right, item)
            }),
        }
    }

    /// Like [`project`](Self::project), but null members are skipped
    /// before `right` sees them.
    fn project_members(&self, members: Elements<R::Value>, right: &Expression) -> Result<R::Value, EvalError> {
        let rt = self.runtime;
        match members {
            Elements::Known(items) if !rt.is_abstract() => {
                let present = items.into_iter().filter(|item| !rt.is(item, RuntimeType::Null)).collect();
                self.project(Elements::Known(present), right)
            }
            members => self.fold_left(rt.array_builder().build(), members, |acc, item| {
                self.branch(
                    rt.classify(item, RuntimeType::Null),
                    || Ok(acc.clone()),
                    || self.project_one(acc, right, item),
                )
            }),
        }
    }

    fn filter(
        &self,
        elements: Elements<R::Value>,
        condition: &Expression,
        right: &Expression,
    ) -> Result<R::Value, EvalError> {
        let rt = self.runtime;
        match elements {
            Elements::Known(items) if !rt.is_abstract() => {
                let mut builder = rt.array_builder();
                for item in &items {
                    if !rt.is_truthy(&self.evaluate(condition, item)?) {
                        continue;
                    }
                    let value = self.evaluate(right, item)?;
                    if !rt.is(&value, RuntimeType::Null) {
                        builder.add(value);
                    }
                }
                Ok(builder.build())
            }
            elements => self.fold_left(rt.array_builder().build(), elements, |acc, item| {
                let matched = self.evaluate(condition, item)?;
                self.branch(
                    rt.truthiness(&matched),
                    || self.project_one(acc, right, item),
                    || Ok(acc.clone()),
                )
            }),
        }
    }

    fn project_one(&self, acc: &R::Value, right: &Expression, item: &R::Value) -> Result<R::Value, EvalError> {
        let value = self.evaluate(right, item)?;
        self.branch(
            self.runtime.classify(&value, RuntimeType::Null),
            || Ok(acc.clone()),
            || Ok(self.append(acc, value.clone())),
        )
    }

    fn call(
        &self,
        expr: &Expression,
        name: &str,
        args: &[Expression],
        current: &R::Value,
    ) -> Result<R::Value, EvalError> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| EvalError::UnknownFunction { name: name.to_string() }.at(expr.position))?;

        let mut arguments = Vec::with_capacity(args.len());
        for arg in args {
            arguments.push(match &arg.kind {
                ExprKind::ExpressionRef(inner) => FunctionArgument::Expression(inner),
                _ => FunctionArgument::Value(self.evaluate(arg, current)?),
            });
        }

        self.check_arguments(name, &function.signature(), &arguments)
            .map_err(|e| e.at(expr.position))?;

        trace!(function = name, arguments = arguments.len(), "calling function");
        let result = if self.runtime.is_abstract() {
            function.apply_abstract(self, &arguments)
        } else {
            function.apply(self, &arguments)
        };
        result.map_err(|e| e.at(expr.position))
    }

    fn check_arguments(
        &self,
        name: &str,
        signature: &Signature,
        arguments: &[FunctionArgument<'_, R::Value>],
    ) -> Result<(), EvalError> {
        if !signature.accepts_count(arguments.len()) {
            return Err(EvalError::Arity {
                function: name.to_string(),
                expected: signature.describe_arity(),
                actual: arguments.len(),
            });
        }

        for (index, argument) in arguments.iter().enumerate() {
            let Some(expected) = signature.param(index) else {
                continue;
            };
            if !self.accepts(expected, argument) {
                return Err(EvalError::InvalidType {
                    function: name.to_string(),
                    argument: index + 1,
                    expected: expected.to_string(),
                    actual: match argument {
                        FunctionArgument::Value(value) => self.runtime.type_of(value),
                        FunctionArgument::Expression(_) => RuntimeType::Expression,
                    },
                });
            }
        }
        Ok(())
    }

    /// Whether `argument` may be of type `expected`; abstract runtimes only
    /// reject arguments that definitely do not match.
    pub(crate) fn accepts(&self, expected: &ArgType, argument: &FunctionArgument<'_, R::Value>) -> bool {
        let value = match (expected, argument) {
            (ArgType::Expression, FunctionArgument::Expression(_)) => return true,
            (ArgType::Expression, _) | (_, FunctionArgument::Expression(_)) => return false,
            (_, FunctionArgument::Value(value)) => value,
        };
        let possibly = |value: &R::Value, ty: RuntimeType| self.runtime.classify(value, ty) != Truth::False;

        match expected {
            ArgType::Any => true,
            ArgType::Type(ty) => possibly(value, *ty),
            ArgType::OneOf(types) => types.iter().any(|ty| possibly(value, *ty)),
            ArgType::ArrayOf(types) => {
                let element_matches = |item: &R::Value| types.iter().any(|ty| possibly(item, *ty));
                possibly(value, RuntimeType::Array)
                    && match self.runtime.iterate(value) {
                        Elements::Known(items) => items.iter().all(element_matches),
                        Elements::Repeated(item) => element_matches(&item),
                    }
            }
            ArgType::Expression => false,
        }
    }
}

impl Expression {
    /// Evaluate against a document with the built-in functions.
    ///
    /// # Examples
    ///
    /// ```
    /// use jmespath_lang::parse;
    /// use jmespath_lang::runtime::JsonRuntime;
    /// use serde_json::json;
    ///
    /// let expr = parse("foo.bar").unwrap();
    /// let result = expr.evaluate(&json!({"foo": {"bar": 5}}), &JsonRuntime).unwrap();
    /// assert_eq!(result, json!(5));
    /// ```
    pub fn evaluate<R: Runtime + 'static>(&self, current: &R::Value, runtime: &R) -> Result<R::Value, EvalError> {
        Evaluator::new(runtime).evaluate(self, current)
    }

    /// Infer the shape of the result from the shape of the input.
    ///
    /// # Examples
    ///
    /// ```
    /// use jmespath_lang::parse;
    /// use jmespath_lang::runtime::Shape;
    ///
    /// let expr = parse("length(@)").unwrap();
    /// assert_eq!(expr.infer(&Shape::String).unwrap(), Shape::Number);
    /// ```
    pub fn infer(&self, context: &Shape) -> Result<Shape, EvalError> {
        Evaluator::new(&ShapeRuntime).evaluate(self, context)
    }
}
