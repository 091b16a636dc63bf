//! # JMESPath - Functions
//!
//! Functions are looked up by name in a [`FunctionRegistry`] when a call is
//! evaluated. Each one declares a [`Signature`]; the evaluator checks arity
//! and argument types against it before the function runs, so
//! implementations can assume well-typed arguments.
//!
//! ## Concrete and abstract application
//!
//! [`Function::apply`] computes a result from real values.
//! [`Function::apply_abstract`] runs when the runtime is abstract and, unless
//! overridden, answers "any value of the declared return type". Functions
//! written purely in terms of the runtime and the evaluator's
//! [`branch`](crate::Evaluator::branch) / [`fold_left`](crate::Evaluator::fold_left)
//! helpers work in both modes and simply forward one to the other.
//!
//! ## Extending
//!
//! ```
//! use jmespath_lang::functions::{ArgType, Function, FunctionArgument, FunctionRegistry, Signature};
//! use jmespath_lang::runtime::{Runtime, RuntimeType, ValueRuntime};
//! use jmespath_lang::{EvalError, Evaluator, Value, parse};
//!
//! struct Answer;
//!
//! impl<R: Runtime> Function<R> for Answer {
//!     fn signature(&self) -> Signature {
//!         Signature::new(vec![], RuntimeType::Number)
//!     }
//!
//!     fn apply(&self, eval: &Evaluator<'_, R>, _args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, EvalError> {
//!         Ok(eval.runtime().create_literal(&Value::Integer(42)))
//!     }
//! }
//!
//! let mut functions = FunctionRegistry::builtin();
//! functions.register("answer", Answer);
//!
//! let expr = parse("answer()").unwrap();
//! let result = Evaluator::with_functions(&ValueRuntime, &functions).evaluate(&expr, &Value::Null);
//! assert_eq!(result, Ok(Value::Integer(42)));
//! ```
use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use tracing::debug;

use crate::{ast::Expression, evaluator::{EvalError, Evaluator}, runtime::Runtime};

pub mod builtins;
pub mod signature;

pub use signature::{ArgType, Signature};

/// A function call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionArgument<'a, V> {
    /// An evaluated argument
    Value(V),
    /// An expression reference (`&expr`), left for the function to evaluate
    /// with [`Evaluator::evaluate`]
    Expression(&'a Expression),
}

impl<'a, V> FunctionArgument<'a, V> {
    pub fn as_value(&self) -> Option<&V> {
        match self {
            FunctionArgument::Value(value) => Some(value),
            FunctionArgument::Expression(_) => None,
        }
    }

    pub fn as_expression(&self) -> Option<&'a Expression> {
        match self {
            FunctionArgument::Expression(expr) => Some(expr),
            FunctionArgument::Value(_) => None,
        }
    }
}

/// A callable function.
pub trait Function<R: Runtime>: Send + Sync {
    fn signature(&self) -> Signature;

    /// Compute the result from concrete arguments.
    fn apply(&self, eval: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, EvalError>;

    /// Compute the result when the runtime is abstract.
    fn apply_abstract(
        &self,
        eval: &Evaluator<'_, R>,
        args: &[FunctionArgument<'_, R::Value>],
    ) -> Result<R::Value, EvalError> {
        let _ = args;
        Ok(eval.runtime().create_any(self.signature().returns()))
    }
}

/// Name to function table.
///
/// Read-only once built. [`Evaluator::new`] uses the process-wide
/// [`FunctionRegistry::shared`] table; hosts with extra functions build one
/// registry and hand it to every evaluator with [`Evaluator::with_functions`].
pub struct FunctionRegistry<R: Runtime> {
    functions: HashMap<String, Arc<dyn Function<R>>>,
}

impl<R: Runtime> FunctionRegistry<R> {
    /// A registry with no functions at all.
    pub fn new() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    /// A registry with every built-in function.
    pub fn builtin() -> Self {
        let mut registry = FunctionRegistry::new();
        builtins::register_all(&mut registry);
        registry
    }

    /// Register `function` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, function: impl Function<R> + 'static) {
        self.functions.insert(name.into(), Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Function<R>> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

type SharedRegistries = Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

/// Built-in registries, one per runtime type.
static BUILTINS: OnceLock<SharedRegistries> = OnceLock::new();

impl<R: Runtime + 'static> FunctionRegistry<R> {
    /// The built-in registry for `R`, built on first use and shared by every
    /// [`Evaluator::new`] afterwards.
    pub fn shared() -> Arc<Self> {
        let mut registries = BUILTINS
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = registries.entry(TypeId::of::<R>()).or_insert_with(|| {
            debug!(runtime = type_name::<R>(), "built function registry");
            let registry: Arc<dyn Any + Send + Sync> = Arc::new(FunctionRegistry::<R>::builtin());
            registry
        });
        // keyed by R, so the downcast cannot miss
        Arc::clone(entry)
            .downcast::<Self>()
            .unwrap_or_else(|_| Arc::new(FunctionRegistry::builtin()))
    }
}

impl<R: Runtime> Default for FunctionRegistry<R> {
    fn default() -> Self {
        FunctionRegistry::builtin()
    }
}

impl<R: Runtime> Clone for FunctionRegistry<R> {
    fn clone(&self) -> Self {
        FunctionRegistry {
            functions: self.functions.clone(),
        }
    }
}

impl<R: Runtime> fmt::Debug for FunctionRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry").field("functions", &self.names()).finish()
    }
}
