//! # JMESPath - Runtime
//!
//! The [`Runtime`] trait is the single seam between the evaluator and a
//! document representation. The evaluator never inspects a document itself;
//! every type test, lookup, construction and comparison goes through the
//! runtime it was given.
//!
//! ## Backends
//!
//! - **[`ValueRuntime`]** - the crate's own [`Value`]
//! - **[`JsonRuntime`]** - `serde_json::Value`
//! - **[`ShapeRuntime`]** - [`Shape`], a type model; evaluating against it
//!   infers what an expression produces instead of computing it
//!
//! ## Concrete and abstract runtimes
//!
//! A concrete runtime always knows the answer to "is this an array?". An
//! abstract runtime may not: a `Shape::Any` might be anything. Questions
//! about values are therefore answered with a three-valued [`Truth`], and
//! the evaluator follows both branches of anything it cannot decide,
//! joining the results with [`Runtime::either`].
use std::{cmp::Ordering, fmt};

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::{ast::ComparatorType, value::Value};

pub mod json;
pub mod shape;
pub mod value;

pub use json::JsonRuntime;
pub use shape::{Shape, ShapeRuntime};
pub use value::ValueRuntime;

/// The dynamic type of a runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeType {
    Null,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Expression,
    /// Not known until run time; only abstract runtimes report it
    Any,
}

impl RuntimeType {
    pub fn name(self) -> &'static str {
        match self {
            RuntimeType::Null => "null",
            RuntimeType::String => "string",
            RuntimeType::Number => "number",
            RuntimeType::Boolean => "boolean",
            RuntimeType::Array => "array",
            RuntimeType::Object => "object",
            RuntimeType::Expression => "expression",
            RuntimeType::Any => "any",
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Answer to a question about a value that an abstract runtime may not be
/// able to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    pub fn not(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }

    /// Combine the answers for every member of a union.
    pub fn all(answers: impl IntoIterator<Item = Truth>) -> Truth {
        let mut seen_true = false;
        let mut seen_false = false;
        for answer in answers {
            match answer {
                Truth::True => seen_true = true,
                Truth::False => seen_false = true,
                Truth::Unknown => return Truth::Unknown,
            }
        }
        match (seen_true, seen_false) {
            (true, false) => Truth::True,
            (false, true) => Truth::False,
            _ => Truth::Unknown,
        }
    }
}

impl From<bool> for Truth {
    fn from(b: bool) -> Self {
        if b { Truth::True } else { Truth::False }
    }
}

/// A JSON number as the evaluator sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Numeric ordering; integers and floats compare by value.
    ///
    /// Mixed comparisons go through `Decimal` so that large integers are not
    /// rounded to the nearest float first.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(&b)),
            (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
            (Number::Integer(i), Number::Float(f)) => compare_mixed(i, f),
            (Number::Float(f), Number::Integer(i)) => compare_mixed(i, f).map(Ordering::reverse),
        }
    }

    pub fn to_decimal(self) -> Option<Decimal> {
        match self {
            Number::Integer(i) => Some(Decimal::from(i)),
            Number::Float(f) => Decimal::from_f64(f),
        }
    }

    /// Integral decimals come back as integers.
    pub fn from_decimal(d: Decimal) -> Number {
        if d.fract().is_zero() {
            if let Some(i) = d.to_i64() {
                return Number::Integer(i);
            }
        }
        Number::Float(d.to_f64().unwrap_or(f64::NAN))
    }

    /// Integral floats within range come back as integers.
    pub fn from_f64(f: f64) -> Number {
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            Number::Integer(f as i64)
        } else {
            Number::Float(f)
        }
    }

    /// Parse JMESPath `to_number` input.
    pub fn parse(s: &str) -> Option<Number> {
        let s = s.trim();
        if let Ok(i) = s.parse::<i64>() {
            return Some(Number::Integer(i));
        }
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Number::Float)
    }
}

fn compare_mixed(i: i64, f: f64) -> Option<Ordering> {
    match Decimal::from_f64(f) {
        Some(d) => Some(Decimal::from(i).cmp(&d)),
        None => (i as f64).partial_cmp(&f),
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

/// The elements a runtime hands out for iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum Elements<V> {
    /// Exactly these elements, in order
    Known(Vec<V>),
    /// Any number of elements (possibly none), each described by this value
    Repeated(V),
}

impl<V> Elements<V> {
    pub fn reversed(self) -> Self {
        match self {
            Elements::Known(mut items) => {
                items.reverse();
                Elements::Known(items)
            }
            repeated => repeated,
        }
    }
}

/// Accumulates array elements.
pub trait ArrayBuilder<V> {
    fn add(&mut self, value: V);

    /// Add every element of `value` if it is an array, otherwise `value`
    /// itself.
    fn add_all(&mut self, value: V);

    fn build(self) -> V;
}

/// Accumulates object members; later keys replace earlier ones.
pub trait ObjectBuilder<V> {
    fn put(&mut self, key: String, value: V);

    /// Put every member of `value`, which should be an object.
    fn put_all(&mut self, value: V);

    fn build(self) -> V;
}

/// Primitive operations over a document representation.
///
/// Operations are total: a missing field, an out-of-range index or the wrong
/// kind of value yields null rather than an error. Implementations must be
/// stateless or confined to one evaluation at a time.
pub trait Runtime {
    type Value: Clone + PartialEq + fmt::Debug;
    type ArrayBuilder: ArrayBuilder<Self::Value>;
    type ObjectBuilder: ObjectBuilder<Self::Value>;

    /// Whether values describe types rather than documents.
    fn is_abstract(&self) -> bool {
        false
    }

    fn type_of(&self, value: &Self::Value) -> RuntimeType;

    /// Whether `value` has type `ty`.
    fn classify(&self, value: &Self::Value, ty: RuntimeType) -> Truth {
        Truth::from(self.type_of(value) == ty)
    }

    fn is(&self, value: &Self::Value, ty: RuntimeType) -> bool {
        self.classify(value, ty) == Truth::True
    }

    /// JMESPath truthiness: null, false, `""`, `[]` and `{}` are false.
    fn truthiness(&self, value: &Self::Value) -> Truth;

    fn is_truthy(&self, value: &Self::Value) -> bool {
        self.truthiness(value) == Truth::True
    }

    fn create_null(&self) -> Self::Value;
    fn create_boolean(&self, b: bool) -> Self::Value;
    fn create_string(&self, s: &str) -> Self::Value;
    fn create_number(&self, n: Number) -> Self::Value;

    /// Any value of type `ty`.
    ///
    /// Only meaningful for abstract runtimes; concrete runtimes return null.
    fn create_any(&self, ty: RuntimeType) -> Self::Value {
        let _ = ty;
        self.create_null()
    }

    /// Rebuild a parsed literal in this runtime's representation.
    fn create_literal(&self, literal: &Value) -> Self::Value {
        match literal {
            Value::Null => self.create_null(),
            Value::Boolean(b) => self.create_boolean(*b),
            Value::Integer(i) => self.create_number(Number::Integer(*i)),
            Value::Float(f) => self.create_number(Number::Float(*f)),
            Value::String(s) => self.create_string(s),
            Value::Array(items) => {
                let mut builder = self.array_builder();
                for item in items {
                    builder.add(self.create_literal(item));
                }
                builder.build()
            }
            Value::Object(members) => {
                let mut builder = self.object_builder();
                for (key, value) in members {
                    builder.put(key.clone(), self.create_literal(value));
                }
                builder.build()
            }
        }
    }

    fn as_boolean(&self, value: &Self::Value) -> Option<bool>;
    fn as_str<'a>(&self, value: &'a Self::Value) -> Option<&'a str>;
    fn as_number(&self, value: &Self::Value) -> Option<Number>;

    fn array_builder(&self) -> Self::ArrayBuilder;
    fn object_builder(&self) -> Self::ObjectBuilder;

    /// Member `name` of an object; null when absent or not an object.
    fn field(&self, value: &Self::Value, name: &str) -> Self::Value;

    /// Element `index` of an array, negative from the end; null when out of
    /// range or not an array.
    fn element(&self, value: &Self::Value, index: i64) -> Self::Value;

    /// Python-style slice of an array; null when not an array.
    ///
    /// `step` is never zero.
    fn slice(&self, value: &Self::Value, start: Option<i64>, stop: Option<i64>, step: i64) -> Self::Value {
        if !self.is(value, RuntimeType::Array) {
            return self.create_null();
        }
        let Elements::Known(items) = self.iterate(value) else {
            return self.create_any(RuntimeType::Array);
        };
        let mut builder = self.array_builder();
        for index in slice_indices(items.len(), start, stop, step) {
            builder.add(items[index].clone());
        }
        builder.build()
    }

    /// Characters of a string, elements of an array, members of an object.
    fn length(&self, value: &Self::Value) -> Option<usize>;

    /// Elements of an array; nothing for other values.
    fn iterate(&self, value: &Self::Value) -> Elements<Self::Value>;

    /// Member values of an object; nothing for other values.
    fn iterate_values(&self, value: &Self::Value) -> Elements<Self::Value>;

    /// Member names of an object.
    fn keys(&self, value: &Self::Value) -> Vec<String>;

    /// Ordering between two numbers or two strings; `None` otherwise.
    fn compare(&self, a: &Self::Value, b: &Self::Value) -> Option<Ordering> {
        match (self.type_of(a), self.type_of(b)) {
            (RuntimeType::Number, RuntimeType::Number) => {
                self.as_number(a)?.compare(self.as_number(b)?)
            }
            (RuntimeType::String, RuntimeType::String) => Some(self.as_str(a)?.cmp(self.as_str(b)?)),
            _ => None,
        }
    }

    /// Deep equality; numbers compare by value.
    fn equal(&self, a: &Self::Value, b: &Self::Value) -> bool {
        match (self.type_of(a), self.type_of(b)) {
            (RuntimeType::Number, RuntimeType::Number) => self.compare(a, b) == Some(Ordering::Equal),
            (left, right) if left != right => false,
            (RuntimeType::Null, _) => true,
            (RuntimeType::Boolean, _) => self.as_boolean(a) == self.as_boolean(b),
            (RuntimeType::String, _) => self.as_str(a) == self.as_str(b),
            (RuntimeType::Array, _) => match (self.iterate(a), self.iterate(b)) {
                (Elements::Known(xs), Elements::Known(ys)) => {
                    xs.len() == ys.len() && xs.iter().zip(&ys).all(|(x, y)| self.equal(x, y))
                }
                _ => a == b,
            },
            (RuntimeType::Object, _) => {
                let keys = self.keys(a);
                keys == self.keys(b)
                    && keys
                        .iter()
                        .all(|key| self.equal(&self.field(a, key), &self.field(b, key)))
            }
            _ => a == b,
        }
    }

    /// Apply a comparator.
    ///
    /// Ordering comparators between values that have no ordering are false;
    /// `!=` between them is true.
    fn comparison(&self, comparator: ComparatorType, a: &Self::Value, b: &Self::Value) -> Self::Value {
        let result = match comparator {
            ComparatorType::Equal => self.equal(a, b),
            ComparatorType::NotEqual => !self.equal(a, b),
            ordering => self.compare(a, b).is_some_and(|o| ordering.accepts(o)),
        };
        self.create_boolean(result)
    }

    /// `a` when it is a non-empty array, otherwise `b`.
    ///
    /// Abstract runtimes widen instead: the result describes anything either
    /// side could be.
    fn either(&self, a: &Self::Value, b: &Self::Value) -> Self::Value {
        if self.is(a, RuntimeType::Array) && self.length(a).is_some_and(|n| n > 0) {
            a.clone()
        } else {
            b.clone()
        }
    }
}

/// Indices selected by `[start:stop:step]` over `len` elements.
pub fn slice_indices(len: usize, start: Option<i64>, stop: Option<i64>, step: i64) -> Vec<usize> {
    let len = len as i64;
    let clamp = |bound: i64| -> i64 {
        if bound < 0 {
            let bound = bound + len;
            if bound < 0 {
                if step < 0 { -1 } else { 0 }
            } else {
                bound
            }
        } else if bound >= len {
            if step < 0 { len - 1 } else { len }
        } else {
            bound
        }
    };

    let start = match start {
        Some(s) => clamp(s),
        None if step < 0 => len - 1,
        None => 0,
    };
    let stop = match stop {
        Some(s) => clamp(s),
        None if step < 0 => -1,
        None => len,
    };

    let mut indices = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        indices.push(i as usize);
        // a step past either end of i64 has left the array anyway
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    indices
}

#[test]
fn test_slice_indices() {
    assert_eq!(slice_indices(5, Some(1), Some(3), 1), vec![1, 2]);
    assert_eq!(slice_indices(5, None, None, -1), vec![4, 3, 2, 1, 0]);
    assert_eq!(slice_indices(5, Some(-2), None, 1), vec![3, 4]);
    assert_eq!(slice_indices(5, None, None, 2), vec![0, 2, 4]);
    assert_eq!(slice_indices(3, Some(10), Some(20), 1), Vec::<usize>::new());
    assert_eq!(slice_indices(0, None, None, -1), Vec::<usize>::new());
}

#[test]
fn test_slice_indices_extreme_steps() {
    assert_eq!(slice_indices(3, Some(1), None, i64::MAX), vec![1]);
    assert_eq!(slice_indices(3, None, None, i64::MIN), vec![2]);
    assert_eq!(slice_indices(3, Some(-1), Some(i64::MIN), i64::MIN + 1), vec![2]);
    assert_eq!(slice_indices(3, Some(i64::MIN), Some(i64::MAX), i64::MAX), vec![0]);
}

#[test]
fn test_mixed_number_compare() {
    assert_eq!(Number::Integer(1).compare(Number::Float(1.0)), Some(Ordering::Equal));
    assert_eq!(Number::Float(2.5).compare(Number::Integer(2)), Some(Ordering::Greater));
    assert_eq!(Number::Float(f64::NAN).compare(Number::Float(1.0)), None);
}
