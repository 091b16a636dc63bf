//! A type model for abstract evaluation.
//!
//! Evaluating an expression against a [`Shape`] through [`ShapeRuntime`]
//! yields the shape of every result the expression could produce. Shapes
//! are kept normalized, so structural equality doubles as the fixed-point
//! test of the evaluator's fold.
use std::{collections::BTreeMap, fmt};

use crate::{
    ast::ComparatorType,
    runtime::{ArrayBuilder, Elements, Number, ObjectBuilder, Runtime, RuntimeType, Truth, slice_indices},
    value::Value,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Anything at all
    Any,
    Null,
    Boolean,
    Number,
    String,
    /// An array of known length
    Tuple(Vec<Shape>),
    /// An array of unknown length, possibly empty
    Array(Box<Shape>),
    /// An object with exactly these keys
    Record(BTreeMap<String, Shape>),
    /// An object with unknown keys
    Map(Box<Shape>),
    /// One of several shapes
    ///
    /// Always built through [`Shape::union`]: at least two members, at most
    /// one array-like and one object-like member, no nested unions.
    Union(Vec<Shape>),
}

impl Shape {
    pub fn array(element: Shape) -> Shape {
        Shape::Array(Box::new(element))
    }

    pub fn map(value: Shape) -> Shape {
        Shape::Map(Box::new(value))
    }

    /// A shape describing `value` as a sample document.
    ///
    /// Arrays in a sample stand for arrays of any length whose elements look
    /// like the sampled ones; objects keep their exact keys.
    pub fn of_value(value: &Value) -> Shape {
        match value {
            Value::Null => Shape::Null,
            Value::Boolean(_) => Shape::Boolean,
            Value::Integer(_) | Value::Float(_) => Shape::Number,
            Value::String(_) => Shape::String,
            Value::Array(items) => {
                let element = items
                    .iter()
                    .map(Shape::of_value)
                    .reduce(Shape::union)
                    .unwrap_or(Shape::Any);
                Shape::array(element)
            }
            Value::Object(members) => Shape::Record(
                members
                    .iter()
                    .map(|(key, value)| (key.clone(), Shape::of_value(value)))
                    .collect(),
            ),
        }
    }

    /// A shape covering both `self` and `other`.
    ///
    /// Tuples of equal length merge element-wise, anything else array-like
    /// widens to an array. Records merge key-wise, with keys present on one
    /// side only becoming nullable; anything else object-like widens to a
    /// map.
    pub fn union(self, other: Shape) -> Shape {
        if self == other {
            return self;
        }
        Shape::from_members(vec![self, other])
    }

    fn from_members(mut pending: Vec<Shape>) -> Shape {
        let mut scalars = [false; 4];
        let mut array: Option<Shape> = None;
        let mut object: Option<Shape> = None;

        while let Some(member) = pending.pop() {
            match member {
                Shape::Any => return Shape::Any,
                Shape::Null => scalars[0] = true,
                Shape::Boolean => scalars[1] = true,
                Shape::Number => scalars[2] = true,
                Shape::String => scalars[3] = true,
                Shape::Tuple(_) | Shape::Array(_) => {
                    array = Some(match array {
                        Some(existing) => merge_arrays(existing, member),
                        None => member,
                    });
                }
                Shape::Record(_) | Shape::Map(_) => {
                    object = Some(match object {
                        Some(existing) => merge_objects(existing, member),
                        None => member,
                    });
                }
                Shape::Union(inner) => pending.extend(inner),
            }
        }

        Shape::from_flags(scalars, array, object)
    }

    fn from_flags(scalars: [bool; 4], array: Option<Shape>, object: Option<Shape>) -> Shape {
        let mut members: Vec<Shape> = [Shape::Null, Shape::Boolean, Shape::Number, Shape::String]
            .into_iter()
            .zip(scalars)
            .filter_map(|(shape, present)| present.then_some(shape))
            .collect();
        members.extend(array);
        members.extend(object);

        match members.len() {
            0 => Shape::Any,
            1 => members.remove(0),
            _ => Shape::Union(members),
        }
    }

    /// The members of a union, or the shape itself.
    pub fn members(&self) -> &[Shape] {
        match self {
            Shape::Union(members) => members,
            shape => std::slice::from_ref(shape),
        }
    }

    /// Apply `f` to every member and union the results.
    fn map_members(&self, f: impl Fn(&Shape) -> Shape) -> Shape {
        self.members()
            .iter()
            .map(f)
            .reduce(Shape::union)
            .unwrap_or(Shape::Any)
    }

    fn runtime_type(&self) -> RuntimeType {
        match self {
            Shape::Null => RuntimeType::Null,
            Shape::Boolean => RuntimeType::Boolean,
            Shape::Number => RuntimeType::Number,
            Shape::String => RuntimeType::String,
            Shape::Tuple(_) | Shape::Array(_) => RuntimeType::Array,
            Shape::Record(_) | Shape::Map(_) => RuntimeType::Object,
            Shape::Any | Shape::Union(_) => RuntimeType::Any,
        }
    }
}

fn merge_arrays(a: Shape, b: Shape) -> Shape {
    match (a, b) {
        (Shape::Tuple(xs), Shape::Tuple(ys)) if xs.len() == ys.len() => {
            Shape::Tuple(xs.into_iter().zip(ys).map(|(x, y)| x.union(y)).collect())
        }
        (Shape::Tuple(xs), Shape::Tuple(ys)) => xs
            .into_iter()
            .chain(ys)
            .reduce(Shape::union)
            .map_or(Shape::array(Shape::Any), Shape::array),
        (Shape::Tuple(xs), Shape::Array(e)) | (Shape::Array(e), Shape::Tuple(xs)) => {
            Shape::array(xs.into_iter().fold(*e, Shape::union))
        }
        (Shape::Array(x), Shape::Array(y)) => Shape::array(x.union(*y)),
        (a, _) => a,
    }
}

fn merge_objects(a: Shape, b: Shape) -> Shape {
    match (a, b) {
        (Shape::Record(mut xs), Shape::Record(ys)) => {
            for (key, value) in xs.iter_mut() {
                if !ys.contains_key(key) {
                    *value = value.clone().union(Shape::Null);
                }
            }
            for (key, value) in ys {
                match xs.remove(&key) {
                    Some(existing) => xs.insert(key, existing.union(value)),
                    None => xs.insert(key, value.union(Shape::Null)),
                };
            }
            Shape::Record(xs)
        }
        (Shape::Record(xs), Shape::Map(v)) | (Shape::Map(v), Shape::Record(xs)) => {
            Shape::map(xs.into_values().fold(*v, Shape::union))
        }
        (Shape::Map(x), Shape::Map(y)) => Shape::map(x.union(*y)),
        (a, _) => a,
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any => f.write_str("any"),
            Shape::Null => f.write_str("null"),
            Shape::Boolean => f.write_str("boolean"),
            Shape::Number => f.write_str("number"),
            Shape::String => f.write_str("string"),
            Shape::Tuple(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Shape::Array(element) => write!(f, "array<{element}>"),
            Shape::Record(members) => {
                f.write_str("{")?;
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Shape::Map(value) => write!(f, "map<{value}>"),
            Shape::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}

/// Abstract runtime over [`Shape`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeRuntime;

/// Builds a tuple until something of unknown length is added, then an array.
#[derive(Debug, Default)]
pub struct ShapeArrayBuilder {
    items: Vec<Shape>,
    open: Option<Shape>,
}

impl ShapeArrayBuilder {
    fn add_open(&mut self, shape: Shape) {
        self.open = Some(match self.open.take() {
            Some(open) => open.union(shape),
            None => shape,
        });
    }
}

impl ArrayBuilder<Shape> for ShapeArrayBuilder {
    fn add(&mut self, value: Shape) {
        if self.open.is_some() {
            self.add_open(value);
        } else {
            self.items.push(value);
        }
    }

    fn add_all(&mut self, value: Shape) {
        match value {
            Shape::Tuple(items) => {
                for item in items {
                    self.add(item);
                }
            }
            Shape::Array(element) => self.add_open(*element),
            Shape::Any => self.add_open(Shape::Any),
            Shape::Union(members) => {
                // which member it is decides between splicing and pushing
                for member in members {
                    match member {
                        Shape::Tuple(items) => {
                            for item in items {
                                self.add_open(item);
                            }
                        }
                        Shape::Array(element) => self.add_open(*element),
                        other => self.add_open(other),
                    }
                }
            }
            scalar => self.add(scalar),
        }
    }

    fn build(self) -> Shape {
        match self.open {
            None => Shape::Tuple(self.items),
            Some(open) => Shape::array(self.items.into_iter().fold(open, Shape::union)),
        }
    }
}

/// Builds a record until members with unknown keys are added, then a map.
#[derive(Debug, Default)]
pub struct ShapeObjectBuilder {
    fields: BTreeMap<String, Shape>,
    open: Option<Shape>,
}

impl ShapeObjectBuilder {
    fn add_open(&mut self, shape: Shape) {
        // an unknown key may replace any known one
        for value in self.fields.values_mut() {
            *value = value.clone().union(shape.clone());
        }
        self.open = Some(match self.open.take() {
            Some(open) => open.union(shape),
            None => shape,
        });
    }
}

impl ObjectBuilder<Shape> for ShapeObjectBuilder {
    fn put(&mut self, key: String, value: Shape) {
        self.fields.insert(key, value);
    }

    fn put_all(&mut self, value: Shape) {
        match value {
            Shape::Record(members) => self.fields.extend(members),
            Shape::Map(value) => self.add_open(*value),
            Shape::Any => self.add_open(Shape::Any),
            Shape::Union(members) => {
                for member in members {
                    match member {
                        Shape::Record(fields) => {
                            for value in fields.into_values() {
                                self.add_open(value);
                            }
                        }
                        Shape::Map(value) => self.add_open(*value),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn build(self) -> Shape {
        match self.open {
            None => Shape::Record(self.fields),
            Some(open) => Shape::map(self.fields.into_values().fold(open, Shape::union)),
        }
    }
}

impl Runtime for ShapeRuntime {
    type Value = Shape;
    type ArrayBuilder = ShapeArrayBuilder;
    type ObjectBuilder = ShapeObjectBuilder;

    fn is_abstract(&self) -> bool {
        true
    }

    fn type_of(&self, value: &Shape) -> RuntimeType {
        value.runtime_type()
    }

    fn classify(&self, value: &Shape, ty: RuntimeType) -> Truth {
        match value {
            Shape::Any => Truth::Unknown,
            Shape::Union(members) => Truth::all(members.iter().map(|m| self.classify(m, ty))),
            shape => Truth::from(shape.runtime_type() == ty),
        }
    }

    fn truthiness(&self, value: &Shape) -> Truth {
        match value {
            Shape::Null => Truth::False,
            Shape::Number => Truth::True,
            Shape::Tuple(items) => Truth::from(!items.is_empty()),
            Shape::Record(fields) => Truth::from(!fields.is_empty()),
            Shape::Union(members) => Truth::all(members.iter().map(|m| self.truthiness(m))),
            Shape::Boolean | Shape::String | Shape::Array(_) | Shape::Map(_) | Shape::Any => Truth::Unknown,
        }
    }

    fn create_null(&self) -> Shape {
        Shape::Null
    }

    fn create_boolean(&self, _b: bool) -> Shape {
        Shape::Boolean
    }

    fn create_string(&self, _s: &str) -> Shape {
        Shape::String
    }

    fn create_number(&self, _n: Number) -> Shape {
        Shape::Number
    }

    fn create_any(&self, ty: RuntimeType) -> Shape {
        match ty {
            RuntimeType::Null => Shape::Null,
            RuntimeType::Boolean => Shape::Boolean,
            RuntimeType::Number => Shape::Number,
            RuntimeType::String => Shape::String,
            RuntimeType::Array => Shape::array(Shape::Any),
            RuntimeType::Object => Shape::map(Shape::Any),
            RuntimeType::Expression | RuntimeType::Any => Shape::Any,
        }
    }

    fn as_boolean(&self, _value: &Shape) -> Option<bool> {
        None
    }

    fn as_str<'a>(&self, _value: &'a Shape) -> Option<&'a str> {
        None
    }

    fn as_number(&self, _value: &Shape) -> Option<Number> {
        None
    }

    fn array_builder(&self) -> ShapeArrayBuilder {
        ShapeArrayBuilder::default()
    }

    fn object_builder(&self) -> ShapeObjectBuilder {
        ShapeObjectBuilder::default()
    }

    fn field(&self, value: &Shape, name: &str) -> Shape {
        value.map_members(|member| match member {
            Shape::Any => Shape::Any,
            Shape::Record(fields) => fields.get(name).cloned().unwrap_or(Shape::Null),
            Shape::Map(value) => value.as_ref().clone().union(Shape::Null),
            _ => Shape::Null,
        })
    }

    fn element(&self, value: &Shape, index: i64) -> Shape {
        value.map_members(|member| match member {
            Shape::Any => Shape::Any,
            Shape::Tuple(items) => {
                let index = if index < 0 { items.len() as i64 + index } else { index };
                usize::try_from(index)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .unwrap_or(Shape::Null)
            }
            Shape::Array(element) => element.as_ref().clone().union(Shape::Null),
            _ => Shape::Null,
        })
    }

    fn slice(&self, value: &Shape, start: Option<i64>, stop: Option<i64>, step: i64) -> Shape {
        value.map_members(|member| match member {
            Shape::Any => Shape::Any,
            Shape::Tuple(items) => Shape::Tuple(
                slice_indices(items.len(), start, stop, step)
                    .into_iter()
                    .map(|i| items[i].clone())
                    .collect(),
            ),
            Shape::Array(element) => Shape::Array(element.clone()),
            _ => Shape::Null,
        })
    }

    fn length(&self, value: &Shape) -> Option<usize> {
        match value {
            Shape::Tuple(items) => Some(items.len()),
            Shape::Record(fields) => Some(fields.len()),
            _ => None,
        }
    }

    fn iterate(&self, value: &Shape) -> Elements<Shape> {
        let arrays: Vec<&Shape> = value
            .members()
            .iter()
            .filter(|m| matches!(m, Shape::Tuple(_) | Shape::Array(_) | Shape::Any))
            .collect();

        match arrays.as_slice() {
            [] => Elements::Known(Vec::new()),
            [Shape::Tuple(items)] => Elements::Known(items.clone()),
            [Shape::Array(element)] => Elements::Repeated(element.as_ref().clone()),
            _ => Elements::Repeated(Shape::Any),
        }
    }

    fn iterate_values(&self, value: &Shape) -> Elements<Shape> {
        let objects: Vec<&Shape> = value
            .members()
            .iter()
            .filter(|m| matches!(m, Shape::Record(_) | Shape::Map(_) | Shape::Any))
            .collect();

        match objects.as_slice() {
            [] => Elements::Known(Vec::new()),
            [Shape::Record(fields)] => Elements::Known(fields.values().cloned().collect()),
            [Shape::Map(value)] => Elements::Repeated(value.as_ref().clone()),
            _ => Elements::Repeated(Shape::Any),
        }
    }

    fn keys(&self, value: &Shape) -> Vec<String> {
        match value {
            Shape::Record(fields) => fields.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn equal(&self, a: &Shape, b: &Shape) -> bool {
        a == b
    }

    fn comparison(&self, _comparator: ComparatorType, _a: &Shape, _b: &Shape) -> Shape {
        Shape::Boolean
    }

    fn either(&self, a: &Shape, b: &Shape) -> Shape {
        a.clone().union(b.clone())
    }
}

#[test]
fn test_union_normalizes() {
    let shape = Shape::Number.union(Shape::Null).union(Shape::Number);
    assert_eq!(shape, Shape::Union(vec![Shape::Null, Shape::Number]));
    assert_eq!(shape.to_string(), "null | number");
}

#[test]
fn test_union_widens_arrays() {
    let short = Shape::Tuple(vec![Shape::Number]);
    let long = Shape::Tuple(vec![Shape::Number, Shape::String]);
    assert_eq!(
        short.union(long),
        Shape::array(Shape::Union(vec![Shape::Number, Shape::String]))
    );
}

#[test]
fn test_union_merges_records() {
    let a = Shape::Record(BTreeMap::from([("x".to_string(), Shape::Number)]));
    let b = Shape::Record(BTreeMap::from([("y".to_string(), Shape::String)]));
    assert_eq!(a.union(b).to_string(), "{x: null | number, y: null | string}");
}
