use std::collections::BTreeMap;

use crate::{
    runtime::{ArrayBuilder, Elements, Number, ObjectBuilder, Runtime, RuntimeType, Truth},
    value::Value,
};

/// Runtime over the crate's own [`Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueRuntime;

#[derive(Debug, Default)]
pub struct ValueArrayBuilder(Vec<Value>);

impl ArrayBuilder<Value> for ValueArrayBuilder {
    fn add(&mut self, value: Value) {
        self.0.push(value);
    }

    fn add_all(&mut self, value: Value) {
        match value {
            Value::Array(items) => self.0.extend(items),
            other => self.0.push(other),
        }
    }

    fn build(self) -> Value {
        Value::Array(self.0)
    }
}

#[derive(Debug, Default)]
pub struct ValueObjectBuilder(BTreeMap<String, Value>);

impl ObjectBuilder<Value> for ValueObjectBuilder {
    fn put(&mut self, key: String, value: Value) {
        self.0.insert(key, value);
    }

    fn put_all(&mut self, value: Value) {
        if let Value::Object(members) = value {
            self.0.extend(members);
        }
    }

    fn build(self) -> Value {
        Value::Object(self.0)
    }
}

impl Runtime for ValueRuntime {
    type Value = Value;
    type ArrayBuilder = ValueArrayBuilder;
    type ObjectBuilder = ValueObjectBuilder;

    fn type_of(&self, value: &Value) -> RuntimeType {
        match value {
            Value::Null => RuntimeType::Null,
            Value::Boolean(_) => RuntimeType::Boolean,
            Value::Integer(_) | Value::Float(_) => RuntimeType::Number,
            Value::String(_) => RuntimeType::String,
            Value::Array(_) => RuntimeType::Array,
            Value::Object(_) => RuntimeType::Object,
        }
    }

    fn truthiness(&self, value: &Value) -> Truth {
        Truth::from(value.is_truthy())
    }

    fn create_null(&self) -> Value {
        Value::Null
    }

    fn create_boolean(&self, b: bool) -> Value {
        Value::Boolean(b)
    }

    fn create_string(&self, s: &str) -> Value {
        Value::String(s.to_string())
    }

    fn create_number(&self, n: Number) -> Value {
        match n {
            Number::Integer(i) => Value::Integer(i),
            Number::Float(f) => Value::Float(f),
        }
    }

    fn create_literal(&self, literal: &Value) -> Value {
        literal.clone()
    }

    fn as_boolean(&self, value: &Value) -> Option<bool> {
        match value {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn as_str<'a>(&self, value: &'a Value) -> Option<&'a str> {
        value.as_str()
    }

    fn as_number(&self, value: &Value) -> Option<Number> {
        match value {
            Value::Integer(i) => Some(Number::Integer(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    fn array_builder(&self) -> ValueArrayBuilder {
        ValueArrayBuilder::default()
    }

    fn object_builder(&self) -> ValueObjectBuilder {
        ValueObjectBuilder::default()
    }

    fn field(&self, value: &Value, name: &str) -> Value {
        match value {
            Value::Object(members) => members.get(name).cloned().unwrap_or_default(),
            _ => Value::Null,
        }
    }

    fn element(&self, value: &Value, index: i64) -> Value {
        let Value::Array(items) = value else {
            return Value::Null;
        };
        let index = if index < 0 { items.len() as i64 + index } else { index };
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or_default()
    }

    fn length(&self, value: &Value) -> Option<usize> {
        match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            Value::Object(members) => Some(members.len()),
            _ => None,
        }
    }

    fn iterate(&self, value: &Value) -> Elements<Value> {
        match value {
            Value::Array(items) => Elements::Known(items.clone()),
            _ => Elements::Known(Vec::new()),
        }
    }

    fn iterate_values(&self, value: &Value) -> Elements<Value> {
        match value {
            Value::Object(members) => Elements::Known(members.values().cloned().collect()),
            _ => Elements::Known(Vec::new()),
        }
    }

    fn keys(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Object(members) => members.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}
