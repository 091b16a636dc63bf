use serde_json::{Map, Value as Json};

use crate::runtime::{ArrayBuilder, Elements, Number, ObjectBuilder, Runtime, RuntimeType, Truth};

/// Runtime over `serde_json::Value`, so documents deserialized elsewhere can
/// be queried without converting them first.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRuntime;

#[derive(Debug, Default)]
pub struct JsonArrayBuilder(Vec<Json>);

impl ArrayBuilder<Json> for JsonArrayBuilder {
    fn add(&mut self, value: Json) {
        self.0.push(value);
    }

    fn add_all(&mut self, value: Json) {
        match value {
            Json::Array(items) => self.0.extend(items),
            other => self.0.push(other),
        }
    }

    fn build(self) -> Json {
        Json::Array(self.0)
    }
}

#[derive(Debug, Default)]
pub struct JsonObjectBuilder(Map<String, Json>);

impl ObjectBuilder<Json> for JsonObjectBuilder {
    fn put(&mut self, key: String, value: Json) {
        self.0.insert(key, value);
    }

    fn put_all(&mut self, value: Json) {
        if let Json::Object(members) = value {
            self.0.extend(members);
        }
    }

    fn build(self) -> Json {
        Json::Object(self.0)
    }
}

impl Runtime for JsonRuntime {
    type Value = Json;
    type ArrayBuilder = JsonArrayBuilder;
    type ObjectBuilder = JsonObjectBuilder;

    fn type_of(&self, value: &Json) -> RuntimeType {
        match value {
            Json::Null => RuntimeType::Null,
            Json::Bool(_) => RuntimeType::Boolean,
            Json::Number(_) => RuntimeType::Number,
            Json::String(_) => RuntimeType::String,
            Json::Array(_) => RuntimeType::Array,
            Json::Object(_) => RuntimeType::Object,
        }
    }

    fn truthiness(&self, value: &Json) -> Truth {
        Truth::from(match value {
            Json::Null => false,
            Json::Bool(b) => *b,
            Json::Number(_) => true,
            Json::String(s) => !s.is_empty(),
            Json::Array(items) => !items.is_empty(),
            Json::Object(members) => !members.is_empty(),
        })
    }

    fn create_null(&self) -> Json {
        Json::Null
    }

    fn create_boolean(&self, b: bool) -> Json {
        Json::Bool(b)
    }

    fn create_string(&self, s: &str) -> Json {
        Json::String(s.to_string())
    }

    fn create_number(&self, n: Number) -> Json {
        match n {
            Number::Integer(i) => Json::from(i),
            // JSON has no NaN or infinity
            Number::Float(f) => serde_json::Number::from_f64(f).map_or(Json::Null, Json::Number),
        }
    }

    fn as_boolean(&self, value: &Json) -> Option<bool> {
        value.as_bool()
    }

    fn as_str<'a>(&self, value: &'a Json) -> Option<&'a str> {
        value.as_str()
    }

    fn as_number(&self, value: &Json) -> Option<Number> {
        let Json::Number(n) = value else {
            return None;
        };
        match n.as_i64() {
            Some(i) => Some(Number::Integer(i)),
            None => n.as_f64().map(Number::Float),
        }
    }

    fn array_builder(&self) -> JsonArrayBuilder {
        JsonArrayBuilder::default()
    }

    fn object_builder(&self) -> JsonObjectBuilder {
        JsonObjectBuilder::default()
    }

    fn field(&self, value: &Json, name: &str) -> Json {
        value.get(name).cloned().unwrap_or(Json::Null)
    }

    fn element(&self, value: &Json, index: i64) -> Json {
        let Json::Array(items) = value else {
            return Json::Null;
        };
        let index = if index < 0 { items.len() as i64 + index } else { index };
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Json::Null)
    }

    fn length(&self, value: &Json) -> Option<usize> {
        match value {
            Json::String(s) => Some(s.chars().count()),
            Json::Array(items) => Some(items.len()),
            Json::Object(members) => Some(members.len()),
            _ => None,
        }
    }

    fn iterate(&self, value: &Json) -> Elements<Json> {
        match value {
            Json::Array(items) => Elements::Known(items.clone()),
            _ => Elements::Known(Vec::new()),
        }
    }

    fn iterate_values(&self, value: &Json) -> Elements<Json> {
        match value {
            Json::Object(members) => Elements::Known(members.values().cloned().collect()),
            _ => Elements::Known(Vec::new()),
        }
    }

    fn keys(&self, value: &Json) -> Vec<String> {
        match value {
            Json::Object(members) => members.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}
