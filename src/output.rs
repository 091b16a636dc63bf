//! JSON output for evaluation results and literals.
//!
//! [`to_json`] and [`to_json_pretty`] print the crate's [`Value`] directly;
//! the canonical expression printer relies on [`to_json`] for literals.
//! [`to_serde_json`] converts a value of any [`Runtime`] through the runtime's
//! own accessors, which is how `to_string()` encodes values it cannot see
//! into.
//!
//! # Examples
//!
//! ```
//! use jmespath_lang::Value;
//! use jmespath_lang::output::{to_json, to_json_pretty};
//!
//! let value = Value::Array(vec![Value::Integer(1), Value::from("two")]);
//!
//! assert_eq!(to_json(&value), r#"[1,"two"]"#);
//! assert_eq!(to_json_pretty(&value), "[\n  1,\n  \"two\"\n]");
//! ```

use std::fmt::Write;

use crate::{
    runtime::{Elements, Number, Runtime, RuntimeType},
    value::Value,
};

pub struct JsonPrinter {
    pretty: bool,
    out: String,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter {
            pretty,
            out: String::new(),
        }
    }

    pub fn print(mut self, value: &Value) -> String {
        self.print_value(value, 0);
        self.out
    }

    fn print_value(&mut self, value: &Value, indent: usize) {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Boolean(b) => {
                let _ = write!(self.out, "{b}");
            }
            Value::Integer(n) => {
                let _ = write!(self.out, "{n}");
            }
            // JSON has no NaN or infinity
            Value::Float(n) if !n.is_finite() => self.out.push_str("null"),
            // keep a fraction so the value reads back as a float
            Value::Float(n) if n.fract() == 0.0 && n.abs() < 1e16 => {
                let _ = write!(self.out, "{n:.1}");
            }
            Value::Float(n) => {
                let _ = write!(self.out, "{n}");
            }
            Value::String(s) => self.print_string(s),
            Value::Array(items) => {
                self.print_sequence('[', ']', items.len(), indent, |printer, i| {
                    printer.print_value(&items[i], indent + 1);
                });
            }
            Value::Object(members) => {
                let entries: Vec<(&String, &Value)> = members.iter().collect();
                self.print_sequence('{', '}', entries.len(), indent, |printer, i| {
                    let (key, value) = entries[i];
                    printer.print_string(key);
                    printer.out.push_str(if printer.pretty { ": " } else { ":" });
                    printer.print_value(value, indent + 1);
                });
            }
        }
    }

    fn print_sequence(
        &mut self,
        open: char,
        close: char,
        len: usize,
        indent: usize,
        mut item: impl FnMut(&mut Self, usize),
    ) {
        self.out.push(open);
        if len == 0 {
            self.out.push(close);
            return;
        }

        for i in 0..len {
            if i > 0 {
                self.out.push(',');
            }
            if self.pretty {
                self.out.push('\n');
                self.indent(indent + 1);
            }
            item(self, i);
        }

        if self.pretty {
            self.out.push('\n');
            self.indent(indent);
        }
        self.out.push(close);
    }

    fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.out.push_str("  ");
        }
    }

    fn print_string(&mut self, s: &str) {
        self.out.push('"');
        for c in s.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if c.is_control() => {
                    let _ = write!(self.out, "\\u{:04x}", c as u32);
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

/// Compact JSON, keys in sorted order.
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// JSON with 2-space indentation, keys in sorted order.
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}

/// Convert any runtime's value to `serde_json::Value`.
///
/// Values an abstract runtime cannot describe concretely come out as null.
pub fn to_serde_json<R: Runtime>(runtime: &R, value: &R::Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match runtime.type_of(value) {
        RuntimeType::Null | RuntimeType::Expression | RuntimeType::Any => Json::Null,
        RuntimeType::Boolean => runtime.as_boolean(value).map_or(Json::Null, Json::Bool),
        RuntimeType::Number => match runtime.as_number(value) {
            Some(Number::Integer(i)) => Json::from(i),
            Some(Number::Float(f)) => serde_json::Number::from_f64(f).map_or(Json::Null, Json::Number),
            None => Json::Null,
        },
        RuntimeType::String => runtime
            .as_str(value)
            .map_or(Json::Null, |s| Json::String(s.to_string())),
        RuntimeType::Array => match runtime.iterate(value) {
            Elements::Known(items) => Json::Array(items.iter().map(|item| to_serde_json(runtime, item)).collect()),
            Elements::Repeated(_) => Json::Array(Vec::new()),
        },
        RuntimeType::Object => Json::Object(
            runtime
                .keys(value)
                .into_iter()
                .map(|key| {
                    let member = to_serde_json(runtime, &runtime.field(value, &key));
                    (key, member)
                })
                .collect(),
        ),
    }
}

#[test]
fn test_escapes() {
    assert_eq!(to_json(&Value::from("a\"b\\c\n\u{1}")), r#""a\"b\\c\n\u0001""#);
}

#[test]
fn test_pretty_object() {
    let value = Value::from(serde_json::json!({"b": [1], "a": {}}));
    assert_eq!(to_json_pretty(&value), "{\n  \"a\": {},\n  \"b\": [\n    1\n  ]\n}");
}
