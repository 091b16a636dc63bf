use std::fmt;

use crate::runtime::RuntimeType;

/// What a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Any,
    Type(RuntimeType),
    OneOf(&'static [RuntimeType]),
    /// An array whose elements each have one of these types
    ArrayOf(&'static [RuntimeType]),
    /// An expression reference (`&expr`)
    Expression,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::Any => f.write_str("any"),
            ArgType::Type(ty) => write!(f, "{ty}"),
            ArgType::OneOf(types) => write_alternatives(f, types),
            ArgType::ArrayOf(types) => {
                f.write_str("array of ")?;
                write_alternatives(f, types)
            }
            ArgType::Expression => f.write_str("expression"),
        }
    }
}

fn write_alternatives(f: &mut fmt::Formatter<'_>, types: &[RuntimeType]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(if i + 1 == types.len() { " or " } else { ", " })?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

/// Parameters and return type of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<ArgType>,
    variadic: Option<ArgType>,
    returns: RuntimeType,
}

impl Signature {
    pub fn new(params: Vec<ArgType>, returns: RuntimeType) -> Self {
        Signature {
            params,
            variadic: None,
            returns,
        }
    }

    /// Accept any number of extra arguments of type `rest`.
    pub fn variadic(mut self, rest: ArgType) -> Self {
        self.variadic = Some(rest);
        self
    }

    pub fn returns(&self) -> RuntimeType {
        self.returns
    }

    /// Expected type of the argument at `index`.
    pub fn param(&self, index: usize) -> Option<&ArgType> {
        self.params.get(index).or(self.variadic.as_ref())
    }

    pub fn accepts_count(&self, count: usize) -> bool {
        if self.variadic.is_some() {
            count >= self.params.len()
        } else {
            count == self.params.len()
        }
    }

    pub fn describe_arity(&self) -> String {
        let n = self.params.len();
        let plural = if n == 1 { "" } else { "s" };
        if self.variadic.is_some() {
            format!("at least {n} argument{plural}")
        } else {
            format!("{n} argument{plural}")
        }
    }
}

#[test]
fn test_describe() {
    let sig = Signature::new(vec![ArgType::Any], RuntimeType::Any).variadic(ArgType::Any);
    assert_eq!(sig.describe_arity(), "at least 1 argument");
    assert!(sig.accepts_count(3));
    assert!(!sig.accepts_count(0));

    let ty = ArgType::OneOf(&[RuntimeType::String, RuntimeType::Array, RuntimeType::Object]);
    assert_eq!(ty.to_string(), "string, array or object");
}
