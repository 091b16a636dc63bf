//! The JMESPath standard functions, plus `either` and `fold_left`.
use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::{
    ast::Expression,
    evaluator::{EvalError, Evaluator},
    functions::{ArgType, Function, FunctionArgument, FunctionRegistry, Signature},
    output::to_serde_json,
    runtime::{ArrayBuilder, Elements, Number, ObjectBuilder, Runtime, RuntimeType},
};

use RuntimeType::{Array, Boolean, Null, Object, String as Str};
use RuntimeType::Number as Num;

const SUBJECT: ArgType = ArgType::OneOf(&[Str, Array, Object]);
const STRING_OR_ARRAY: ArgType = ArgType::OneOf(&[Str, Array]);
const NUMBERS: ArgType = ArgType::ArrayOf(&[Num]);
const STRINGS: ArgType = ArgType::ArrayOf(&[Str]);
const SORTABLE: ArgType = ArgType::ArrayOf(&[Num, Str]);

pub(crate) fn register_all<R: Runtime>(registry: &mut FunctionRegistry<R>) {
    registry.register("abs", Abs);
    registry.register("avg", Avg);
    registry.register("ceil", Ceil);
    registry.register("contains", Contains);
    registry.register("ends_with", EndsWith);
    registry.register("floor", Floor);
    registry.register("join", Join);
    registry.register("keys", Keys);
    registry.register("length", Length);
    registry.register("map", Map);
    registry.register("max", Max);
    registry.register("max_by", MaxBy);
    registry.register("merge", Merge);
    registry.register("min", Min);
    registry.register("min_by", MinBy);
    registry.register("not_null", NotNull);
    registry.register("reverse", Reverse);
    registry.register("sort", Sort);
    registry.register("sort_by", SortBy);
    registry.register("starts_with", StartsWith);
    registry.register("sum", Sum);
    registry.register("to_array", ToArray);
    registry.register("to_number", ToNumber);
    registry.register("to_string", ToText);
    registry.register("type", Type);
    registry.register("values", Values);
    registry.register("either", Either);
    registry.register("fold_left", FoldLeft);
}

type Args<'a, 'e, V> = &'a [FunctionArgument<'e, V>];

fn value<'a, V>(args: Args<'a, '_, V>, index: usize) -> Result<&'a V, EvalError> {
    args.get(index)
        .and_then(FunctionArgument::as_value)
        .ok_or_else(|| EvalError::InvalidValue(format!("argument {} is not a value", index + 1)))
}

fn expression<'e, V>(args: Args<'_, 'e, V>, index: usize) -> Result<&'e Expression, EvalError> {
    args.get(index)
        .and_then(FunctionArgument::as_expression)
        .ok_or_else(|| EvalError::InvalidValue(format!("argument {} is not an expression", index + 1)))
}

fn number<R: Runtime>(rt: &R, value: &R::Value) -> Result<Number, EvalError> {
    rt.as_number(value)
        .ok_or_else(|| EvalError::InvalidValue(format!("expected a number, found {}", rt.type_of(value))))
}

fn string<'v, R: Runtime>(rt: &R, value: &'v R::Value) -> Result<&'v str, EvalError> {
    rt.as_str(value)
        .ok_or_else(|| EvalError::InvalidValue(format!("expected a string, found {}", rt.type_of(value))))
}

/// Elements of a concrete array.
fn items<R: Runtime>(rt: &R, array: &R::Value) -> Vec<R::Value> {
    match rt.iterate(array) {
        Elements::Known(items) => items,
        Elements::Repeated(item) => vec![item],
    }
}

/// Something any element of `array` could be, or null for no elements.
fn any_element<R: Runtime>(rt: &R, array: &R::Value) -> R::Value {
    match rt.iterate(array) {
        Elements::Known(items) => items
            .into_iter()
            .reduce(|a, b| rt.either(&a, &b))
            .unwrap_or_else(|| rt.create_null()),
        Elements::Repeated(item) => rt.either(&rt.create_null(), &item),
    }
}

/// `array` after an unknown permutation.
fn permuted<R: Runtime>(eval: &Evaluator<'_, R>, array: &R::Value) -> Result<R::Value, EvalError> {
    let rt = eval.runtime();
    match rt.iterate(array) {
        Elements::Known(items) => {
            let element = items.iter().cloned().reduce(|a, b| rt.either(&a, &b));
            match element {
                Some(element) => eval.map_elements(Elements::Known(items), |_| Ok(element.clone())),
                None => Ok(array.clone()),
            }
        }
        repeated => eval.map_elements(repeated, |item| Ok(item.clone())),
    }
}

/// Sort keys must be all numbers or all strings.
fn check_sortable<R: Runtime>(
    rt: &R,
    function: &str,
    argument: usize,
    expected: &str,
    keys: &[R::Value],
) -> Result<(), EvalError> {
    let Some(first) = keys.first() else {
        return Ok(());
    };
    let first = rt.type_of(first);
    let mismatch = if matches!(first, Num | Str) {
        keys.iter().map(|key| rt.type_of(key)).find(|ty| *ty != first)
    } else {
        Some(first)
    };

    match mismatch {
        None => Ok(()),
        Some(actual) => Err(EvalError::InvalidType {
            function: function.to_string(),
            argument,
            expected: expected.to_string(),
            actual,
        }),
    }
}

/// The element whose key compares as `wanted` against all others; the
/// first one wins ties.
fn extremum<R: Runtime>(rt: &R, items: Vec<R::Value>, keys: &[R::Value], wanted: Ordering) -> R::Value {
    let mut best = 0;
    for index in 1..keys.len() {
        if rt.compare(&keys[index], &keys[best]) == Some(wanted) {
            best = index;
        }
    }
    items.into_iter().nth(best).unwrap_or_else(|| rt.create_null())
}

fn sort_keys<R: Runtime>(
    eval: &Evaluator<'_, R>,
    function: &str,
    items: &[R::Value],
    key: &Expression,
) -> Result<Vec<R::Value>, EvalError> {
    let keys = items
        .iter()
        .map(|item| eval.evaluate(key, item))
        .collect::<Result<Vec<_>, _>>()?;
    check_sortable(eval.runtime(), function, 2, "expression returning number or string", &keys)?;
    Ok(keys)
}

fn min_or_max<R: Runtime>(
    eval: &Evaluator<'_, R>,
    function: &str,
    args: Args<'_, '_, R::Value>,
    wanted: Ordering,
) -> Result<R::Value, EvalError> {
    let rt = eval.runtime();
    let items = items(rt, value(args, 0)?);
    check_sortable(rt, function, 1, "array of number or array of string", &items)?;
    Ok(extremum(rt, items.clone(), &items, wanted))
}

fn min_or_max_by<R: Runtime>(
    eval: &Evaluator<'_, R>,
    function: &str,
    args: Args<'_, '_, R::Value>,
    wanted: Ordering,
) -> Result<R::Value, EvalError> {
    let rt = eval.runtime();
    let items = items(rt, value(args, 0)?);
    let keys = sort_keys(eval, function, &items, expression(args, 1)?)?;
    Ok(extremum(rt, items, &keys, wanted))
}

fn rounded<R: Runtime>(rt: &R, value: &R::Value, round: fn(f64) -> f64) -> Result<R::Value, EvalError> {
    Ok(rt.create_number(match number(rt, value)? {
        Number::Integer(i) => Number::Integer(i),
        Number::Float(f) => Number::from_f64(round(f)),
    }))
}

fn decimal_sum(numbers: &[Number]) -> Option<Decimal> {
    numbers
        .iter()
        .try_fold(Decimal::ZERO, |total, n| total.checked_add(n.to_decimal()?))
}

struct Abs;

impl<R: Runtime> Function<R> for Abs {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Num)], Num)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        Ok(rt.create_number(match number(rt, value(args, 0)?)? {
            Number::Integer(i) => i
                .checked_abs()
                .map_or(Number::Float((i as f64).abs()), Number::Integer),
            Number::Float(f) => Number::Float(f.abs()),
        }))
    }
}

struct Avg;

impl<R: Runtime> Function<R> for Avg {
    fn signature(&self) -> Signature {
        Signature::new(vec![NUMBERS], Num)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let numbers = items(rt, value(args, 0)?)
            .iter()
            .map(|item| number(rt, item))
            .collect::<Result<Vec<_>, _>>()?;
        if numbers.is_empty() {
            return Ok(rt.create_null());
        }

        let count = numbers.len();
        let average = decimal_sum(&numbers)
            .and_then(|total| total.checked_div(Decimal::from(count)))
            .map(Number::from_decimal)
            .unwrap_or_else(|| {
                Number::Float(numbers.iter().map(|n| n.as_f64()).sum::<f64>() / count as f64)
            });
        Ok(rt.create_number(average))
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, _args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        Ok(rt.either(&rt.create_null(), &rt.create_any(Num)))
    }
}

struct Ceil;

impl<R: Runtime> Function<R> for Ceil {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Num)], Num)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        rounded(eval.runtime(), value(args, 0)?, f64::ceil)
    }
}

struct Floor;

impl<R: Runtime> Function<R> for Floor {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Num)], Num)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        rounded(eval.runtime(), value(args, 0)?, f64::floor)
    }
}

struct Contains;

impl<R: Runtime> Function<R> for Contains {
    fn signature(&self) -> Signature {
        Signature::new(vec![STRING_OR_ARRAY, ArgType::Any], Boolean)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let subject = value(args, 0)?;
        let search = value(args, 1)?;

        let found = match rt.as_str(subject) {
            Some(haystack) => rt.as_str(search).is_some_and(|needle| haystack.contains(needle)),
            None => items(rt, subject).iter().any(|item| rt.equal(item, search)),
        };
        Ok(rt.create_boolean(found))
    }
}

struct EndsWith;

impl<R: Runtime> Function<R> for EndsWith {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Str), ArgType::Type(Str)], Boolean)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let subject = string(rt, value(args, 0)?)?;
        let suffix = string(rt, value(args, 1)?)?;
        Ok(rt.create_boolean(subject.ends_with(suffix)))
    }
}

struct StartsWith;

impl<R: Runtime> Function<R> for StartsWith {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Str), ArgType::Type(Str)], Boolean)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let subject = string(rt, value(args, 0)?)?;
        let prefix = string(rt, value(args, 1)?)?;
        Ok(rt.create_boolean(subject.starts_with(prefix)))
    }
}

struct Join;

impl<R: Runtime> Function<R> for Join {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Str), STRINGS], Str)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let glue = string(rt, value(args, 0)?)?;
        let parts = items(rt, value(args, 1)?);
        let parts = parts
            .iter()
            .map(|part| string(rt, part))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rt.create_string(&parts.join(glue)))
    }
}

struct Keys;

impl<R: Runtime> Function<R> for Keys {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Object)], Array)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let mut builder = rt.array_builder();
        for key in rt.keys(value(args, 0)?) {
            builder.add(rt.create_string(&key));
        }
        Ok(builder.build())
    }
}

struct Values;

impl<R: Runtime> Function<R> for Values {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Object)], Array)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let members = eval.runtime().iterate_values(value(args, 0)?);
        eval.map_elements(members, |member| Ok(member.clone()))
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        self.apply(eval, args)
    }
}

struct Length;

impl<R: Runtime> Function<R> for Length {
    fn signature(&self) -> Signature {
        Signature::new(vec![SUBJECT], Num)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        Ok(match rt.length(value(args, 0)?) {
            Some(n) => rt.create_number(Number::Integer(n as i64)),
            None => rt.create_null(),
        })
    }
}

struct Map;

impl<R: Runtime> Function<R> for Map {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Expression, ArgType::Type(Array)], Array)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let expr = expression(args, 0)?;
        let elements = eval.runtime().iterate(value(args, 1)?);
        eval.map_elements(elements, |element| eval.evaluate(expr, element))
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        self.apply(eval, args)
    }
}

struct Max;

impl<R: Runtime> Function<R> for Max {
    fn signature(&self) -> Signature {
        Signature::new(vec![SORTABLE], RuntimeType::Any)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        min_or_max(eval, "max", args, Ordering::Greater)
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        Ok(any_element(eval.runtime(), value(args, 0)?))
    }
}

struct Min;

impl<R: Runtime> Function<R> for Min {
    fn signature(&self) -> Signature {
        Signature::new(vec![SORTABLE], RuntimeType::Any)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        min_or_max(eval, "min", args, Ordering::Less)
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        Ok(any_element(eval.runtime(), value(args, 0)?))
    }
}

struct MaxBy;

impl<R: Runtime> Function<R> for MaxBy {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Array), ArgType::Expression], RuntimeType::Any)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        min_or_max_by(eval, "max_by", args, Ordering::Greater)
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        Ok(any_element(eval.runtime(), value(args, 0)?))
    }
}

struct MinBy;

impl<R: Runtime> Function<R> for MinBy {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Array), ArgType::Expression], RuntimeType::Any)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        min_or_max_by(eval, "min_by", args, Ordering::Less)
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        Ok(any_element(eval.runtime(), value(args, 0)?))
    }
}

struct Merge;

impl<R: Runtime> Function<R> for Merge {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Object)], Object).variadic(ArgType::Type(Object))
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let mut builder = eval.runtime().object_builder();
        for index in 0..args.len() {
            builder.put_all(value(args, index)?.clone());
        }
        Ok(builder.build())
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        self.apply(eval, args)
    }
}

struct NotNull;

impl<R: Runtime> Function<R> for NotNull {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Any], RuntimeType::Any).variadic(ArgType::Any)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let mut result = rt.create_null();
        // from the back, so earlier arguments take precedence
        for index in (0..args.len()).rev() {
            let arg = value(args, index)?;
            result = eval.branch(rt.classify(arg, Null), || Ok(result.clone()), || Ok(arg.clone()))?;
        }
        Ok(result)
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        self.apply(eval, args)
    }
}

struct Reverse;

impl<R: Runtime> Function<R> for Reverse {
    fn signature(&self) -> Signature {
        Signature::new(vec![STRING_OR_ARRAY], RuntimeType::Any)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let subject = value(args, 0)?;
        eval.branch(
            rt.classify(subject, Str),
            || {
                Ok(match rt.as_str(subject) {
                    Some(s) => rt.create_string(&s.chars().rev().collect::<String>()),
                    None => rt.create_any(Str),
                })
            },
            || eval.map_elements(rt.iterate(subject).reversed(), |item| Ok(item.clone())),
        )
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        self.apply(eval, args)
    }
}

struct Sort;

impl<R: Runtime> Function<R> for Sort {
    fn signature(&self) -> Signature {
        Signature::new(vec![SORTABLE], Array)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let mut items = items(rt, value(args, 0)?);
        check_sortable(rt, "sort", 1, "array of number or array of string", &items)?;
        items.sort_by(|a, b| rt.compare(a, b).unwrap_or(Ordering::Equal));

        let mut builder = rt.array_builder();
        for item in items {
            builder.add(item);
        }
        Ok(builder.build())
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        permuted(eval, value(args, 0)?)
    }
}

struct SortBy;

impl<R: Runtime> Function<R> for SortBy {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Type(Array), ArgType::Expression], Array)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let items = items(rt, value(args, 0)?);
        let keys = sort_keys(eval, "sort_by", &items, expression(args, 1)?)?;

        let mut pairs: Vec<(R::Value, R::Value)> = keys.into_iter().zip(items).collect();
        pairs.sort_by(|(a, _), (b, _)| rt.compare(a, b).unwrap_or(Ordering::Equal));

        let mut builder = rt.array_builder();
        for (_, item) in pairs {
            builder.add(item);
        }
        Ok(builder.build())
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        permuted(eval, value(args, 0)?)
    }
}

struct Sum;

impl<R: Runtime> Function<R> for Sum {
    fn signature(&self) -> Signature {
        Signature::new(vec![NUMBERS], Num)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let numbers = items(rt, value(args, 0)?)
            .iter()
            .map(|item| number(rt, item))
            .collect::<Result<Vec<_>, _>>()?;

        let total = decimal_sum(&numbers)
            .map(Number::from_decimal)
            .unwrap_or_else(|| Number::Float(numbers.iter().map(|n| n.as_f64()).sum()));
        Ok(rt.create_number(total))
    }
}

struct ToArray;

impl<R: Runtime> Function<R> for ToArray {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Any], Array)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let arg = value(args, 0)?;
        eval.branch(
            rt.classify(arg, Array),
            || Ok(arg.clone()),
            || {
                let mut builder = rt.array_builder();
                builder.add(arg.clone());
                Ok(builder.build())
            },
        )
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        self.apply(eval, args)
    }
}

struct ToNumber;

impl<R: Runtime> Function<R> for ToNumber {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Any], Num)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let arg = value(args, 0)?;
        Ok(match rt.type_of(arg) {
            Num => arg.clone(),
            Str => match rt.as_str(arg).and_then(Number::parse) {
                Some(n) => rt.create_number(n),
                None => rt.create_null(),
            },
            _ => rt.create_null(),
        })
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, _args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        Ok(rt.either(&rt.create_null(), &rt.create_any(Num)))
    }
}

struct ToText;

impl<R: Runtime> Function<R> for ToText {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Any], Str)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let arg = value(args, 0)?;
        if rt.is(arg, Str) {
            return Ok(arg.clone());
        }
        let json = serde_json::to_string(&to_serde_json(rt, arg))
            .map_err(|e| EvalError::InvalidValue(format!("cannot encode value: {e}")))?;
        Ok(rt.create_string(&json))
    }
}

struct Type;

impl<R: Runtime> Function<R> for Type {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Any], Str)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        Ok(rt.create_string(rt.type_of(value(args, 0)?).name()))
    }
}

/// `either(a, b)`: `a` when it is a non-empty array, else `b`; abstractly
/// the union of both.
struct Either;

impl<R: Runtime> Function<R> for Either {
    fn signature(&self) -> Signature {
        Signature::new(vec![ArgType::Any, ArgType::Any], RuntimeType::Any)
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        Ok(eval.runtime().either(value(args, 0)?, value(args, 1)?))
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        self.apply(eval, args)
    }
}

/// `fold_left(init, &expr, array)`: `expr` sees `{acc, element}` for every
/// element and its result becomes the next `acc`.
struct FoldLeft;

impl<R: Runtime> Function<R> for FoldLeft {
    fn signature(&self) -> Signature {
        Signature::new(
            vec![ArgType::Any, ArgType::Expression, ArgType::Type(Array)],
            RuntimeType::Any,
        )
    }

    fn apply(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        let rt = eval.runtime();
        let init = value(args, 0)?.clone();
        let expr = expression(args, 1)?;
        let elements = rt.iterate(value(args, 2)?);

        eval.fold_left(init, elements, |acc, element| {
            let mut context = rt.object_builder();
            context.put("acc".to_string(), acc.clone());
            context.put("element".to_string(), element.clone());
            eval.evaluate(expr, &context.build())
        })
    }

    fn apply_abstract(&self, eval: &Evaluator<'_, R>, args: Args<'_, '_, R::Value>) -> Result<R::Value, EvalError> {
        self.apply(eval, args)
    }
}
