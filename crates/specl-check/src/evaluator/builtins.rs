//! Built-in function table and method-style call dispatch.
//!
//! Resolution order for `FunctionCall` nodes:
//! 1. the fixed built-in table below;
//! 2. dotted names (`user.email.endsWith`): the left-hand path resolves
//!    through scope variables, input fields, and the result value, then a
//!    small fixed set of string/array methods dispatches on the resolved
//!    value;
//! 3. anything else evaluates to null -- specification authors may reference
//!    host-environment helpers the evaluator does not model.
//!
//! `timing_safe_comparison` and `never_appears_in` are declarative markers:
//! they always evaluate true in simulation and make no real constant-time
//! or leak-freedom guarantee.

use specl_core::context::EvalContext;
use specl_core::value::Value;

use super::coerce::{as_number, as_string, deep_equal};

/// Dispatches a function call with pre-evaluated arguments.
pub fn call(name: &str, args: &[Value], ctx: &EvalContext) -> Value {
    match name {
        "now" => Value::Number(ctx.now as f64),
        "length" | "count" => Value::Number(length_of(args.first())),
        "sum" => Value::Number(numbers_in(args).iter().sum()),
        "min" => fold_numbers(args, f64::min),
        "max" => fold_numbers(args, f64::max),
        "abs" => unary_number(args, f64::abs),
        "round" => unary_number(args, f64::round),
        "floor" => unary_number(args, f64::floor),
        "ceil" => unary_number(args, f64::ceil),
        "between" => match args {
            [target, min, max] => {
                let t = as_number(target);
                Value::Bool(as_number(min) <= t && t <= as_number(max))
            }
            _ => Value::Null,
        },
        // Simulation stand-ins, kept as declarative markers only.
        "timing_safe_comparison" | "never_appears_in" => Value::Bool(true),
        dotted if dotted.contains('.') => dispatch_method(dotted, args, ctx),
        _ => Value::Null,
    }
}

fn length_of(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Str(s)) => s.chars().count() as f64,
        Some(Value::List(items)) => items.len() as f64,
        Some(Value::Map(fields)) => fields.len() as f64,
        _ => 0.0,
    }
}

/// Flattens arguments for the aggregate built-ins: a single list argument
/// aggregates over its items, otherwise over the arguments themselves.
fn numbers_in(args: &[Value]) -> Vec<f64> {
    match args {
        [Value::List(items)] => items.iter().map(as_number).collect(),
        _ => args.iter().map(as_number).collect(),
    }
}

fn fold_numbers(args: &[Value], f: impl Fn(f64, f64) -> f64) -> Value {
    numbers_in(args)
        .into_iter()
        .reduce(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn unary_number(args: &[Value], f: impl Fn(f64) -> f64) -> Value {
    match args.first() {
        Some(v) => Value::Number(f(as_number(v))),
        None => Value::Null,
    }
}

/// Resolves `path.to.receiver.method(args)` and dispatches the method.
fn dispatch_method(dotted: &str, args: &[Value], ctx: &EvalContext) -> Value {
    let segments: Vec<&str> = dotted.split('.').collect();
    let (method, path) = match segments.split_last() {
        Some((method, path)) if !path.is_empty() => (*method, path),
        _ => return Value::Null,
    };
    let Some(receiver) = resolve_path(path, ctx) else {
        return Value::Null;
    };

    match method {
        "length" => Value::Number(length_of(Some(&receiver))),
        "includes" | "contains" => match &receiver {
            Value::Str(s) => Value::Bool(args.first().is_some_and(|n| s.contains(&as_string(n)))),
            Value::List(items) => Value::Bool(
                args.first()
                    .is_some_and(|n| items.iter().any(|item| deep_equal(item, n))),
            ),
            _ => Value::Bool(false),
        },
        "startsWith" | "starts_with" => string_method(&receiver, args, |s, n| s.starts_with(n)),
        "endsWith" | "ends_with" => string_method(&receiver, args, |s, n| s.ends_with(n)),
        "toLowerCase" | "to_lower_case" => Value::Str(as_string(&receiver).to_lowercase()),
        "toUpperCase" | "to_upper_case" => Value::Str(as_string(&receiver).to_uppercase()),
        "trim" => Value::Str(as_string(&receiver).trim().to_string()),
        "isEmpty" | "is_empty" => Value::Bool(length_of(Some(&receiver)) == 0.0),
        _ => Value::Null,
    }
}

fn string_method(receiver: &Value, args: &[Value], f: impl Fn(&str, &str) -> bool) -> Value {
    let s = as_string(receiver);
    match args.first() {
        Some(needle) => Value::Bool(f(&s, &as_string(needle))),
        None => Value::Bool(false),
    }
}

/// Walks a dotted path through the context: the root segment resolves as
/// `result`, `input`, a scope variable, or an input field; the remaining
/// segments are field accesses.
fn resolve_path(path: &[&str], ctx: &EvalContext) -> Option<Value> {
    let root = match path[0] {
        "result" => ctx.result.cloned()?,
        "input" => ctx.input.clone(),
        name => ctx
            .lookup_var(name)
            .or_else(|| ctx.input.field(name))
            .cloned()?,
    };
    path[1..]
        .iter()
        .try_fold(root, |value, segment| value.field(segment).cloned())
}
