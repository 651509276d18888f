//! Methods on lists, strings and dicts.

use crate::commands::Arity;
use crate::error::{EvalError, EvalResult};
use crate::ops;
use crate::value::Value;

/// Call `receiver.method(args)`. Mutating methods change `receiver` in place.
pub fn call(receiver: &mut Value, method: &str, args: Vec<Value>) -> EvalResult<Value> {
    let qualified = format!("{}.{method}", receiver.type_name());
    match receiver {
        Value::List(items) => list_method(items, method, &qualified, args),
        Value::Str(s) => str_method(s, method, &qualified, args),
        Value::Dict(entries) => dict_method(entries, method, &qualified, args),
        other => Err(no_attribute(other, method)),
    }
}

fn no_attribute(receiver: &Value, method: &str) -> EvalError {
    EvalError::Type(format!(
        "'{}' object has no attribute '{method}'",
        receiver.type_name()
    ))
}

fn arg(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or(Value::None)
}

// ── list ──────────────────────────────────────────────────────────────────────

fn list_method(
    items: &mut Vec<Value>,
    method: &str,
    qualified: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    match method {
        "append" => {
            Arity::Exact(1).check(qualified, args.len())?;
            items.push(arg(args));
            Ok(Value::None)
        }
        "pop" => {
            Arity::Range(0, 1).check(qualified, args.len())?;
            if items.is_empty() {
                return Err(EvalError::Index("pop from empty list".into()));
            }
            let i = match args.first() {
                None => -1,
                Some(Value::Int(i)) => *i,
                Some(other) => {
                    return Err(EvalError::Type(format!(
                        "'{}' object cannot be interpreted as an integer",
                        other.type_name()
                    )))
                }
            };
            let len = items.len() as i64;
            let i = if i < 0 { i + len } else { i };
            if !(0..len).contains(&i) {
                return Err(EvalError::Index("pop index out of range".into()));
            }
            Ok(items.remove(i as usize))
        }
        "index" => {
            Arity::Exact(1).check(qualified, args.len())?;
            let needle = arg(args);
            items
                .iter()
                .position(|v| *v == needle)
                .map(|i| Value::Int(i as i64))
                .ok_or_else(|| EvalError::Value(format!("{} is not in list", needle.repr())))
        }
        "count" => {
            Arity::Exact(1).check(qualified, args.len())?;
            let needle = arg(args);
            Ok(Value::Int(items.iter().filter(|v| **v == needle).count() as i64))
        }
        _ => Err(no_attribute(&Value::List(Vec::new()), method)),
    }
}

// ── str ───────────────────────────────────────────────────────────────────────

fn str_method(s: &str, method: &str, qualified: &str, args: Vec<Value>) -> EvalResult<Value> {
    match method {
        "upper" => {
            Arity::Exact(0).check(qualified, args.len())?;
            Ok(Value::Str(s.to_uppercase()))
        }
        "lower" => {
            Arity::Exact(0).check(qualified, args.len())?;
            Ok(Value::Str(s.to_lowercase()))
        }
        "count" => {
            Arity::Exact(1).check(qualified, args.len())?;
            match arg(args) {
                Value::Str(sub) if sub.is_empty() => Ok(Value::Int(s.chars().count() as i64 + 1)),
                Value::Str(sub) => Ok(Value::Int(s.matches(sub.as_str()).count() as i64)),
                other => Err(EvalError::Type(format!(
                    "must be str, not {}",
                    other.type_name()
                ))),
            }
        }
        _ => Err(no_attribute(&Value::Str(String::new()), method)),
    }
}

// ── dict ──────────────────────────────────────────────────────────────────────

fn dict_method(
    entries: &mut [(Value, Value)],
    method: &str,
    qualified: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    match method {
        "keys" => {
            Arity::Exact(0).check(qualified, args.len())?;
            Ok(Value::List(entries.iter().map(|(k, _)| k.clone()).collect()))
        }
        "values" => {
            Arity::Exact(0).check(qualified, args.len())?;
            Ok(Value::List(entries.iter().map(|(_, v)| v.clone()).collect()))
        }
        "get" => {
            Arity::Range(1, 2).check(qualified, args.len())?;
            let mut args = args.into_iter();
            let key = args.next().unwrap_or(Value::None);
            let default = args.next().unwrap_or(Value::None);
            ops::require_hashable(&key)?;
            Ok(Value::dict_get(entries, &key).cloned().unwrap_or(default))
        }
        _ => Err(no_attribute(&Value::Dict(Vec::new()), method)),
    }
}
