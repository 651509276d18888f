//! Operators, subscripts and iteration over runtime values.
//!
//! Everything here is pure: no environment, no world. Short-circuiting
//! `and`/`or` live in the evaluator because they must not evaluate both sides.

use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use rover_types::ast::{BinOp, UnaryOp};
use std::cmp::Ordering;

/// Longest string or list an operator or `range()` may build. Lists built by
/// `+` and `*` are measured by deep weight (see [`Value::extent`]).
pub const MAX_SEQUENCE_LEN: usize = 1_000_000;

// ══════════════════════════════════════════════════════════════════════════════
// Binary operators
// ══════════════════════════════════════════════════════════════════════════════

/// Apply a non-short-circuiting binary operator.
pub fn binary(op: BinOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub => arith(op, left, right, i64::checked_sub, |a, b| a - b),
        BinOp::Mul => mul(left, right),
        BinOp::Div => div(left, right),
        BinOp::FloorDiv => floor_div(left, right),
        BinOp::Mod => modulo(left, right),
        BinOp::Eq => Ok(Value::Bool(left == right)),
        BinOp::NotEq => Ok(Value::Bool(left != right)),
        BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
            compare(op, left, right)
        }
        BinOp::In => Ok(Value::Bool(contains(right, left)?)),
        BinOp::NotIn => Ok(Value::Bool(!contains(right, left)?)),
        BinOp::And | BinOp::Or => Err(EvalError::Type(format!(
            "'{}' must be evaluated lazily",
            op.as_str()
        ))),
    }
}

fn unsupported(op: BinOp, left: &Value, right: &Value) -> EvalError {
    EvalError::Type(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.as_str(),
        left.type_name(),
        right.type_name()
    ))
}

/// Shared int/float arithmetic: checked on ints, promoted to float otherwise.
fn arith(
    op: BinOp,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b)
            .map(Value::Int)
            .ok_or_else(EvalError::overflow),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(unsupported(op, left, right)),
        },
    }
}

fn add(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => {
            check_len(a.len() + b.len())?;
            Ok(Value::Str(format!("{a}{b}")))
        }
        (Value::List(a), Value::List(b)) => {
            check_len(weight(a).saturating_add(weight(b)))?;
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        _ => arith(BinOp::Add, left, right, i64::checked_add, |a, b| a + b),
    }
}

fn mul(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            let n = repeat_count(s.len(), *n)?;
            Ok(Value::Str(s.repeat(n)))
        }
        (Value::List(items), Value::Int(n)) | (Value::Int(n), Value::List(items)) => {
            let n = repeat_count(weight(items), *n)?;
            let mut out = Vec::with_capacity(items.len() * n);
            for _ in 0..n {
                out.extend(items.iter().cloned());
            }
            Ok(Value::List(out))
        }
        _ => arith(BinOp::Mul, left, right, i64::checked_mul, |a, b| a * b),
    }
}

/// Negative counts repeat zero times.
fn repeat_count(len: usize, n: i64) -> EvalResult<usize> {
    let n = usize::try_from(n.max(0)).unwrap_or(usize::MAX);
    check_len(len.saturating_mul(n))?;
    Ok(n)
}

/// Deep weight of a list's contents, never less than its length.
fn weight(items: &[Value]) -> usize {
    let total = items
        .iter()
        .fold(items.len() as u64, |w, item| w.saturating_add(item.extent().0));
    usize::try_from(total).unwrap_or(usize::MAX)
}

fn check_len(len: usize) -> EvalResult<()> {
    if len > MAX_SEQUENCE_LEN {
        Err(EvalError::Value(format!(
            "sequence too long ({len} > {MAX_SEQUENCE_LEN})"
        )))
    } else {
        Ok(())
    }
}

fn div(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left.as_f64(), right.as_f64()) {
        (Some(_), Some(b)) if b == 0.0 => Err(EvalError::ZeroDivision("division by zero".into())),
        (Some(a), Some(b)) => Ok(Value::Float(a / b)),
        _ => Err(unsupported(BinOp::Div, left, right)),
    }
}

fn floor_div(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Int(_), Value::Int(0)) => Err(EvalError::ZeroDivision(
            "integer division or modulo by zero".into(),
        )),
        (Value::Int(a), Value::Int(b)) => {
            let q = a.checked_div(*b).ok_or_else(EvalError::overflow)?;
            let r = a.checked_rem(*b).ok_or_else(EvalError::overflow)?;
            let q = if r != 0 && (r < 0) != (*b < 0) { q - 1 } else { q };
            Ok(Value::Int(q))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(_), Some(b)) if b == 0.0 => Err(EvalError::ZeroDivision(
                "float floor division by zero".into(),
            )),
            (Some(a), Some(b)) => Ok(Value::Float((a / b).floor())),
            _ => Err(unsupported(BinOp::FloorDiv, left, right)),
        },
    }
}

/// The result takes the sign of the divisor.
fn modulo(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Int(_), Value::Int(0)) => {
            Err(EvalError::ZeroDivision("integer modulo by zero".into()))
        }
        (Value::Int(a), Value::Int(b)) => {
            let r = a.checked_rem(*b).ok_or_else(EvalError::overflow)?;
            let r = if r != 0 && (r < 0) != (*b < 0) { r + b } else { r };
            Ok(Value::Int(r))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(_), Some(b)) if b == 0.0 => {
                Err(EvalError::ZeroDivision("float modulo".into()))
            }
            (Some(a), Some(b)) => {
                let r = a % b;
                let r = if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r };
                Ok(Value::Float(r))
            }
            _ => Err(unsupported(BinOp::Mod, left, right)),
        },
    }
}

fn compare(op: BinOp, left: &Value, right: &Value) -> EvalResult<Value> {
    let ord = left.compare(right).ok_or_else(|| {
        EvalError::Type(format!(
            "'{}' not supported between instances of '{}' and '{}'",
            op.as_str(),
            left.type_name(),
            right.type_name()
        ))
    })?;
    let result = match op {
        BinOp::Less => ord == Ordering::Less,
        BinOp::Greater => ord == Ordering::Greater,
        BinOp::LessEq => ord != Ordering::Greater,
        _ => ord != Ordering::Less,
    };
    Ok(Value::Bool(result))
}

/// `item in container`.
pub fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::List(items) => Ok(items.contains(item)),
        Value::Str(s) => match item {
            Value::Str(needle) => Ok(s.contains(needle.as_str())),
            other => Err(EvalError::Type(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::Dict(entries) => {
            require_hashable(item)?;
            Ok(Value::dict_get(entries, item).is_some())
        }
        other => Err(EvalError::Type(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Unary operators
// ══════════════════════════════════════════════════════════════════════════════

pub fn unary(op: UnaryOp, operand: &Value) -> EvalResult<Value> {
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(EvalError::overflow),
        (UnaryOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
        (UnaryOp::Pos, Value::Int(_) | Value::Float(_)) => Ok(operand.clone()),
        (_, v) => {
            let sym = if op == UnaryOp::Neg { "-" } else { "+" };
            Err(EvalError::Type(format!(
                "bad operand type for unary {sym}: '{}'",
                v.type_name()
            )))
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Subscripts
// ══════════════════════════════════════════════════════════════════════════════

pub(crate) fn require_hashable(key: &Value) -> EvalResult<()> {
    if key.is_hashable() {
        Ok(())
    } else {
        Err(EvalError::Type(format!(
            "unhashable type: '{}'",
            key.type_name()
        )))
    }
}

fn require_int_index(container: &Value, index: &Value) -> EvalResult<i64> {
    match index {
        Value::Int(i) => Ok(*i),
        other => Err(EvalError::Type(format!(
            "{} indices must be integers, not {}",
            container.type_name(),
            other.type_name()
        ))),
    }
}

/// Resolve a possibly negative index against `len`.
fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let i = if i < 0 { i + len } else { i };
    if (0..len).contains(&i) {
        usize::try_from(i).ok()
    } else {
        None
    }
}

/// `container[index]`.
pub fn index(container: &Value, index: &Value) -> EvalResult<Value> {
    match container {
        Value::List(items) => {
            let i = require_int_index(container, index)?;
            normalize_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| EvalError::Index("list index out of range".into()))
        }
        Value::Str(s) => {
            let i = require_int_index(container, index)?;
            let chars: Vec<char> = s.chars().collect();
            normalize_index(i, chars.len())
                .map(|i| Value::Str(chars[i].to_string()))
                .ok_or_else(|| EvalError::Index("string index out of range".into()))
        }
        Value::Dict(entries) => {
            require_hashable(index)?;
            Value::dict_get(entries, index)
                .cloned()
                .ok_or_else(|| EvalError::Key(index.repr()))
        }
        other => Err(not_subscriptable(other)),
    }
}

fn not_subscriptable(value: &Value) -> EvalError {
    EvalError::Type(format!(
        "'{}' object is not subscriptable",
        value.type_name()
    ))
}

/// Mutable access to `container[index]`, for nested assignment and
/// mutating method calls.
pub fn index_mut<'a>(container: &'a mut Value, index: &Value) -> EvalResult<&'a mut Value> {
    match container {
        Value::List(items) => {
            let i = match index {
                Value::Int(i) => *i,
                other => {
                    return Err(EvalError::Type(format!(
                        "list indices must be integers, not {}",
                        other.type_name()
                    )))
                }
            };
            let slot = normalize_index(i, items.len())
                .ok_or_else(|| EvalError::Index("list index out of range".into()))?;
            Ok(&mut items[slot])
        }
        Value::Dict(entries) => {
            require_hashable(index)?;
            entries
                .iter_mut()
                .find(|(k, _)| k == index)
                .map(|(_, v)| v)
                .ok_or_else(|| EvalError::Key(index.repr()))
        }
        other => Err(not_subscriptable(other)),
    }
}

/// `container[index] = value`, in place.
pub fn set_index(container: &mut Value, index: Value, value: Value) -> EvalResult<()> {
    match container {
        Value::List(items) => {
            let i = match index {
                Value::Int(i) => i,
                other => {
                    return Err(EvalError::Type(format!(
                        "list indices must be integers, not {}",
                        other.type_name()
                    )))
                }
            };
            let slot = normalize_index(i, items.len())
                .ok_or_else(|| EvalError::Index("list assignment index out of range".into()))?;
            items[slot] = value;
            Ok(())
        }
        Value::Dict(entries) => {
            require_hashable(&index)?;
            match entries.iter_mut().find(|(k, _)| *k == index) {
                Some((_, slot)) => *slot = value,
                None => entries.push((index, value)),
            }
            Ok(())
        }
        other => Err(EvalError::Type(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

/// Clamp one slice bound the way Python does.
fn slice_bound(bound: Option<&Value>, len: usize, default: usize) -> EvalResult<usize> {
    let i = match bound {
        None | Some(Value::None) => return Ok(default),
        Some(Value::Int(i)) => *i,
        Some(other) => {
            return Err(EvalError::Type(format!(
                "slice indices must be integers or None, not {}",
                other.type_name()
            )))
        }
    };
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let i = if i < 0 { (i + len_i).max(0) } else { i.min(len_i) };
    Ok(usize::try_from(i).unwrap_or(0))
}

/// `container[start:stop]`. Out-of-range bounds clamp.
pub fn slice(container: &Value, start: Option<&Value>, stop: Option<&Value>) -> EvalResult<Value> {
    match container {
        Value::List(items) => {
            let a = slice_bound(start, items.len(), 0)?;
            let b = slice_bound(stop, items.len(), items.len())?;
            Ok(Value::List(if a < b { items[a..b].to_vec() } else { Vec::new() }))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let a = slice_bound(start, chars.len(), 0)?;
            let b = slice_bound(stop, chars.len(), chars.len())?;
            Ok(Value::Str(if a < b {
                chars[a..b].iter().collect()
            } else {
                String::new()
            }))
        }
        other => Err(not_subscriptable(other)),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Iteration
// ══════════════════════════════════════════════════════════════════════════════

/// Elements of a list, characters of a string, or keys of a dict.
pub fn iterate(value: &Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Dict(entries) => Ok(entries.iter().map(|(k, _)| k.clone()).collect()),
        other => Err(EvalError::Type(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

/// Number of values `range(start, stop, step)` yields. `step` must be non-zero.
pub fn range_len(start: i64, stop: i64, step: i64) -> u64 {
    let (lo, hi, step) = if step > 0 {
        (start as i128, stop as i128, step as i128)
    } else {
        (stop as i128, start as i128, -(step as i128))
    };
    if hi <= lo {
        0
    } else {
        ((hi - lo + step - 1) / step) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Int(n)
    }

    #[test]
    fn test_true_division_is_float() {
        assert_eq!(binary(BinOp::Div, &int(7), &int(2)), Ok(Value::Float(3.5)));
        assert_eq!(binary(BinOp::Div, &int(4), &int(2)), Ok(Value::Float(2.0)));
    }

    #[test]
    fn test_floor_div_and_mod_follow_divisor_sign() {
        assert_eq!(binary(BinOp::FloorDiv, &int(7), &int(2)), Ok(int(3)));
        assert_eq!(binary(BinOp::FloorDiv, &int(-7), &int(2)), Ok(int(-4)));
        assert_eq!(binary(BinOp::Mod, &int(-7), &int(3)), Ok(int(2)));
        assert_eq!(binary(BinOp::Mod, &int(7), &int(-3)), Ok(int(-2)));
        assert_eq!(
            binary(BinOp::Mod, &Value::Float(-1.5), &int(1)),
            Ok(Value::Float(0.5))
        );
    }

    #[test]
    fn test_division_by_zero() {
        for op in [BinOp::Div, BinOp::FloorDiv, BinOp::Mod] {
            let err = binary(op, &int(1), &int(0)).unwrap_err();
            assert!(matches!(err, EvalError::ZeroDivision(_)), "{op:?}");
        }
        assert!(matches!(
            binary(BinOp::Div, &Value::Float(1.0), &Value::Float(0.0)),
            Err(EvalError::ZeroDivision(_))
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert_eq!(
            binary(BinOp::Add, &int(i64::MAX), &int(1)),
            Err(EvalError::overflow())
        );
        assert_eq!(unary(UnaryOp::Neg, &int(i64::MIN)), Err(EvalError::overflow()));
        assert_eq!(
            binary(BinOp::FloorDiv, &int(i64::MIN), &int(-1)),
            Err(EvalError::overflow())
        );
    }

    #[test]
    fn test_concat_and_repeat() {
        assert_eq!(
            binary(BinOp::Add, &"ab".into(), &"cd".into()),
            Ok(Value::from("abcd"))
        );
        assert_eq!(binary(BinOp::Mul, &int(3), &"ab".into()), Ok(Value::from("ababab")));
        assert_eq!(
            binary(BinOp::Mul, &Value::List(vec![int(0)]), &int(2)),
            Ok(Value::List(vec![int(0), int(0)]))
        );
        assert_eq!(binary(BinOp::Mul, &"x".into(), &int(-2)), Ok(Value::from("")));
        assert!(matches!(
            binary(BinOp::Mul, &"xx".into(), &int(i64::MAX)),
            Err(EvalError::Value(_))
        ));
    }

    #[test]
    fn test_repeat_measures_nested_weight() {
        let wide = Value::from("a".repeat(640_000));
        let list = Value::List(vec![wide.clone()]);
        assert!(matches!(
            binary(BinOp::Mul, &list, &int(1_000_000)),
            Err(EvalError::Value(_))
        ));
        assert!(matches!(
            binary(BinOp::Add, &list, &Value::List(vec![wide; 100])),
            Err(EvalError::Value(_))
        ));
        let Ok(Value::List(items)) = binary(BinOp::Mul, &list, &int(20)) else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 20);
    }

    #[test]
    fn test_mixed_types_rejected() {
        let err = binary(BinOp::Add, &int(1), &"a".into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: unsupported operand type(s) for +: 'int' and 'str'"
        );
        let err = binary(BinOp::Less, &int(1), &"a".into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: '<' not supported between instances of 'int' and 'str'"
        );
        assert!(binary(BinOp::Add, &Value::Bool(true), &int(1)).is_err());
    }

    #[test]
    fn test_membership() {
        let list = Value::List(vec![int(1), "a".into()]);
        assert_eq!(binary(BinOp::In, &"a".into(), &list), Ok(Value::Bool(true)));
        assert_eq!(binary(BinOp::NotIn, &int(2), &list), Ok(Value::Bool(true)));
        assert_eq!(binary(BinOp::In, &"ell".into(), &"hello".into()), Ok(Value::Bool(true)));
        let dict = Value::Dict(vec![("k".into(), int(1))]);
        assert_eq!(contains(&dict, &"k".into()), Ok(true));
        assert!(contains(&dict, &Value::List(vec![])).is_err());
        assert!(contains(&int(3), &int(3)).is_err());
    }

    #[test]
    fn test_index_wraps_negative() {
        let list = Value::List(vec![int(10), int(20), int(30)]);
        assert_eq!(index(&list, &int(-1)), Ok(int(30)));
        assert_eq!(index(&"héllo".into(), &int(1)), Ok(Value::from("é")));
        assert_eq!(
            index(&list, &int(3)),
            Err(EvalError::Index("list index out of range".into()))
        );
        assert!(matches!(index(&list, &"0".into()), Err(EvalError::Type(_))));
    }

    #[test]
    fn test_dict_missing_key() {
        let dict = Value::Dict(vec![]);
        let err = index(&dict, &"gold".into()).unwrap_err();
        assert_eq!(err.to_string(), "KeyError: 'gold'");
    }

    #[test]
    fn test_slice_clamps() {
        let s: Value = "rover".into();
        assert_eq!(slice(&s, Some(&int(1)), Some(&int(3))), Ok(Value::from("ov")));
        assert_eq!(slice(&s, Some(&int(-3)), None), Ok(Value::from("ver")));
        assert_eq!(slice(&s, Some(&int(4)), Some(&int(100))), Ok(Value::from("r")));
        assert_eq!(slice(&s, Some(&int(3)), Some(&int(1))), Ok(Value::from("")));
        let list = Value::List(vec![int(1), int(2)]);
        assert_eq!(slice(&list, None, None), Ok(list.clone()));
    }

    #[test]
    fn test_set_index() {
        let mut list = Value::List(vec![int(1), int(2)]);
        set_index(&mut list, int(-1), int(9)).unwrap();
        assert_eq!(list, Value::List(vec![int(1), int(9)]));
        assert!(matches!(
            set_index(&mut list, int(5), int(0)),
            Err(EvalError::Index(_))
        ));

        let mut dict = Value::Dict(vec![]);
        set_index(&mut dict, "a".into(), int(1)).unwrap();
        set_index(&mut dict, "a".into(), int(2)).unwrap();
        assert_eq!(dict, Value::Dict(vec![("a".into(), int(2))]));

        let mut s: Value = "abc".into();
        assert!(matches!(set_index(&mut s, int(0), "x".into()), Err(EvalError::Type(_))));
    }

    #[test]
    fn test_range_len() {
        assert_eq!(range_len(0, 5, 1), 5);
        assert_eq!(range_len(2, 5, 2), 2);
        assert_eq!(range_len(5, 0, -2), 3);
        assert_eq!(range_len(5, 0, 1), 0);
        assert_eq!(range_len(i64::MIN, i64::MAX, 1), u64::MAX);
    }
}
