//! Runtime values.

use std::cmp::Ordering;
use std::fmt;

/// Deepest nesting of lists and dicts a value may reach.
pub const MAX_VALUE_DEPTH: usize = 64;

/// String bytes that weigh as much as one list element.
const STR_BYTES_PER_UNIT: usize = 64;

/// A runtime value.
///
/// Lists and dicts have value semantics: assigning one copies it. Mutation
/// through index assignment or `append`/`pop` updates the variable that
/// holds it.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Insertion-ordered key/value pairs.
    Dict(Vec<(Value, Value)>),
}

impl Value {
    /// The Python-style type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.is_empty(),
        }
    }

    /// Numeric view of an int or float. Bools are not numbers here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether this value may be used as a dict key.
    pub fn is_hashable(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Dict(_))
    }

    /// Python `repr()`: strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => quote(s),
            other => other.to_string(),
        }
    }

    /// Ordering for `<`, `>`, `min`, `max`. `None` when the two values
    /// cannot be compared.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    if x != y {
                        return x.compare(y);
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    /// Storage weight and nesting depth, measured together.
    ///
    /// Weight is one unit per list element or dict entry plus one per 64
    /// string bytes, summed through nested values. Scalars weigh nothing and
    /// have depth 0; each list or dict level adds 1 to the depth.
    pub fn extent(&self) -> (u64, usize) {
        match self {
            Value::Str(s) => ((s.len() / STR_BYTES_PER_UNIT) as u64, 0),
            Value::List(items) => items.iter().fold((items.len() as u64, 1), |(w, d), item| {
                let (iw, id) = item.extent();
                (w.saturating_add(iw), d.max(id + 1))
            }),
            Value::Dict(entries) => {
                entries
                    .iter()
                    .fold((entries.len() as u64, 1), |(w, d), (k, v)| {
                        let (kw, _) = k.extent();
                        let (vw, vd) = v.extent();
                        (w.saturating_add(kw).saturating_add(vw), d.max(vd + 1))
                    })
            }
            Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_) => (0, 0),
        }
    }

    /// Look up `key` in a dict's entries.
    pub fn dict_get<'a>(entries: &'a [(Value, Value)], key: &Value) -> Option<&'a Value> {
        entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .all(|(k, v)| Value::dict_get(b, k).is_some_and(|w| v == w))
            }
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

/// Python `str()`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => f.write_str(&format_float(*n)),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str("]")
            }
            Value::Dict(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k.repr(), v.repr())?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Shortest round-tripping form, always with a decimal point or exponent.
fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "nan".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.into();
    }
    let abs = n.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let sci = format!("{n:e}");
        let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }
    let s = n.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

fn quote(s: &str) -> String {
    let q = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_of_scalars() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Int(-15).to_string(), "-15");
        assert_eq!(Value::Str("hi".into()).to_string(), "hi");
    }

    #[test]
    fn test_str_of_floats() {
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(0.1).to_string(), "0.1");
        assert_eq!(Value::Float(-3.5).to_string(), "-3.5");
        assert_eq!(Value::Float(1e20).to_string(), "1e+20");
        assert_eq!(Value::Float(1.5e-7).to_string(), "1.5e-07");
        assert_eq!(Value::Float(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn test_str_of_collections_uses_repr() {
        let list = Value::List(vec![Value::Int(1), "a".into(), Value::None]);
        assert_eq!(list.to_string(), "[1, 'a', None]");
        let dict = Value::Dict(vec![("k".into(), Value::List(vec![]))]);
        assert_eq!(dict.to_string(), "{'k': []}");
        assert_eq!(Value::Str("it's".into()).repr(), "\"it's\"");
        assert_eq!(Value::Str("a\nb".into()).repr(), "'a\\nb'");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::List(vec![Value::None]).is_truthy());
    }

    #[test]
    fn test_equality() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Bool(true), Value::Int(1));
        assert_ne!(Value::Str("1".into()), Value::Int(1));
        let a = Value::Dict(vec![("x".into(), 1.into()), ("y".into(), 2.into())]);
        let b = Value::Dict(vec![("y".into(), 2.into()), ("x".into(), 1.into())]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_extent() {
        assert_eq!(Value::Int(7).extent(), (0, 0));
        assert_eq!(Value::from("a".repeat(640)).extent(), (10, 0));
        let inner = Value::List(vec![1.into(), 2.into()]);
        assert_eq!(inner.extent(), (2, 1));
        let outer = Value::List(vec![inner.clone(), inner.clone(), Value::None]);
        assert_eq!(outer.extent(), (7, 2));
        let dict = Value::Dict(vec![("k".into(), outer)]);
        assert_eq!(dict.extent(), (8, 3));
    }

    #[test]
    fn test_compare() {
        assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Some(Ordering::Less));
        assert_eq!(
            Value::from("b").compare(&Value::from("abc")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::List(vec![1.into(), 2.into()]).compare(&Value::List(vec![1.into()])),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(1).compare(&Value::from("1")), None);
        assert_eq!(Value::Bool(true).compare(&Value::Int(0)), None);
    }
}
