//! Printing, truthiness and comparison of JSON values during execution.
//!
//! A lookup that finds nothing is represented as `None` ([`Datum`]); a JSON `null` is
//! `Some(Value::Null)`. Both print as [`NO_VALUE`].

use std::cmp::Ordering;

use serde_json::Value;

/// Printed in place of a missing key or a null value.
pub const NO_VALUE: &str = "<no value>";

/// Printed for nil operands nested in composites or passed to `print`.
const NIL: &str = "<nil>";

pub(crate) type Datum = Option<Value>;

pub(crate) fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing value",
        Some(Value::Null) => "nil",
        Some(Value::Bool(_)) => "bool",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "map",
    }
}

/// Truth used by `if`, `with`, `and`, `or`, `not`: empty and zero values are false.
pub(crate) fn is_true(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Text emitted for an action's final value.
pub(crate) fn print_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NO_VALUE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            let mut out = String::new();
            write_nested(&mut out, other);
            out
        }
    }
}

/// Text for an operand of `print`/`println`.
pub(crate) fn print_operand(value: Option<&Value>) -> String {
    match value {
        None => NIL.to_string(),
        Some(v) => {
            let mut out = String::new();
            write_nested(&mut out, v);
            out
        }
    }
}

fn write_nested(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str(NIL),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_nested(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push_str("map[");
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(key);
                out.push(':');
                write_nested(out, item);
            }
            out.push(']');
        }
    }
}

/// Comparable view of a scalar operand.
enum Basic<'a> {
    Nil,
    Bool(bool),
    Num(f64),
    Str(&'a str),
}

fn basic(value: Option<&Value>) -> Result<Basic<'_>, String> {
    match value {
        None | Some(Value::Null) => Ok(Basic::Nil),
        Some(Value::Bool(b)) => Ok(Basic::Bool(*b)),
        Some(Value::Number(n)) => Ok(Basic::Num(n.as_f64().unwrap_or(f64::NAN))),
        Some(Value::String(s)) => Ok(Basic::Str(s)),
        Some(other) => Err(format!(
            "non-comparable type {}",
            type_name(Some(other))
        )),
    }
}

pub(crate) fn equal(a: Option<&Value>, b: Option<&Value>) -> Result<bool, String> {
    match (basic(a)?, basic(b)?) {
        (Basic::Nil, Basic::Nil) => Ok(true),
        (Basic::Nil, _) | (_, Basic::Nil) => Ok(false),
        (Basic::Bool(x), Basic::Bool(y)) => Ok(x == y),
        (Basic::Num(x), Basic::Num(y)) => Ok(x == y),
        (Basic::Str(x), Basic::Str(y)) => Ok(x == y),
        _ => Err(format!(
            "incompatible types for comparison: {} and {}",
            type_name(a),
            type_name(b)
        )),
    }
}

pub(crate) fn compare(a: Option<&Value>, b: Option<&Value>) -> Result<Ordering, String> {
    match (basic(a)?, basic(b)?) {
        (Basic::Num(x), Basic::Num(y)) => x
            .partial_cmp(&y)
            .ok_or_else(|| "invalid number for comparison".to_string()),
        (Basic::Str(x), Basic::Str(y)) => Ok(x.cmp(y)),
        (Basic::Num(_), Basic::Str(_)) | (Basic::Str(_), Basic::Num(_)) => Err(format!(
            "incompatible types for comparison: {} and {}",
            type_name(a),
            type_name(b)
        )),
        _ => Err(format!(
            "invalid type for comparison: {} and {}",
            type_name(a),
            type_name(b)
        )),
    }
}
