//! Builtin functions callable from actions.

use std::cmp::Ordering;

use serde_json::Value;

use crate::value::{compare, equal, is_true, print_operand, type_name, Datum};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Func {
    And,
    Or,
    Not,
    Len,
    Index,
    Print,
    Println,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Func {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        let func = match name {
            "and" => Func::And,
            "or" => Func::Or,
            "not" => Func::Not,
            "len" => Func::Len,
            "index" => Func::Index,
            "print" => Func::Print,
            "println" => Func::Println,
            "eq" => Func::Eq,
            "ne" => Func::Ne,
            "lt" => Func::Lt,
            "le" => Func::Le,
            "gt" => Func::Gt,
            "ge" => Func::Ge,
            _ => return None,
        };
        Some(func)
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Func::And => "and",
            Func::Or => "or",
            Func::Not => "not",
            Func::Len => "len",
            Func::Index => "index",
            Func::Print => "print",
            Func::Println => "println",
            Func::Eq => "eq",
            Func::Ne => "ne",
            Func::Lt => "lt",
            Func::Le => "le",
            Func::Gt => "gt",
            Func::Ge => "ge",
        }
    }
}

fn arity(func: Func, args: &[Datum], want: usize) -> Result<(), String> {
    if args.len() == want {
        Ok(())
    } else {
        Err(format!(
            "wrong number of args for {}: want {} got {}",
            func.name(),
            want,
            args.len()
        ))
    }
}

/// Calls an eagerly evaluated builtin. `and`/`or` short-circuit and are handled by the executor.
pub(crate) fn call(func: Func, args: Vec<Datum>) -> Result<Datum, String> {
    match func {
        Func::And | Func::Or => Err(format!("{} must be evaluated lazily", func.name())),
        Func::Not => {
            arity(func, &args, 1)?;
            Ok(Some(Value::Bool(!is_true(args[0].as_ref()))))
        }
        Func::Len => {
            arity(func, &args, 1)?;
            let len = match args[0].as_ref() {
                Some(Value::String(s)) => s.chars().count(),
                Some(Value::Array(items)) => items.len(),
                Some(Value::Object(map)) => map.len(),
                other => return Err(format!("len of {}", type_name(other))),
            };
            Ok(Some(Value::from(len)))
        }
        Func::Index => index(args),
        Func::Print => Ok(Some(Value::String(sprint(&args)))),
        Func::Println => {
            let line: Vec<String> = args.iter().map(|a| print_operand(a.as_ref())).collect();
            Ok(Some(Value::String(format!("{}\n", line.join(" ")))))
        }
        Func::Eq => {
            let Some((first, rest)) = args.split_first().filter(|(_, rest)| !rest.is_empty())
            else {
                return Err("missing argument for comparison".to_string());
            };
            for other in rest {
                if equal(first.as_ref(), other.as_ref())? {
                    return Ok(Some(Value::Bool(true)));
                }
            }
            Ok(Some(Value::Bool(false)))
        }
        Func::Ne => {
            arity(func, &args, 2)?;
            Ok(Some(Value::Bool(!equal(args[0].as_ref(), args[1].as_ref())?)))
        }
        Func::Lt | Func::Le | Func::Gt | Func::Ge => {
            arity(func, &args, 2)?;
            let ord = compare(args[0].as_ref(), args[1].as_ref())?;
            let result = match func {
                Func::Lt => ord == Ordering::Less,
                Func::Le => ord != Ordering::Greater,
                Func::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            };
            Ok(Some(Value::Bool(result)))
        }
    }
}

/// Operands are joined with a space only when neither side is a string.
fn sprint(args: &[Datum]) -> String {
    let mut out = String::new();
    let mut prev_is_string = true;
    for (i, arg) in args.iter().enumerate() {
        let is_string = matches!(arg, Some(Value::String(_)));
        if i > 0 && !is_string && !prev_is_string {
            out.push(' ');
        }
        out.push_str(&print_operand(arg.as_ref()));
        prev_is_string = is_string;
    }
    out
}

fn index(args: Vec<Datum>) -> Result<Datum, String> {
    let mut args = args.into_iter();
    let Some(mut current) = args.next() else {
        return Err("wrong number of args for index: want at least 1 got 0".to_string());
    };
    for key in args {
        current = match (current, key) {
            (None | Some(Value::Null), _) => None,
            (Some(Value::Array(mut items)), Some(Value::Number(n))) => {
                let len = items.len();
                let i = n
                    .as_u64()
                    .ok_or_else(|| format!("cannot index array with {n}"))?;
                let i = usize::try_from(i).map_err(|_| format!("index out of range: {i}"))?;
                if i >= len {
                    return Err(format!("index out of range: {i}"));
                }
                Some(items.swap_remove(i))
            }
            (Some(Value::Object(mut map)), Some(Value::String(k))) => map.remove(&k),
            (Some(container), key) => {
                return Err(format!(
                    "cannot index {} with {}",
                    type_name(Some(&container)),
                    type_name(key.as_ref())
                ))
            }
        };
    }
    Ok(current)
}
