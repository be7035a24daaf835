//! Walks the parsed tree against a JSON value.

use serde_json::Value;

use crate::error::{exec_err, Result};
use crate::funcs::{self, Func};
use crate::parse::{Arg, Branch, Command, Node, Pipeline};
use crate::value::{is_true, print_value, type_name, Datum};

pub(crate) fn execute(nodes: &[Node], data: &Value) -> Result<String> {
    let mut state = State {
        root: data,
        vars: Vec::new(),
        out: String::new(),
    };
    state.walk(data, nodes)?;
    Ok(state.out)
}

struct State<'a> {
    /// Bound to `$`.
    root: &'a Value,
    vars: Vec<(String, Value)>,
    out: String,
}

impl<'a> State<'a> {
    fn walk(&mut self, dot: &Value, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Action(pipe) => {
                    let value = self.eval_pipeline(dot, pipe)?;
                    if pipe.decl.is_empty() {
                        self.out.push_str(&print_value(value.as_ref()));
                    } else {
                        self.bind(pipe, value);
                    }
                }
                Node::If(branch) => {
                    let mark = self.vars.len();
                    let value = self.eval_pipeline(dot, &branch.pipe)?;
                    let truth = is_true(value.as_ref());
                    self.bind(&branch.pipe, value);
                    if truth {
                        self.walk(dot, &branch.body)?;
                    } else {
                        self.walk(dot, &branch.otherwise)?;
                    }
                    self.vars.truncate(mark);
                }
                Node::With(branch) => {
                    let mark = self.vars.len();
                    let value = self.eval_pipeline(dot, &branch.pipe)?;
                    self.bind(&branch.pipe, value.clone());
                    match value {
                        Some(inner) if is_true(Some(&inner)) => self.walk(&inner, &branch.body)?,
                        _ => self.walk(dot, &branch.otherwise)?,
                    }
                    self.vars.truncate(mark);
                }
                Node::Range(branch) => self.walk_range(dot, branch)?,
            }
        }
        Ok(())
    }

    fn walk_range(&mut self, dot: &Value, branch: &Branch) -> Result<()> {
        let mark = self.vars.len();
        let line = branch.pipe.line;
        let decl = &branch.pipe.decl;

        match self.eval_pipeline(dot, &branch.pipe)? {
            Some(Value::Array(items)) if !items.is_empty() => {
                for (i, item) in items.iter().enumerate() {
                    self.bind_iteration(decl, Value::from(i), item);
                    self.walk(item, &branch.body)?;
                    self.vars.truncate(mark);
                }
            }
            Some(Value::Object(map)) if !map.is_empty() => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                for (key, item) in entries {
                    self.bind_iteration(decl, Value::String(key.clone()), item);
                    self.walk(item, &branch.body)?;
                    self.vars.truncate(mark);
                }
            }
            None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => {
                self.walk(dot, &branch.otherwise)?;
            }
            Some(other) => {
                return Err(exec_err(
                    line,
                    format!(
                        "range can't iterate over {} ({})",
                        print_value(Some(&other)),
                        type_name(Some(&other))
                    ),
                ))
            }
        }
        self.vars.truncate(mark);
        Ok(())
    }

    fn bind_iteration(&mut self, decl: &[String], key: Value, item: &Value) {
        match decl {
            [elem] => self.vars.push((elem.clone(), item.clone())),
            [index, elem] => {
                self.vars.push((index.clone(), key));
                self.vars.push((elem.clone(), item.clone()));
            }
            _ => {}
        }
    }

    fn bind(&mut self, pipe: &Pipeline, value: Datum) {
        let Some(name) = pipe.decl.first() else {
            return;
        };
        let value = value.unwrap_or(Value::Null);
        if pipe.is_assign {
            if let Some(slot) = self.vars.iter_mut().rev().find(|(n, _)| n == name) {
                slot.1 = value;
            }
        } else {
            self.vars.push((name.clone(), value));
        }
    }

    fn eval_pipeline(&self, dot: &Value, pipe: &Pipeline) -> Result<Datum> {
        let mut piped: Option<Datum> = None;
        for command in &pipe.commands {
            piped = Some(self.eval_command(dot, command, piped, pipe.line)?);
        }
        Ok(piped.flatten())
    }

    fn eval_command(
        &self,
        dot: &Value,
        command: &Command,
        piped: Option<Datum>,
        line: usize,
    ) -> Result<Datum> {
        let Some((first, rest)) = command.args.split_first() else {
            return Err(exec_err(line, "missing value for command"));
        };
        match first {
            Arg::Func(func) => self.call(dot, *func, rest, piped, line),
            other if piped.is_none() => self.eval_arg(dot, other, line),
            _ => Err(exec_err(line, "can't give argument to non-function")),
        }
    }

    fn eval_arg(&self, dot: &Value, arg: &Arg, line: usize) -> Result<Datum> {
        match arg {
            Arg::Dot => Ok(Some(dot.clone())),
            Arg::Field(fields) => lookup(Some(dot), fields, line),
            Arg::Variable { name, fields } => {
                let base = if name == "$" {
                    Some(self.root)
                } else {
                    let bound = self.vars.iter().rev().find(|(n, _)| n == name);
                    match bound {
                        Some((_, value)) => Some(value),
                        None => {
                            return Err(exec_err(line, format!("undefined variable: {name}")))
                        }
                    }
                };
                lookup(base, fields, line)
            }
            Arg::Literal(value) => Ok(Some(value.clone())),
            Arg::Func(func) => self.call(dot, *func, &[], None, line),
            Arg::Pipeline(pipe) => self.eval_pipeline(dot, pipe),
        }
    }

    fn call(
        &self,
        dot: &Value,
        func: Func,
        args: &[Arg],
        piped: Option<Datum>,
        line: usize,
    ) -> Result<Datum> {
        if matches!(func, Func::And | Func::Or) {
            if args.is_empty() && piped.is_none() {
                return Err(exec_err(
                    line,
                    format!("wrong number of args for {}: want at least 1 got 0", func.name()),
                ));
            }
            let stop_on = func == Func::Or;
            let mut last = None;
            for arg in args {
                let value = self.eval_arg(dot, arg, line)?;
                if is_true(value.as_ref()) == stop_on {
                    return Ok(value);
                }
                last = value;
            }
            return Ok(piped.unwrap_or(last));
        }

        let mut values = args
            .iter()
            .map(|arg| self.eval_arg(dot, arg, line))
            .collect::<Result<Vec<_>>>()?;
        values.extend(piped);
        funcs::call(func, values)
            .map_err(|message| exec_err(line, format!("error calling {}: {message}", func.name())))
    }
}

/// Follows `.a.b.c` from `base`. Missing keys (and keys under null) yield `None`;
/// stepping into a scalar is an error.
fn lookup(base: Option<&Value>, fields: &[String], line: usize) -> Result<Datum> {
    let mut current = base;
    for field in fields {
        current = match current {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(map)) => map.get(field),
            Some(other) => {
                return Err(exec_err(
                    line,
                    format!(
                        "can't evaluate field {field} in type {}",
                        type_name(Some(other))
                    ),
                ))
            }
        };
    }
    Ok(current.cloned())
}
