//! Builds the node tree from lexed items and checks names that are known statically
//! (functions and variables).

use serde_json::Value;

use crate::error::{parse_err, Result};
use crate::funcs::Func;
use crate::lex::{lex, Item, Token};

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Text(String),
    Action(Pipeline),
    If(Branch),
    With(Branch),
    Range(Branch),
}

#[derive(Debug, Clone)]
pub(crate) struct Branch {
    pub(crate) pipe: Pipeline,
    pub(crate) body: Vec<Node>,
    pub(crate) otherwise: Vec<Node>,
}

#[derive(Debug, Clone)]
pub(crate) struct Pipeline {
    pub(crate) line: usize,
    /// Variables declared (`:=`) or assigned (`=`) by this pipeline.
    pub(crate) decl: Vec<String>,
    pub(crate) is_assign: bool,
    pub(crate) commands: Vec<Command>,
}

#[derive(Debug, Clone)]
pub(crate) struct Command {
    pub(crate) args: Vec<Arg>,
}

#[derive(Debug, Clone)]
pub(crate) enum Arg {
    Dot,
    Field(Vec<String>),
    Variable { name: String, fields: Vec<String> },
    Func(Func),
    Literal(Value),
    Pipeline(Pipeline),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    If,
    With,
    Range,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::If => "if",
            Kind::With => "with",
            Kind::Range => "range",
        }
    }

    fn wrap(self, branch: Branch) -> Node {
        match self {
            Kind::If => Node::If(branch),
            Kind::With => Node::With(branch),
            Kind::Range => Node::Range(branch),
        }
    }
}

/// Why a node list stopped.
enum Stop {
    Eof,
    End { line: usize },
    Else { line: usize, tokens: Vec<Token> },
}

pub(crate) fn parse(source: &str) -> Result<Vec<Node>> {
    let mut parser = Parser {
        items: lex(source)?.into_iter(),
        vars: vec!["$".to_string()],
    };
    let (nodes, stop) = parser.parse_list()?;
    match stop {
        Stop::Eof => Ok(nodes),
        Stop::End { line } => Err(parse_err(line, "unexpected {{end}}")),
        Stop::Else { line, .. } => Err(parse_err(line, "unexpected {{else}}")),
    }
}

struct Parser {
    items: std::vec::IntoIter<Item>,
    /// Variables in scope, innermost last.
    vars: Vec<String>,
}

impl Parser {
    fn parse_list(&mut self) -> Result<(Vec<Node>, Stop)> {
        let mut nodes = Vec::new();
        while let Some(item) = self.items.next() {
            let (line, tokens) = match item {
                Item::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Item::Action { line, tokens } => (line, tokens),
            };

            let keyword = match tokens.first() {
                Some(Token::Ident(word)) => word.as_str(),
                _ => "",
            };
            match keyword {
                "end" => {
                    if tokens.len() > 1 {
                        return Err(parse_err(line, "unexpected tokens after end"));
                    }
                    return Ok((nodes, Stop::End { line }));
                }
                "else" => {
                    return Ok((
                        nodes,
                        Stop::Else {
                            line,
                            tokens: tokens[1..].to_vec(),
                        },
                    ))
                }
                "if" => nodes.push(Node::If(self.parse_branch(Kind::If, line, &tokens[1..])?)),
                "with" => {
                    nodes.push(Node::With(self.parse_branch(Kind::With, line, &tokens[1..])?))
                }
                "range" => {
                    nodes.push(Node::Range(self.parse_branch(Kind::Range, line, &tokens[1..])?))
                }
                "define" | "template" | "block" | "break" | "continue" => {
                    return Err(parse_err(line, format!("unsupported action {keyword:?}")))
                }
                _ => nodes.push(Node::Action(self.parse_pipeline(line, &tokens, Kind::If)?)),
            }
        }
        Ok((nodes, Stop::Eof))
    }

    fn parse_branch(&mut self, kind: Kind, line: usize, tokens: &[Token]) -> Result<Branch> {
        let mark = self.vars.len();
        let pipe = self.parse_pipeline(line, tokens, kind)?;
        let scope = self.vars.len();

        let (body, stop) = self.parse_list()?;
        self.vars.truncate(scope);

        let otherwise = match stop {
            Stop::End { .. } => Vec::new(),
            Stop::Eof => {
                return Err(parse_err(
                    line,
                    format!("unexpected EOF: {{{{{}}}}} has no matching {{{{end}}}}", kind.name()),
                ))
            }
            Stop::Else {
                line: else_line,
                tokens,
            } => match tokens.first() {
                None => {
                    let (otherwise, stop) = self.parse_list()?;
                    match stop {
                        Stop::End { .. } => otherwise,
                        Stop::Eof => {
                            return Err(parse_err(
                                line,
                                format!("unexpected EOF: {{{{{}}}}} has no matching {{{{end}}}}", kind.name()),
                            ))
                        }
                        Stop::Else { line, .. } => {
                            return Err(parse_err(line, "expected end; found {{else}}"))
                        }
                    }
                }
                // `else if` / `else with` chains share the outer branch's single {{end}}.
                Some(Token::Ident(word)) if kind != Kind::Range && word == kind.name() => {
                    vec![kind.wrap(self.parse_branch(kind, else_line, &tokens[1..])?)]
                }
                Some(_) => return Err(parse_err(else_line, "unexpected tokens after else")),
            },
        };

        self.vars.truncate(mark);
        Ok(Branch {
            pipe,
            body,
            otherwise,
        })
    }

    /// Parses `[decl :=] command | command ...`. Only `range` may declare two variables.
    fn parse_pipeline(&mut self, line: usize, tokens: &[Token], kind: Kind) -> Result<Pipeline> {
        let (decl, is_assign, rest) = split_decl(tokens, kind == Kind::Range);
        if is_assign {
            for name in &decl {
                self.check_var(line, name)?;
            }
        }

        let mut cursor = Cursor { tokens: rest, pos: 0 };
        let commands = self.parse_commands(line, &mut cursor)?;
        if let Some(token) = cursor.peek() {
            return Err(parse_err(line, format!("unexpected {token:?} in operand")));
        }

        if !is_assign {
            self.vars.extend(decl.iter().cloned());
        }
        Ok(Pipeline {
            line,
            decl,
            is_assign,
            commands,
        })
    }

    fn parse_commands(&mut self, line: usize, cursor: &mut Cursor<'_>) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        loop {
            let command = self.parse_command(line, cursor)?;
            if !commands.is_empty() && !matches!(command.args.first(), Some(Arg::Func(_))) {
                return Err(parse_err(line, "non-function in pipeline stage"));
            }
            commands.push(command);
            if cursor.peek() == Some(&Token::Pipe) {
                cursor.pos += 1;
            } else {
                return Ok(commands);
            }
        }
    }

    fn parse_command(&mut self, line: usize, cursor: &mut Cursor<'_>) -> Result<Command> {
        let mut args = Vec::new();
        while let Some(token) = cursor.peek() {
            if matches!(token, Token::Pipe | Token::RightParen) {
                break;
            }
            cursor.pos += 1;
            let arg = match token {
                Token::Dot => Arg::Dot,
                Token::Field(fields) => Arg::Field(fields.clone()),
                Token::Variable { name, fields } => {
                    self.check_var(line, name)?;
                    Arg::Variable {
                        name: name.clone(),
                        fields: fields.clone(),
                    }
                }
                Token::Ident(word) => match word.as_str() {
                    "true" => Arg::Literal(Value::Bool(true)),
                    "false" => Arg::Literal(Value::Bool(false)),
                    "nil" => Arg::Literal(Value::Null),
                    name => Arg::Func(Func::lookup(name).ok_or_else(|| {
                        parse_err(line, format!("function {name:?} not defined"))
                    })?),
                },
                Token::Str(s) => Arg::Literal(Value::String(s.clone())),
                Token::Number(n) => Arg::Literal(Value::Number(n.clone())),
                Token::LeftParen => {
                    let commands = self.parse_commands(line, cursor)?;
                    if cursor.peek() != Some(&Token::RightParen) {
                        return Err(parse_err(line, "unclosed left paren"));
                    }
                    cursor.pos += 1;
                    Arg::Pipeline(Pipeline {
                        line,
                        decl: Vec::new(),
                        is_assign: false,
                        commands,
                    })
                }
                other => return Err(parse_err(line, format!("unexpected {other:?} in operand"))),
            };
            args.push(arg);
        }

        match args.first() {
            None => Err(parse_err(line, "missing value for command")),
            Some(Arg::Func(_)) => Ok(Command { args }),
            Some(_) if args.len() > 1 => {
                Err(parse_err(line, "can't give argument to non-function"))
            }
            Some(_) => Ok(Command { args }),
        }
    }

    fn check_var(&self, line: usize, name: &str) -> Result<()> {
        if self.vars.iter().any(|v| v == name) {
            Ok(())
        } else {
            Err(parse_err(line, format!("undefined variable: {name}")))
        }
    }
}

struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Cursor<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }
}

fn split_decl(tokens: &[Token], allow_pair: bool) -> (Vec<String>, bool, &[Token]) {
    let var_name = |token: Option<&Token>| match token {
        Some(Token::Variable { name, fields }) if fields.is_empty() && name != "$" => {
            Some(name.clone())
        }
        _ => None,
    };

    if let Some(name) = var_name(tokens.first()) {
        match tokens.get(1) {
            Some(Token::Declare) => return (vec![name], false, &tokens[2..]),
            Some(Token::Assign) => return (vec![name], true, &tokens[2..]),
            Some(Token::Comma) if allow_pair => {
                if let (Some(second), Some(Token::Declare)) =
                    (var_name(tokens.get(2)), tokens.get(3))
                {
                    return (vec![name, second], false, &tokens[4..]);
                }
            }
            _ => {}
        }
    }
    (Vec::new(), false, tokens)
}
