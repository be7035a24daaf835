//! Splits template source into literal text runs and tokenized `{{ ... }}` actions.
//!
//! Trim markers (`{{- ` and ` -}}`) are applied here, so the parser only ever sees the
//! already-trimmed text. Comments (`{{/* ... */}}`) produce no item at all.

use serde_json::Number;

use crate::error::{parse_err, Result};

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const RIGHT_TRIM_DELIM: &str = "-}}";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Dot,
    Field(Vec<String>),
    Variable { name: String, fields: Vec<String> },
    Ident(String),
    Str(String),
    Number(Number),
    LeftParen,
    RightParen,
    Pipe,
    Comma,
    Declare,
    Assign,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Text(String),
    Action { line: usize, tokens: Vec<Token> },
}

pub(crate) fn lex(source: &str) -> Result<Vec<Item>> {
    Lexer {
        src: source,
        pos: 0,
        line: 1,
        trim_next: false,
        items: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    /// Set by a ` -}}` delimiter: the next text run loses its leading whitespace.
    trim_next: bool,
    items: Vec<Item>,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `{{-` only trims when the dash is followed by whitespace; `{{-3}}` is a number.
fn has_left_trim(after_delim: &str) -> bool {
    let mut chars = after_delim.chars();
    chars.next() == Some('-') && chars.next().is_some_and(|c| c.is_ascii_whitespace())
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Item>> {
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            match rest.find(LEFT_DELIM) {
                None => {
                    self.push_text(rest, false);
                    self.pos = self.src.len();
                }
                Some(offset) => {
                    let after = self.pos + offset + LEFT_DELIM.len();
                    let trim_left = has_left_trim(&self.src[after..]);
                    self.push_text(&rest[..offset], trim_left);
                    self.pos = after;
                    if trim_left {
                        self.advance(2);
                    }
                    self.lex_action()?;
                }
            }
        }
        Ok(self.items)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Moves forward `n` bytes, keeping the line counter in step.
    fn advance(&mut self, n: usize) {
        let consumed = &self.src[self.pos..self.pos + n];
        self.line += consumed.matches('\n').count();
        self.pos += n;
    }

    fn push_text(&mut self, raw: &str, trim_end: bool) {
        self.line += raw.matches('\n').count();
        let mut text = raw;
        if std::mem::take(&mut self.trim_next) {
            text = text.trim_start();
        }
        if trim_end {
            text = text.trim_end();
        }
        if !text.is_empty() {
            self.items.push(Item::Text(text.to_string()));
        }
    }

    fn skip_space(&mut self) -> bool {
        let skipped = self.rest().len() - self.rest().trim_start().len();
        self.advance(skipped);
        skipped > 0
    }

    fn lex_action(&mut self) -> Result<()> {
        let line = self.line;
        self.skip_space();
        if self.rest().starts_with("/*") {
            return self.lex_comment(line);
        }

        let mut tokens = Vec::new();
        loop {
            let spaced = self.skip_space();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(parse_err(line, "unclosed action"));
            }
            if rest.starts_with(RIGHT_DELIM) {
                self.advance(RIGHT_DELIM.len());
                break;
            }
            if spaced && rest.starts_with(RIGHT_TRIM_DELIM) {
                self.advance(RIGHT_TRIM_DELIM.len());
                self.trim_next = true;
                break;
            }
            let token = self.lex_token(line)?;
            tokens.push(token);
        }
        self.items.push(Item::Action { line, tokens });
        Ok(())
    }

    fn lex_comment(&mut self, line: usize) -> Result<()> {
        let end = self
            .rest()
            .find("*/")
            .ok_or_else(|| parse_err(line, "unclosed comment"))?;
        self.advance(end + 2);
        let rest = self.rest();
        if rest.starts_with(RIGHT_DELIM) {
            self.advance(RIGHT_DELIM.len());
        } else if rest.starts_with(" -}}") {
            self.advance(4);
            self.trim_next = true;
        } else {
            return Err(parse_err(line, "comment ends before closing delimiter"));
        }
        Ok(())
    }

    fn lex_token(&mut self, line: usize) -> Result<Token> {
        let rest = self.rest();
        let mut chars = rest.chars();
        let Some(c) = chars.next() else {
            return Err(parse_err(line, "unclosed action"));
        };
        let next = chars.next();

        let token = match c {
            '.' if next.is_some_and(is_ident_start) => Token::Field(self.lex_fields()),
            '.' => {
                self.advance(1);
                Token::Dot
            }
            '$' => {
                self.advance(1);
                let name = format!("${}", self.take_while(is_ident_char));
                let fields = self.lex_fields();
                Token::Variable { name, fields }
            }
            '"' => self.lex_quoted(line)?,
            '`' => self.lex_raw(line)?,
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '|' => self.single(Token::Pipe),
            ',' => self.single(Token::Comma),
            ':' if next == Some('=') => {
                self.advance(2);
                Token::Declare
            }
            '=' => self.single(Token::Assign),
            '0'..='9' => self.lex_number(line)?,
            '-' | '+' if next.is_some_and(|n| n.is_ascii_digit()) => self.lex_number(line)?,
            c if is_ident_start(c) => Token::Ident(self.take_while(is_ident_char)),
            other => {
                return Err(parse_err(
                    line,
                    format!("unexpected {other:?} in action"),
                ))
            }
        };
        Ok(token)
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance(1);
        token
    }

    fn take_while(&mut self, pred: fn(char) -> bool) -> String {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        let taken = rest[..len].to_string();
        self.advance(len);
        taken
    }

    /// Reads a `.a.b.c` chain; stops at the first `.` not followed by an identifier.
    fn lex_fields(&mut self) -> Vec<String> {
        let mut fields = Vec::new();
        loop {
            let mut chars = self.rest().chars();
            if chars.next() != Some('.') || !chars.next().is_some_and(is_ident_start) {
                break;
            }
            self.advance(1);
            fields.push(self.take_while(is_ident_char));
        }
        fields
    }

    fn lex_quoted(&mut self, line: usize) -> Result<Token> {
        let body = &self.rest()[1..];
        let mut out = String::new();
        let mut chars = body.char_indices();
        loop {
            match chars.next() {
                None | Some((_, '\n')) => {
                    return Err(parse_err(line, "unterminated quoted string"))
                }
                Some((i, '"')) => {
                    self.advance(i + 2);
                    return Ok(Token::Str(out));
                }
                Some((_, '\\')) => {
                    let escaped = match chars.next().map(|(_, c)| c) {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('u') => {
                            let hex: String = chars.by_ref().take(4).map(|(_, c)| c).collect();
                            u32::from_str_radix(&hex, 16)
                                .ok()
                                .and_then(char::from_u32)
                                .ok_or_else(|| {
                                    parse_err(line, format!("invalid unicode escape \\u{hex}"))
                                })?
                        }
                        other => {
                            return Err(parse_err(
                                line,
                                format!("invalid escape sequence \\{}", other.unwrap_or(' ')),
                            ))
                        }
                    };
                    out.push(escaped);
                }
                Some((_, c)) => out.push(c),
            }
        }
    }

    fn lex_raw(&mut self, line: usize) -> Result<Token> {
        let body = &self.rest()[1..];
        let end = body
            .find('`')
            .ok_or_else(|| parse_err(line, "unterminated raw quoted string"))?;
        let text = body[..end].to_string();
        self.advance(end + 2);
        Ok(Token::Str(text))
    }

    fn lex_number(&mut self, line: usize) -> Result<Token> {
        let bytes = self.rest().as_bytes();
        let mut len = 0;
        if matches!(bytes.first(), Some(b'-' | b'+')) {
            len += 1;
        }
        while let Some(&b) = bytes.get(len) {
            let exponent_sign =
                matches!(b, b'-' | b'+') && matches!(bytes.get(len - 1), Some(b'e' | b'E'));
            if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || exponent_sign {
                len += 1;
            } else {
                break;
            }
        }
        let text = &self.rest()[..len];
        let number = parse_number(text)
            .ok_or_else(|| parse_err(line, format!("bad number syntax: {text:?}")))?;
        self.advance(len);
        Ok(Token::Number(number))
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let cleaned = text.replace('_', "");
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(d) => (true, d),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        let value = i64::from_str_radix(hex, 16).ok()?;
        return Some(Number::from(if negative { -value } else { value }));
    }
    if let Ok(value) = cleaned.parse::<i64>() {
        return Some(Number::from(value));
    }
    if let Ok(value) = cleaned.parse::<u64>() {
        return Some(Number::from(value));
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}
