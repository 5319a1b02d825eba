//! Text → forms

use crate::error::ReadError;
use crate::value::{Symbol, Value};
use std::ops::Range;

/// Maximum collection nesting the reader accepts.
const MAX_NESTING: usize = 512;

/// A top-level form with its location in the source text.
#[derive(Debug, Clone)]
pub struct ReadForm {
    pub value: Value,
    pub span: Range<usize>,
    /// 1-based.
    pub line: usize,
    /// 1-based.
    pub column: usize,
}

/// Read exactly one form. Anything but whitespace or comments after it is an error.
pub fn read_one(src: &str) -> Result<Value, ReadError> {
    let mut reader = Reader::new(src);
    reader.skip_ignorable();
    if reader.at_end() {
        return Err(ReadError::Eof);
    }
    let value = reader.read_form()?;
    reader.skip_ignorable();
    if !reader.at_end() {
        return Err(ReadError::Trailing { offset: reader.pos });
    }
    Ok(value)
}

/// Read every form in `src`, in order.
pub fn read_all(src: &str) -> Result<Vec<ReadForm>, ReadError> {
    let mut reader = Reader::new(src);
    let mut forms = Vec::new();
    loop {
        reader.skip_ignorable();
        if reader.at_end() {
            return Ok(forms);
        }
        let start = reader.pos;
        let value = reader.read_form()?;
        let (line, column) = line_col(src, start);
        forms.push(ReadForm {
            value,
            span: start..reader.pos,
            line,
            column,
        });
    }
}

fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let before = &src[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    (line, column)
}

fn is_terminator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';')
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, depth: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ignorable(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' {
                self.bump();
            } else if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn read_form(&mut self) -> Result<Value, ReadError> {
        self.skip_ignorable();
        let start = self.pos;
        let c = self.peek().ok_or(ReadError::Eof)?;
        match c {
            '(' => {
                let items = self.read_delimited(')')?;
                built(Value::list(items), start)
            }
            '[' => {
                let items = self.read_delimited(']')?;
                built(Value::vector(items), start)
            }
            '{' => {
                let items = self.read_delimited('}')?;
                if items.len() % 2 != 0 {
                    return Err(ReadError::OddMap { offset: start });
                }
                let mut items = items.into_iter();
                let mut entries = Vec::new();
                while let (Some(k), Some(v)) = (items.next(), items.next()) {
                    entries.push((k, v));
                }
                built(Value::map(entries), start)
            }
            ')' | ']' | '}' => Err(ReadError::Unmatched {
                delimiter: c,
                offset: start,
            }),
            '"' => self.read_string(),
            '\'' => {
                self.bump();
                self.wrap("quote")
            }
            '@' => {
                self.bump();
                self.wrap("deref")
            }
            '#' => self.read_dispatch(),
            _ => self.read_atom(),
        }
    }

    fn wrap(&mut self, head: &str) -> Result<Value, ReadError> {
        let start = self.pos;
        let inner = self.nested(|r| r.read_form())?;
        built(Value::list(vec![Value::symbol(head), inner]), start)
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ReadError>) -> Result<T, ReadError> {
        if self.depth >= MAX_NESTING {
            return Err(ReadError::TooDeep { offset: self.pos });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn read_delimited(&mut self, close: char) -> Result<Vec<Value>, ReadError> {
        self.bump();
        self.nested(|r| {
            let mut items = Vec::new();
            loop {
                r.skip_ignorable();
                match r.peek() {
                    None => return Err(ReadError::Eof),
                    Some(c) if c == close => {
                        r.bump();
                        return Ok(items);
                    }
                    Some(_) => items.push(r.read_form()?),
                }
            }
        })
    }

    fn read_string(&mut self) -> Result<Value, ReadError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            let c = self
                .bump()
                .ok_or(ReadError::UnterminatedString { offset: start })?;
            match c {
                '"' => return Ok(Value::string(out)),
                '\\' => {
                    let at = self.pos;
                    let escape = self
                        .bump()
                        .ok_or(ReadError::UnterminatedString { offset: start })?;
                    out.push(match escape {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '"' => '"',
                        '\\' => '\\',
                        other => {
                            return Err(ReadError::BadEscape {
                                escape: other,
                                offset: at,
                            })
                        }
                    });
                }
                c => out.push(c),
            }
        }
    }

    fn read_dispatch(&mut self) -> Result<Value, ReadError> {
        let start = self.pos;
        self.bump();
        match self.peek() {
            Some('\'') => {
                self.bump();
                self.wrap("var")
            }
            Some('#') => {
                self.bump();
                let token = self.token();
                match token {
                    "Inf" => Ok(Value::Float(f64::INFINITY)),
                    "-Inf" => Ok(Value::Float(f64::NEG_INFINITY)),
                    "NaN" => Ok(Value::Float(f64::NAN)),
                    other => Err(ReadError::Dispatch {
                        found: format!("#{other}"),
                        offset: start,
                    }),
                }
            }
            _ => {
                let found = self.token().to_string();
                Err(ReadError::Dispatch {
                    found,
                    offset: start,
                })
            }
        }
    }

    fn token(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_terminator(c) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn read_atom(&mut self) -> Result<Value, ReadError> {
        let offset = self.pos;
        let token = self.token();
        let mut chars = token.chars();
        let first = chars.next().unwrap_or(' ');
        let second = chars.next();

        if first.is_ascii_digit()
            || (matches!(first, '+' | '-') && second.is_some_and(|c| c.is_ascii_digit()))
        {
            return parse_number(token, offset);
        }

        match token {
            "nil" => Ok(Value::Nil),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => {
                if let Some(name) = token.strip_prefix(':') {
                    if name.is_empty() || name.starts_with(':') || name.ends_with('/') {
                        return Err(ReadError::InvalidToken {
                            text: token.to_string(),
                            offset,
                        });
                    }
                    return Ok(Value::Keyword(Symbol::parse(name)));
                }
                if token.is_empty() || (token.ends_with('/') && token != "/") {
                    return Err(ReadError::InvalidToken {
                        text: token.to_string(),
                        offset,
                    });
                }
                Ok(Value::Symbol(Symbol::parse(token)))
            }
        }
    }
}

fn parse_number(token: &str, offset: usize) -> Result<Value, ReadError> {
    let invalid = || ReadError::InvalidNumber {
        text: token.to_string(),
        offset,
    };
    let is_float = token.contains(['.', 'e', 'E']);
    if is_float {
        // Rust accepts "inf"/"nan" spellings; numbers here must start with a digit or sign.
        if token.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
            return Err(invalid());
        }
        token.parse::<f64>().map(Value::Float).map_err(|_| invalid())
    } else {
        token.parse::<i64>().map(Value::Int).map_err(|_| invalid())
    }
}

/// A collection the reader assembled, or `TooDeep` at the form's offset.
fn built(value: crate::error::Result<Value>, offset: usize) -> Result<Value, ReadError> {
    value.map_err(|_| ReadError::TooDeep { offset })
}
