//! Reader for the OpenStep ASCII property list dialect used by `project.pbxproj`.
//!
//! Values are produced as a [`serde_json::Value`] tree so the object decoder
//! can treat a pbxproj and its `plutil -convert json` rendition identically.
//! Dictionaries become objects, arrays become arrays, and every scalar
//! (quoted or bare strings, `<hex>` data) becomes a string.

use serde_json::{Map, Value};
use thiserror::Error;

/// A syntax error in a property list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct PlistError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Parse property list text, accepting either ASCII plist or JSON.
pub fn parse(text: &str) -> Result<Value, PlistError> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with("//") && trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return Ok(value);
        }
    }
    parse_ascii(text)
}

/// Parse ASCII (OpenStep) property list text.
pub fn parse_ascii(text: &str) -> Result<Value, PlistError> {
    let mut parser = Parser::new(text);
    let value = parser.value()?;
    parser.skip_trivia()?;
    if parser.peek().is_some() {
        return Err(parser.error("unexpected trailing content"));
    }
    Ok(value)
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> PlistError {
        PlistError {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), PlistError> {
        self.skip_trivia()?;
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected `{}`, found `{}`", expected, c))),
            None => Err(self.error(format!("expected `{}`, found end of input", expected))),
        }
    }

    /// Skip whitespace and both comment styles.
    fn skip_trivia(&mut self) -> Result<(), PlistError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.next() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            let mut prev = '\0';
                            loop {
                                match self.bump() {
                                    Some('/') if prev == '*' => break,
                                    Some(c) => prev = c,
                                    None => return Err(self.error("unterminated comment")),
                                }
                            }
                        }
                        // A bare string may start with '/' (paths)
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn value(&mut self) -> Result<Value, PlistError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.dictionary(),
            Some('(') => self.array(),
            Some('"') | Some('\'') => self.quoted().map(Value::String),
            Some('<') => self.data().map(Value::String),
            Some(c) if is_bare(c) => Ok(Value::String(self.bare())),
            Some(c) => Err(self.error(format!("unexpected character `{}`", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn dictionary(&mut self) -> Result<Value, PlistError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(key) => key,
                _ => return Err(self.error("dictionary keys must be strings")),
            };
            self.expect('=')?;
            let value = self.value()?;
            self.expect(';')?;
            map.insert(key, value);
        }
    }

    fn array(&mut self) -> Result<Value, PlistError> {
        self.expect('(')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(')') {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {}
                Some(c) => return Err(self.error(format!("expected `,` or `)`, found `{}`", c))),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if !is_bare(c) {
                break;
            }
            s.push(c);
            self.bump();
        }
        s
    }

    fn quoted(&mut self) -> Result<String, PlistError> {
        let quote = self.bump().unwrap_or('"');
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(s),
                Some('\\') => s.push(self.escape()?),
                Some(c) => s.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn escape(&mut self) -> Result<char, PlistError> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('a') => Ok('\u{7}'),
            Some('b') => Ok('\u{8}'),
            Some('f') => Ok('\u{c}'),
            Some('v') => Ok('\u{b}'),
            Some('U') => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = self
                        .bump()
                        .and_then(|c| c.to_digit(16))
                        .ok_or_else(|| self.error("invalid \\U escape"))?;
                    code = code * 16 + digit;
                }
                char::from_u32(code).ok_or_else(|| self.error("invalid \\U escape"))
            }
            Some(c @ '0'..='7') => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            self.bump();
                        }
                        None => break,
                    }
                }
                char::from_u32(code).ok_or_else(|| self.error("invalid octal escape"))
            }
            Some(c) => Ok(c),
            None => Err(self.error("unterminated string")),
        }
    }

    fn data(&mut self) -> Result<String, PlistError> {
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('>') => return Ok(s),
                Some(c) if c.is_ascii_hexdigit() => s.push(c),
                Some(c) if c.is_whitespace() => {}
                Some(c) => return Err(self.error(format!("invalid data character `{}`", c))),
                None => return Err(self.error("unterminated data")),
            }
        }
    }
}

fn is_bare(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_$+/:.-".contains(c)
}
