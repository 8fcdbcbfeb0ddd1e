//! Strict parsing of the analysis service's suggestion text.
//!
//! The service answers with a JSON envelope whose `message` field carries the
//! directive list as text. Accepted shape, and nothing else:
//!
//! ```text
//! list   := '[' ( tuple ( ',' tuple )* ','? )? ']'
//! tuple  := ( '(' | '[' ) string ',' string ',' string ','? ( ')' | ']' )
//! string := '"' ... '"' | '\'' ... '\''      (backslash escapes allowed)
//! ```
//!
//! Whitespace is free between tokens, and the whole list may be wrapped in one
//! Markdown code fence. JSON arrays of arrays fit the grammar. Anything else is
//! rejected with `DirectiveError::Malformed` instead of being guessed at.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use super::RenameDirective;
use crate::errors::DirectiveError;

static CODE_FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)\s*```\s*$").unwrap());

#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    #[serde(default)]
    message: Option<String>,
}

/// Decode the raw query response body and parse the directives in its
/// `message` field.
pub fn parse_response(raw: &str) -> Result<Vec<RenameDirective>, DirectiveError> {
    let envelope: QueryEnvelope =
        serde_json::from_str(raw).map_err(DirectiveError::InvalidEnvelope)?;
    let message = envelope.message.ok_or(DirectiveError::MissingMessage)?;
    parse_directive_list(&message)
}

/// Parse directive-list text (optionally fenced) into directives.
pub fn parse_directive_list(text: &str) -> Result<Vec<RenameDirective>, DirectiveError> {
    let body = match CODE_FENCE_REGEX.captures(text) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => text,
    };

    let mut cursor = Cursor::new(body);
    let triples = cursor.list()?;
    cursor.skip_whitespace();
    if !cursor.at_end() {
        return Err(cursor.error("unexpected content after the closing ']'"));
    }

    triples
        .into_iter()
        .enumerate()
        .map(|(index, [old_name, new_name, file_path])| -> Result<RenameDirective, DirectiveError> {
            validate_field(index, "old_name", &old_name)?;
            validate_field(index, "new_name", &new_name)?;
            validate_field(index, "file_path", &file_path)?;
            Ok(RenameDirective {
                old_name,
                new_name,
                file_path,
            })
        })
        .collect()
}

fn validate_field(index: usize, field: &'static str, value: &str) -> Result<(), DirectiveError> {
    if value.trim().is_empty() {
        return Err(DirectiveError::InvalidField {
            index,
            field,
            message: "must not be empty".to_string(),
        });
    }
    if value.contains(['\n', '\r']) {
        return Err(DirectiveError::InvalidField {
            index,
            field,
            message: "must not span lines".to_string(),
        });
    }
    Ok(())
}

struct Cursor<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }

    fn error(&self, message: impl Into<String>) -> DirectiveError {
        DirectiveError::Malformed {
            position: self.position,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.position >= self.text.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), DirectiveError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    /// Consume `c` if it is the next non-whitespace character.
    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn list(&mut self) -> Result<Vec<[String; 3]>, DirectiveError> {
        self.expect('[')?;
        let mut triples = Vec::new();
        loop {
            if self.eat(']') {
                return Ok(triples);
            }
            triples.push(self.tuple()?);
            if self.eat(',') {
                continue;
            }
            self.expect(']')?;
            return Ok(triples);
        }
    }

    fn tuple(&mut self) -> Result<[String; 3], DirectiveError> {
        self.skip_whitespace();
        let close = match self.peek() {
            Some('(') => ')',
            Some('[') => ']',
            Some(c) => return Err(self.error(format!("expected '(' or '[', found '{}'", c))),
            None => return Err(self.error("expected '(' or '[', found end of input")),
        };
        self.bump();

        let old_name = self.string()?;
        self.expect(',')?;
        let new_name = self.string()?;
        self.expect(',')?;
        let file_path = self.string()?;
        self.eat(',');
        self.expect(close)?;

        Ok([old_name, new_name, file_path])
    }

    fn string(&mut self) -> Result<String, DirectiveError> {
        self.skip_whitespace();
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => return Err(self.error(format!("expected a quoted string, found '{}'", c))),
            None => return Err(self.error("expected a quoted string, found end of input")),
        };
        self.bump();

        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => value.push(self.escape()?),
                Some('\n') => return Err(self.error("unterminated string")),
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn escape(&mut self) -> Result<char, DirectiveError> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some(c @ ('\\' | '\'' | '"' | '/')) => Ok(c),
            Some('u') => {
                let start = self.position;
                let digits = self.text.get(start..start + 4).unwrap_or("");
                let code = u32::from_str_radix(digits, 16)
                    .ok()
                    .filter(|_| digits.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error("invalid \\u escape"))?;
                self.position += 4;
                Ok(code)
            }
            Some(c) => Err(self.error(format!("unsupported escape '\\{}'", c))),
            None => Err(self.error("unterminated escape")),
        }
    }
}
