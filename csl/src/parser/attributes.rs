use thiserror::Error;

use crate::operation::Attributes;

/// Failures in the `name="value"` grammar of an opening marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("Invalid attribute syntax")]
    InvalidSyntax,
    #[error("Expected '=' after attribute name")]
    ExpectedEquals,
    #[error("Missing attribute value")]
    MissingValue,
    #[error("Unquoted attribute value")]
    UnquotedValue,
    #[error("Unterminated quoted value")]
    UnterminatedValue,
    #[error("Duplicate attribute: {0}")]
    Duplicate(String),
}

/// Parse the attribute text of a marker into an ordered map.
///
/// Names run up to whitespace or `=`; values are quoted with `"` or `'`.
/// Inside a value, `\\` and a backslash before the active quote are
/// escapes. Any other backslash is kept along with the character after it.
pub fn parse_attributes(input: &str) -> Result<Attributes, AttributeError> {
    let mut cursor = Cursor::new(input);
    let mut attributes = Attributes::new();

    loop {
        cursor.skip_whitespace();
        if cursor.at_end() {
            break;
        }

        let name = cursor.take_while(|c| !c.is_whitespace() && c != '=');
        if name.is_empty() {
            return Err(AttributeError::InvalidSyntax);
        }

        cursor.skip_whitespace();
        if !cursor.eat('=') {
            return Err(AttributeError::ExpectedEquals);
        }
        cursor.skip_whitespace();

        let value = cursor.quoted_value()?;
        if attributes.contains_key(name) {
            return Err(AttributeError::Duplicate(name.to_string()));
        }
        attributes.insert(name.to_string(), value);
    }

    Ok(attributes)
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Cursor { input, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn quoted_value(&mut self) -> Result<String, AttributeError> {
        let quote = match self.bump() {
            None => return Err(AttributeError::MissingValue),
            Some(c @ ('"' | '\'')) => c,
            Some(_) => return Err(AttributeError::UnquotedValue),
        };

        let mut value = String::new();
        while let Some(c) = self.bump() {
            if c == quote {
                return Ok(value);
            }
            if c == '\\' {
                match self.peek() {
                    Some(next) if next == quote || next == '\\' => {
                        value.push(next);
                        self.pos += next.len_utf8();
                    }
                    // Unknown escape: keep the backslash; the next
                    // character is read on its own.
                    _ => value.push(c),
                }
                continue;
            }
            value.push(c);
        }

        Err(AttributeError::UnterminatedValue)
    }
}
