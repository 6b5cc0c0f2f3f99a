use std::fmt::Display;

/// An error that can occur during parsing.
#[derive(Copy, Clone, Debug)]
pub struct ParseError {
    pub remaining: usize,
    pub cause: ParseErrorCause,
}

impl ParseError {
    /// Given the original string, returns the 1-based position
    /// of the error in characters.
    /// If an incorrect string was given, the function may return None.
    pub fn calculate_position(&self, original: &str) -> Option<usize> {
        calculate_position(original, self.remaining)
    }

    /// Returns the error cause.
    pub fn get_cause(&self) -> ParseErrorCause {
        self.cause
    }
}

/// Cause of the parsing error.
/// Should be lightweight so that it can be quickly discarded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorCause {
    Expected(&'static str),
    Other(&'static str),
}

impl Display for ParseErrorCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorCause::Expected(e) => write!(f, "expected {:?}", e),
            ParseErrorCause::Other(e) => f.write_str(e),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// A utility class for building simple recursive-descent parsers.
///
/// Basically, a wrapper over &str with nice methods that help with parsing.
#[derive(Clone, Copy, Debug)]
#[must_use]
pub struct ParserState<'s> {
    s: &'s str,
}

impl<'s> ParserState<'s> {
    /// Creates a new parser from given input string.
    pub fn new(s: &'s str) -> Self {
        Self { s }
    }

    /// The not yet consumed part of the input.
    pub fn remaining_input(self) -> &'s str {
        self.s
    }

    /// Returns the next character without consuming it.
    pub fn peek(self) -> Option<char> {
        self.s.chars().next()
    }

    /// If the input string contains given string at the beginning,
    /// returns a new parser state with given string skipped.
    /// Otherwise, returns an error.
    pub fn accept(self, part: &'static str) -> ParseResult<Self> {
        match self.s.strip_prefix(part) {
            Some(s) => Ok(Self { s }),
            None => Err(self.error(ParseErrorCause::Expected(part))),
        }
    }

    /// Returns new parser state with whitespace skipped from the beginning.
    pub fn skip_white(self) -> Self {
        let (_, me) = self.take_while(char::is_whitespace);
        me
    }

    /// Skips characters from the beginning while they satisfy given predicate
    /// and returns the skipped part along with the new parser state.
    pub fn take_while(self, mut pred: impl FnMut(char) -> bool) -> (&'s str, Self) {
        let idx = self.s.find(move |c| !pred(c)).unwrap_or(self.s.len());
        let new = Self { s: &self.s[idx..] };
        (&self.s[..idx], new)
    }

    /// Returns the text consumed between `self` and a later state `end`
    /// of the same input.
    pub fn slice_until(self, end: Self) -> &'s str {
        let consumed = self.s.len().saturating_sub(end.s.len());
        &self.s[..consumed]
    }

    /// Skips a single CQL value: a quoted string, a bracketed or parenthesized
    /// literal, or a run of identifier characters. Returns the skipped text.
    ///
    /// Quotes inside strings are escaped by doubling them. Nesting is only
    /// tracked outside of strings.
    pub fn skip_cql_value(self) -> ParseResult<(&'s str, Self)> {
        match self.peek() {
            None => return Err(self.error(ParseErrorCause::Other("expected a CQL value"))),
            Some(c) if c.is_whitespace() => {
                return Err(self.error(ParseErrorCause::Other("expected a CQL value")))
            }
            Some(_) => {}
        }

        let bytes = self.s.as_bytes();
        let mut depth = Depth::default();
        let mut in_string = false;
        let mut idx = 0;
        while idx < bytes.len() {
            let c = bytes[idx];
            if in_string {
                if c == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1;
                    } else {
                        in_string = false;
                        if depth.is_zero() {
                            return Ok(self.split_at(idx + 1));
                        }
                    }
                }
            } else {
                match c {
                    b'\'' => in_string = true,
                    b'{' => depth.curly += 1,
                    b'[' => depth.square += 1,
                    b'(' => depth.parens += 1,
                    b'}' | b']' | b')' => {
                        let counter = match c {
                            b'}' => &mut depth.curly,
                            b']' => &mut depth.square,
                            _ => &mut depth.parens,
                        };
                        if *counter == 0 {
                            return self.finish_value(idx);
                        }
                        *counter -= 1;
                        if depth.is_zero() {
                            return Ok(self.split_at(idx + 1));
                        }
                    }
                    c if !is_cql_identifier_byte(c) => {
                        if depth.is_zero() {
                            return self.finish_value(idx);
                        }
                    }
                    _ => {}
                }
            }
            idx += 1;
        }

        if in_string || !depth.is_zero() {
            return Err(self.error(ParseErrorCause::Other("unterminated CQL value")));
        }
        Ok(self.split_at(idx))
    }

    /// Skips a CQL identifier, either a run of identifier characters or
    /// a double-quoted identifier with doubled inner quotes.
    pub fn skip_cql_identifier(self) -> ParseResult<(&'s str, Self)> {
        if let Ok(p) = self.accept("\"") {
            let bytes = p.s.as_bytes();
            let mut idx = 0;
            while idx < bytes.len() {
                if bytes[idx] == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 2;
                        continue;
                    }
                    return Ok(self.split_at(idx + 2));
                }
                idx += 1;
            }
            return Err(p.error(ParseErrorCause::Other("unterminated quoted identifier")));
        }

        let (id, p) = self.take_while(|c| c.is_ascii() && is_cql_identifier_byte(c as u8));
        if id.is_empty() {
            return Err(self.error(ParseErrorCause::Other("expected an identifier")));
        }
        Ok((id, p))
    }

    fn finish_value(self, idx: usize) -> ParseResult<(&'s str, Self)> {
        if idx == 0 {
            return Err(self.error(ParseErrorCause::Other("expected a CQL value")));
        }
        Ok(self.split_at(idx))
    }

    fn split_at(self, idx: usize) -> (&'s str, Self) {
        (&self.s[..idx], Self { s: &self.s[idx..] })
    }

    /// Returns the number of remaining bytes to parse.
    pub fn get_remaining(self) -> usize {
        self.s.len()
    }

    /// Returns true if the input string was parsed completely.
    pub fn is_at_eof(self) -> bool {
        self.s.is_empty()
    }

    /// Returns an error with given cause, associated with given position.
    pub fn error(self, cause: ParseErrorCause) -> ParseError {
        ParseError {
            remaining: self.get_remaining(),
            cause,
        }
    }

    /// Given the original string, returns the 1-based position
    /// of the error in characters.
    /// If an incorrect string was given, the function may return None.
    pub fn calculate_position(self, original: &str) -> Option<usize> {
        calculate_position(original, self.get_remaining())
    }
}

#[derive(Default)]
struct Depth {
    curly: usize,
    square: usize,
    parens: usize,
}

impl Depth {
    fn is_zero(&self) -> bool {
        self.curly == 0 && self.square == 0 && self.parens == 0
    }
}

/// Characters allowed in unquoted CQL identifiers and bare literals.
pub fn is_cql_identifier_char(c: char) -> bool {
    c.is_ascii() && is_cql_identifier_byte(c as u8)
}

fn is_cql_identifier_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'+' | b'.' | b'_' | b'&')
}

fn calculate_position(original: &str, remaining: usize) -> Option<usize> {
    let prefix_len = original.len().checked_sub(remaining)?;
    let prefix = original.get(..prefix_len)?;
    Some(prefix.chars().count() + 1)
}
