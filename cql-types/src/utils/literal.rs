//! Helpers for CQL literal text.

use crate::pretty::CqlStringLiteralDisplayer;

/// Encloses the text in single quotes, doubling embedded quotes.
pub fn quote(value: &str) -> String {
    CqlStringLiteralDisplayer(value).to_string()
}

/// Whether the text starts and ends with a single quote.
pub fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'')
}

/// Strips enclosing single quotes and un-doubles embedded ones.
///
/// Returns None when the text is not quoted.
pub fn unquote(value: &str) -> Option<String> {
    if !is_quoted(value) {
        return None;
    }
    Some(value[1..value.len() - 1].replace("''", "'"))
}

/// Strips enclosing single quotes if present.
pub fn strip_optional_quotes(value: &str) -> std::borrow::Cow<'_, str> {
    match unquote(value) {
        Some(unquoted) => unquoted.into(),
        None => value.into(),
    }
}

/// Whether the text is an optionally signed run of decimal digits.
pub fn is_long_literal(value: &str) -> bool {
    let digits = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Whether the text denotes an absent value.
pub fn is_null_literal(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("NULL")
}

/// Decodes a `0x`-prefixed hexadecimal blob literal.
pub fn parse_hex_blob(value: &str) -> Option<Vec<u8>> {
    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))?;
    if hex.len() % 2 != 0 {
        return None;
    }
    hex.as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            let high = (pair[0] as char).to_digit(16)?;
            let low = (pair[1] as char).to_digit(16)?;
            Some((high * 16 + low) as u8)
        })
        .collect()
}
