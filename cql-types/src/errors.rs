//! Errors raised when a value cannot be interpreted under its CQL type.

use std::fmt::Display;
use std::sync::Arc;

use thiserror::Error;

use crate::cql_type::ColumnType;
use crate::frame::frame_errors::LowLevelDeserializationError;

/// A value's textual or binary form cannot be interpreted under its target type.
///
/// This is a user-facing error: it is caused by malformed literals or
/// payloads, not by a broken schema.
#[derive(Error, Debug, Clone)]
#[error("Failed to handle a value of CQL type {cql_type}: {kind}")]
pub struct InvalidTypeError {
    /// The CQL type that the value was being interpreted as.
    pub cql_type: ColumnType,

    /// Detailed information about the failure.
    pub kind: InvalidTypeErrorKind,
}

impl InvalidTypeError {
    pub fn new(cql_type: &ColumnType, kind: impl Into<InvalidTypeErrorKind>) -> Self {
        Self {
            cql_type: cql_type.clone(),
            kind: kind.into(),
        }
    }
}

pub(crate) fn mk_err(cql_type: &ColumnType, kind: impl Into<InvalidTypeErrorKind>) -> InvalidTypeError {
    InvalidTypeError::new(cql_type, kind)
}

/// Describes why a value could not be handled.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum InvalidTypeErrorKind {
    /// The literal does not follow the grammar of the type.
    UnparsableLiteral {
        literal: String,
        reason: &'static str,
    },

    /// The literal must be enclosed in single quotes.
    MissingQuotes { literal: String },

    /// The length of a fixed-width payload is wrong.
    ByteLengthMismatch { expected: usize, got: usize },

    /// The length of an inet payload is neither 4 nor 16.
    BadInetLength { got: usize },

    /// The payload is shorter than its own framing announces.
    Truncated(LowLevelDeserializationError),

    /// Bytes are left over after a collection payload was read.
    TrailingBytes { remaining: usize },

    /// Expected valid ASCII string.
    ExpectedAscii,

    /// Invalid UTF-8 string.
    InvalidUtf8(std::str::Utf8Error),

    /// The value is out of range supported by the target representation.
    ValueOverflow,

    /// The encoded value does not fit in its length prefix.
    ValueTooBig { size: usize },

    /// The value does not match the shape of the type.
    IncompatibleValue { expected: &'static str },

    /// A codec was built for a type it cannot handle.
    UnsupportedType { codec: &'static str },

    /// The number of components of a composite does not match its type.
    ArityMismatch { expected: usize, got: usize },

    /// The document codec failed.
    Json(Arc<serde_json::Error>),
}

impl Display for InvalidTypeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidTypeErrorKind::UnparsableLiteral { literal, reason } => {
                write!(f, "cannot parse \"{}\": {}", literal, reason)
            }
            InvalidTypeErrorKind::MissingQuotes { literal } => write!(
                f,
                "\"{}\" must be enclosed by single quotes",
                literal
            ),
            InvalidTypeErrorKind::ByteLengthMismatch { expected, got } => write!(
                f,
                "the CQL type requires {} bytes, but got {}",
                expected, got,
            ),
            InvalidTypeErrorKind::BadInetLength { got } => write!(
                f,
                "the length of read value in bytes ({got}) is not suitable for IP address; expected 4 or 16"
            ),
            InvalidTypeErrorKind::Truncated(err) => write!(f, "malformed payload: {}", err),
            InvalidTypeErrorKind::TrailingBytes { remaining } => {
                write!(f, "{} unexpected bytes after the value", remaining)
            }
            InvalidTypeErrorKind::ExpectedAscii => f.write_str("expected a valid ASCII string"),
            InvalidTypeErrorKind::InvalidUtf8(err) => err.fmt(f),
            InvalidTypeErrorKind::ValueOverflow => {
                f.write_str("value is out of representable range")
            }
            InvalidTypeErrorKind::ValueTooBig { size } => write!(
                f,
                "value of {} bytes does not fit in its length prefix",
                size
            ),
            InvalidTypeErrorKind::IncompatibleValue { expected } => {
                write!(f, "expected a value of kind {}", expected)
            }
            InvalidTypeErrorKind::UnsupportedType { codec } => {
                write!(f, "{} cannot handle this type", codec)
            }
            InvalidTypeErrorKind::ArityMismatch { expected, got } => write!(
                f,
                "expected {} components, but got {}",
                expected, got
            ),
            InvalidTypeErrorKind::Json(err) => write!(f, "document codec failed: {}", err),
        }
    }
}

impl From<LowLevelDeserializationError> for InvalidTypeErrorKind {
    fn from(err: LowLevelDeserializationError) -> Self {
        InvalidTypeErrorKind::Truncated(err)
    }
}

impl From<std::str::Utf8Error> for InvalidTypeErrorKind {
    fn from(err: std::str::Utf8Error) -> Self {
        InvalidTypeErrorKind::InvalidUtf8(err)
    }
}

impl From<serde_json::Error> for InvalidTypeErrorKind {
    fn from(err: serde_json::Error) -> Self {
        InvalidTypeErrorKind::Json(Arc::new(err))
    }
}

impl From<crate::value::ValueOverflow> for InvalidTypeErrorKind {
    fn from(_: crate::value::ValueOverflow) -> Self {
        InvalidTypeErrorKind::ValueOverflow
    }
}

pub(crate) fn unparsable(literal: &str, reason: &'static str) -> InvalidTypeErrorKind {
    InvalidTypeErrorKind::UnparsableLiteral {
        literal: literal.to_owned(),
        reason,
    }
}
