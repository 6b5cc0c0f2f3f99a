//! Codecs: bidirectional mappings between a Rust value, its wire form and
//! its CQL literal form.
//!
//! Every codec is bound to one [ColumnType] and implements [TypeCodec].
//! The required methods only ever see present values; the provided methods
//! add the null handling shared by all codecs:
//! - a null value serializes to `None`, never to an empty buffer,
//! - a null payload deserializes to `None`,
//! - a null value formats as `NULL`,
//! - an empty literal or `NULL` (in any case) parses to `None`.

pub mod composite;
mod dynamic;
pub mod json;
mod native;
pub mod temporal;

#[cfg(test)]
mod dynamic_tests;
#[cfg(test)]
mod temporal_tests;

use bytes::Bytes;

use crate::cql_type::ColumnType;
use crate::errors::InvalidTypeError;
use crate::frame::ProtocolVersion;
use crate::utils::literal::is_null_literal;

pub use composite::{CompositeCodec, CompositeValue, ElementCodec, TupleCodec};
pub use dynamic::CqlValueCodec;
pub use json::JsonCodec;
pub use native::{
    BigIntCodec, BlobCodec, BooleanCodec, CounterCodec, DoubleCodec, FloatCodec, InetCodec,
    IntCodec, SmallIntCodec, TextCodec, TimestampLongCodec, TinyIntCodec, UuidCodec,
};
pub use temporal::{InstantCodec, LocalDateCodec, LocalTimeCodec, ZonedTimestampCodec};

/// Maps values of [TypeCodec::Value] to and from one CQL type.
pub trait TypeCodec {
    /// The Rust representation handled by the codec.
    type Value;

    /// The CQL type this codec is bound to.
    fn cql_type(&self) -> &ColumnType;

    /// Encodes a present value.
    fn encode(&self, value: &Self::Value, version: ProtocolVersion)
        -> Result<Bytes, InvalidTypeError>;

    /// Decodes a non-null payload.
    ///
    /// A zero-length payload is not a null: codecs decide what it means
    /// for their type. Returning `None` reports the value as absent.
    fn decode(
        &self,
        bytes: &[u8],
        version: ProtocolVersion,
    ) -> Result<Option<Self::Value>, InvalidTypeError>;

    /// Renders a present value as a CQL literal.
    fn format_value(&self, value: &Self::Value) -> Result<String, InvalidTypeError>;

    /// Parses a CQL literal which is neither empty nor `NULL`.
    /// Surrounding whitespace has already been trimmed.
    fn parse_literal(&self, literal: &str) -> Result<Self::Value, InvalidTypeError>;

    /// Encodes a value, mapping `None` to a null.
    fn serialize(
        &self,
        value: Option<&Self::Value>,
        version: ProtocolVersion,
    ) -> Result<Option<Bytes>, InvalidTypeError> {
        value.map(|value| self.encode(value, version)).transpose()
    }

    /// Decodes a payload, mapping a null (`None`) to an absent value.
    fn deserialize(
        &self,
        bytes: Option<&[u8]>,
        version: ProtocolVersion,
    ) -> Result<Option<Self::Value>, InvalidTypeError> {
        match bytes {
            Some(bytes) => self.decode(bytes, version),
            None => Ok(None),
        }
    }

    /// Renders a value as a CQL literal, `NULL` when absent.
    fn format(&self, value: Option<&Self::Value>) -> Result<String, InvalidTypeError> {
        match value {
            Some(value) => self.format_value(value),
            None => Ok("NULL".to_owned()),
        }
    }

    /// Parses a CQL literal. `NULL` in any case reads as an absent value.
    fn parse(&self, text: &str) -> Result<Option<Self::Value>, InvalidTypeError> {
        let text = text.trim();
        if is_null_literal(text) {
            return Ok(None);
        }
        self.parse_literal(text).map(Some)
    }
}
