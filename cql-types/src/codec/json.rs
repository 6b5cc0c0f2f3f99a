//! A codec storing serde-serializable documents as JSON in a text or blob
//! column.

use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::native::{require_quotes, BlobCodec};
use super::TypeCodec;
use crate::cql_type::{ColumnType, NativeType};
use crate::errors::{mk_err, InvalidTypeError, InvalidTypeErrorKind};
use crate::frame::ProtocolVersion;
use crate::utils::literal::quote;

/// Stores values of `T` as JSON documents.
///
/// Bound to `text`, `varchar`, `ascii` or `blob`. On text types the literal
/// form is the JSON document as a quoted CQL string; on `blob` it is the
/// hexadecimal form of the document's bytes. A zero-length payload reads as
/// an absent value.
///
/// ```
/// # use cql_types::codec::{JsonCodec, TypeCodec};
/// # use cql_types::NativeType;
/// let codec: JsonCodec = JsonCodec::new(NativeType::Varchar.column_type()).unwrap();
/// let doc = codec.parse("'{\"name\":\"it''s\"}'").unwrap().unwrap();
/// assert_eq!(doc["name"], "it's");
/// assert_eq!(codec.format_value(&doc).unwrap(), "'{\"name\":\"it''s\"}'");
/// ```
pub struct JsonCodec<T = serde_json::Value> {
    native: NativeType,
    _value: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonCodec")
            .field("native", &self.native)
            .finish()
    }
}

impl<T> JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Binds the codec to a textual or blob type. Any other type is
    /// [UnsupportedType](crate::errors::InvalidTypeErrorKind::UnsupportedType).
    pub fn new(cql_type: &ColumnType) -> Result<Self, InvalidTypeError> {
        match cql_type.as_native() {
            Some(
                native @ (NativeType::Text
                | NativeType::Varchar
                | NativeType::Ascii
                | NativeType::Blob),
            ) => Ok(Self {
                native,
                _value: PhantomData,
            }),
            _ => Err(mk_err(
                cql_type,
                InvalidTypeErrorKind::UnsupportedType { codec: "JsonCodec" },
            )),
        }
    }

    fn to_document(&self, value: &T) -> Result<String, InvalidTypeError> {
        let document = serde_json::to_string(value).map_err(|err| mk_err(self.cql_type(), err))?;
        if self.native == NativeType::Ascii && !document.is_ascii() {
            return Err(mk_err(self.cql_type(), InvalidTypeErrorKind::ExpectedAscii));
        }
        Ok(document)
    }

    fn from_document(&self, document: &[u8]) -> Result<T, InvalidTypeError> {
        serde_json::from_slice(document).map_err(|err| mk_err(self.cql_type(), err))
    }
}

impl<T> TypeCodec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Value = T;

    fn cql_type(&self) -> &ColumnType {
        self.native.column_type()
    }

    fn encode(&self, value: &T, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        Ok(Bytes::from(self.to_document(value)?))
    }

    fn decode(&self, bytes: &[u8], _version: ProtocolVersion) -> Result<Option<T>, InvalidTypeError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        self.from_document(bytes).map(Some)
    }

    fn format_value(&self, value: &T) -> Result<String, InvalidTypeError> {
        let document = self.to_document(value)?;
        match self.native {
            NativeType::Blob => BlobCodec.format_value(&document.into_bytes()),
            _ => Ok(quote(&document)),
        }
    }

    fn parse_literal(&self, literal: &str) -> Result<T, InvalidTypeError> {
        let document = match self.native {
            NativeType::Blob => BlobCodec.parse_literal(literal)?,
            _ => require_quotes(self.cql_type(), literal)?.into_bytes(),
        };
        self.from_document(&document)
    }
}
