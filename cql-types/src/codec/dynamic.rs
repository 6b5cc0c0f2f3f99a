//! A codec for any CQL type, with values represented as [CqlValue].

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal_04::BigDecimal;
use bytes::{BufMut, Bytes, BytesMut};
use itertools::Itertools;
use num_bigint_04::BigInt;

use super::composite::TupleCodec;
use super::native::{
    fixed_bytes, BigIntCodec, BlobCodec, BooleanCodec, CounterCodec, DoubleCodec, FloatCodec,
    InetCodec, IntCodec, SmallIntCodec, TextCodec, TimestampLongCodec, TinyIntCodec, UuidCodec,
};
use super::temporal::{parse_date_literal, parse_time_literal};
use super::TypeCodec;
use crate::cql_type::{CollectionType, ColumnType, NativeType, UserDefinedType};
use crate::errors::{mk_err, unparsable, InvalidTypeError, InvalidTypeErrorKind};
use crate::frame::types::{
    read_bytes_opt, read_collection_size, read_collection_value, write_bytes_opt,
    write_collection_size, write_collection_value,
};
use crate::frame::ProtocolVersion;
use crate::pretty::{CqlIdentifierDisplayer, CqlValueDisplayer};
use crate::utils::parse::ParserState;
use crate::value::{Counter, CqlDate, CqlTime, CqlTimestamp, CqlValue};

/// Maps [CqlValue]s to and from the wire and literal forms of one CQL type.
///
/// Built recursively for collections, tuples and user defined types.
/// A zero-length payload of a type that [supports it](NativeType::supports_empty)
/// decodes to [CqlValue::Empty], which formats and parses as `0x`.
/// Values of a `Custom` or `Empty` type are treated as opaque blobs.
///
/// ```
/// # use cql_types::codec::{CqlValueCodec, TypeCodec};
/// # use cql_types::{ColumnType, CqlValue, NativeType, ProtocolVersion};
/// let codec = CqlValueCodec::new(&ColumnType::list(NativeType::Int.into(), false)).unwrap();
/// let value = codec.parse("[1, 2, 3]").unwrap().unwrap();
/// assert_eq!(codec.format_value(&value).unwrap(), "[1,2,3]");
/// let bytes = codec.encode(&value, ProtocolVersion::V4).unwrap();
/// assert_eq!(codec.decode(&bytes, ProtocolVersion::V4).unwrap(), Some(value));
/// ```
#[derive(Debug)]
pub struct CqlValueCodec {
    cql_type: ColumnType,
    kind: CodecKind,
}

#[derive(Debug)]
enum CodecKind {
    Native(NativeType),
    List(Box<CqlValueCodec>),
    Set(Box<CqlValueCodec>),
    Map(Box<CqlValueCodec>, Box<CqlValueCodec>),
    Tuple(Box<TupleCodec>),
    UserDefined {
        definition: Arc<UserDefinedType>,
        fields: Vec<CqlValueCodec>,
    },
    Custom,
}

impl CqlValueCodec {
    /// Builds the codec for `cql_type`, including codecs for every nested type.
    pub fn new(cql_type: &ColumnType) -> Result<Self, InvalidTypeError> {
        let kind = match cql_type {
            ColumnType::Native(native) => CodecKind::Native(*native),
            ColumnType::Collection { typ, .. } => match typ {
                CollectionType::List(element) => CodecKind::List(Box::new(Self::new(element)?)),
                CollectionType::Set(element) => CodecKind::Set(Box::new(Self::new(element)?)),
                CollectionType::Map(key, value) => {
                    CodecKind::Map(Box::new(Self::new(key)?), Box::new(Self::new(value)?))
                }
            },
            ColumnType::Tuple(_) => CodecKind::Tuple(Box::new(TupleCodec::for_tuple(cql_type)?)),
            ColumnType::UserDefinedType { definition, .. } => CodecKind::UserDefined {
                definition: Arc::clone(definition),
                fields: definition
                    .field_types
                    .iter()
                    .map(|(_, field_type)| Self::new(field_type))
                    .collect::<Result<_, _>>()?,
            },
            ColumnType::Custom(_) | ColumnType::Empty => CodecKind::Custom,
        };
        Ok(Self {
            cql_type: cql_type.clone(),
            kind,
        })
    }

    fn err(&self, kind: impl Into<InvalidTypeErrorKind>) -> InvalidTypeError {
        mk_err(&self.cql_type, kind)
    }

    fn incompatible(&self, expected: &'static str) -> InvalidTypeError {
        self.err(InvalidTypeErrorKind::IncompatibleValue { expected })
    }

    fn unparsable(&self, literal: &str, reason: &'static str) -> InvalidTypeError {
        self.err(unparsable(literal, reason))
    }

    fn too_big(&self, size: usize) -> InvalidTypeError {
        self.err(InvalidTypeErrorKind::ValueTooBig { size })
    }

    fn decode_value(&self, bytes: &[u8], version: ProtocolVersion) -> Result<CqlValue, InvalidTypeError> {
        Ok(self.decode(bytes, version)?.unwrap_or(CqlValue::Empty))
    }

    fn parse_element(&self, literal: &str) -> Result<CqlValue, InvalidTypeError> {
        self.parse(literal)?
            .ok_or_else(|| self.unparsable(literal, "collection elements cannot be null"))
    }
}

fn native_accepts(native: NativeType, value: &CqlValue) -> bool {
    match (native, value) {
        (NativeType::Ascii | NativeType::Text | NativeType::Varchar, CqlValue::Ascii(_))
        | (NativeType::Ascii | NativeType::Text | NativeType::Varchar, CqlValue::Text(_))
        | (NativeType::Blob, CqlValue::Blob(_))
        | (NativeType::Boolean, CqlValue::Boolean(_))
        | (NativeType::TinyInt, CqlValue::TinyInt(_))
        | (NativeType::SmallInt, CqlValue::SmallInt(_))
        | (NativeType::Int, CqlValue::Int(_))
        | (NativeType::BigInt, CqlValue::BigInt(_))
        | (NativeType::Counter, CqlValue::Counter(_))
        | (NativeType::Float, CqlValue::Float(_))
        | (NativeType::Double, CqlValue::Double(_))
        | (NativeType::Decimal, CqlValue::Decimal(_))
        | (NativeType::Varint, CqlValue::Varint(_))
        | (NativeType::Timestamp, CqlValue::Timestamp(_))
        | (NativeType::Date, CqlValue::Date(_))
        | (NativeType::Time, CqlValue::Time(_))
        | (NativeType::Inet, CqlValue::Inet(_))
        | (NativeType::Uuid, CqlValue::Uuid(_))
        | (NativeType::Timeuuid, CqlValue::Timeuuid(_)) => true,
        (native, CqlValue::Empty) => native.supports_empty(),
        _ => false,
    }
}

fn text_codec(native: NativeType) -> TextCodec {
    match native {
        NativeType::Ascii => TextCodec::ascii(),
        NativeType::Varchar => TextCodec::varchar(),
        _ => TextCodec::text(),
    }
}

// Native encodings
impl CqlValueCodec {
    fn encode_native(
        &self,
        native: NativeType,
        value: &CqlValue,
        version: ProtocolVersion,
    ) -> Result<Bytes, InvalidTypeError> {
        if !native_accepts(native, value) {
            return Err(self.incompatible(native.name()));
        }
        match value {
            CqlValue::Empty => Ok(Bytes::new()),
            CqlValue::Ascii(s) | CqlValue::Text(s) => text_codec(native).encode(s, version),
            CqlValue::Blob(b) => BlobCodec.encode(b, version),
            CqlValue::Boolean(b) => BooleanCodec.encode(b, version),
            CqlValue::TinyInt(v) => TinyIntCodec.encode(v, version),
            CqlValue::SmallInt(v) => SmallIntCodec.encode(v, version),
            CqlValue::Int(v) => IntCodec.encode(v, version),
            CqlValue::BigInt(v) => BigIntCodec.encode(v, version),
            CqlValue::Counter(c) => CounterCodec.encode(&c.0, version),
            CqlValue::Float(v) => FloatCodec.encode(v, version),
            CqlValue::Double(v) => DoubleCodec.encode(v, version),
            CqlValue::Decimal(d) => {
                let (unscaled, scale) = d.as_bigint_and_exponent();
                let scale = i32::try_from(scale)
                    .map_err(|_| self.err(InvalidTypeErrorKind::ValueOverflow))?;
                let mut buf = BytesMut::new();
                buf.put_i32(scale);
                buf.put_slice(&unscaled.to_signed_bytes_be());
                Ok(buf.freeze())
            }
            CqlValue::Varint(v) => Ok(Bytes::from(v.to_signed_bytes_be())),
            CqlValue::Timestamp(ts) => TimestampLongCodec.encode(&ts.0, version),
            CqlValue::Date(date) => Ok(Bytes::copy_from_slice(&date.0.to_be_bytes())),
            CqlValue::Time(time) => {
                if !(0..=CqlTime::MAX_NANOS).contains(&time.0) {
                    return Err(self.err(InvalidTypeErrorKind::ValueOverflow));
                }
                Ok(Bytes::copy_from_slice(&time.0.to_be_bytes()))
            }
            CqlValue::Inet(addr) => InetCodec.encode(addr, version),
            CqlValue::Uuid(u) => UuidCodec::uuid().encode(u, version),
            CqlValue::Timeuuid(u) => UuidCodec::timeuuid().encode(u, version),
            _ => Err(self.incompatible(native.name())),
        }
    }

    fn decode_native(
        &self,
        native: NativeType,
        bytes: &[u8],
        version: ProtocolVersion,
    ) -> Result<CqlValue, InvalidTypeError> {
        if bytes.is_empty() && native.supports_empty() {
            return Ok(CqlValue::Empty);
        }
        let value = match native {
            NativeType::Ascii => text_codec(native).decode(bytes, version)?.map(CqlValue::Ascii),
            NativeType::Text | NativeType::Varchar => {
                text_codec(native).decode(bytes, version)?.map(CqlValue::Text)
            }
            NativeType::Blob => BlobCodec.decode(bytes, version)?.map(CqlValue::Blob),
            NativeType::Boolean => BooleanCodec.decode(bytes, version)?.map(CqlValue::Boolean),
            NativeType::TinyInt => TinyIntCodec.decode(bytes, version)?.map(CqlValue::TinyInt),
            NativeType::SmallInt => SmallIntCodec.decode(bytes, version)?.map(CqlValue::SmallInt),
            NativeType::Int => IntCodec.decode(bytes, version)?.map(CqlValue::Int),
            NativeType::BigInt => BigIntCodec.decode(bytes, version)?.map(CqlValue::BigInt),
            NativeType::Counter => CounterCodec
                .decode(bytes, version)?
                .map(|c| CqlValue::Counter(Counter(c))),
            NativeType::Float => FloatCodec.decode(bytes, version)?.map(CqlValue::Float),
            NativeType::Double => DoubleCodec.decode(bytes, version)?.map(CqlValue::Double),
            NativeType::Decimal => {
                if bytes.len() < 4 {
                    return Err(self.err(InvalidTypeErrorKind::ByteLengthMismatch {
                        expected: 4,
                        got: bytes.len(),
                    }));
                }
                let (scale, unscaled) = bytes.split_at(4);
                let scale = i32::from_be_bytes(fixed_bytes(&self.cql_type, scale)?);
                let unscaled = BigInt::from_signed_bytes_be(unscaled);
                Some(CqlValue::Decimal(BigDecimal::new(unscaled, scale.into())))
            }
            NativeType::Varint => Some(CqlValue::Varint(BigInt::from_signed_bytes_be(bytes))),
            NativeType::Timestamp => TimestampLongCodec
                .decode(bytes, version)?
                .map(|millis| CqlValue::Timestamp(CqlTimestamp(millis))),
            NativeType::Date => Some(CqlValue::Date(CqlDate(u32::from_be_bytes(fixed_bytes(
                &self.cql_type,
                bytes,
            )?)))),
            NativeType::Time => {
                let nanos = i64::from_be_bytes(fixed_bytes(&self.cql_type, bytes)?);
                if !(0..=CqlTime::MAX_NANOS).contains(&nanos) {
                    return Err(self.err(InvalidTypeErrorKind::ValueOverflow));
                }
                Some(CqlValue::Time(CqlTime(nanos)))
            }
            NativeType::Inet => InetCodec.decode(bytes, version)?.map(CqlValue::Inet),
            NativeType::Uuid => UuidCodec::uuid().decode(bytes, version)?.map(CqlValue::Uuid),
            NativeType::Timeuuid => UuidCodec::timeuuid()
                .decode(bytes, version)?
                .map(CqlValue::Timeuuid),
        };
        // Native codecs report absence only for zero-length payloads.
        Ok(value.unwrap_or(CqlValue::Empty))
    }

    fn parse_native(&self, native: NativeType, literal: &str) -> Result<CqlValue, InvalidTypeError> {
        if native.supports_empty() && literal.eq_ignore_ascii_case("0x") {
            return Ok(CqlValue::Empty);
        }
        Ok(match native {
            NativeType::Ascii => CqlValue::Ascii(text_codec(native).parse_literal(literal)?),
            NativeType::Text | NativeType::Varchar => {
                CqlValue::Text(text_codec(native).parse_literal(literal)?)
            }
            NativeType::Blob => CqlValue::Blob(BlobCodec.parse_literal(literal)?),
            NativeType::Boolean => CqlValue::Boolean(BooleanCodec.parse_literal(literal)?),
            NativeType::TinyInt => CqlValue::TinyInt(TinyIntCodec.parse_literal(literal)?),
            NativeType::SmallInt => CqlValue::SmallInt(SmallIntCodec.parse_literal(literal)?),
            NativeType::Int => CqlValue::Int(IntCodec.parse_literal(literal)?),
            NativeType::BigInt => CqlValue::BigInt(BigIntCodec.parse_literal(literal)?),
            NativeType::Counter => CqlValue::Counter(Counter(CounterCodec.parse_literal(literal)?)),
            NativeType::Float => CqlValue::Float(FloatCodec.parse_literal(literal)?),
            NativeType::Double => CqlValue::Double(DoubleCodec.parse_literal(literal)?),
            NativeType::Decimal => CqlValue::Decimal(
                BigDecimal::from_str(literal)
                    .map_err(|_| self.unparsable(literal, "not a valid decimal"))?,
            ),
            NativeType::Varint => CqlValue::Varint(
                BigInt::from_str(literal)
                    .map_err(|_| self.unparsable(literal, "not a valid varint"))?,
            ),
            NativeType::Timestamp => {
                CqlValue::Timestamp(CqlTimestamp(TimestampLongCodec.parse_literal(literal)?))
            }
            NativeType::Date => CqlValue::Date(
                parse_date_literal(literal)
                    .ok_or_else(|| self.unparsable(literal, "expected YYYY-MM-DD or a day count"))?,
            ),
            NativeType::Time => CqlValue::Time(parse_time_literal(&self.cql_type, literal)?),
            NativeType::Inet => CqlValue::Inet(InetCodec.parse_literal(literal)?),
            NativeType::Uuid => CqlValue::Uuid(UuidCodec::uuid().parse_literal(literal)?),
            NativeType::Timeuuid => {
                CqlValue::Timeuuid(UuidCodec::timeuuid().parse_literal(literal)?)
            }
        })
    }
}

// Collections and user defined types
impl CqlValueCodec {
    fn encode_collection<'a>(
        &self,
        count: usize,
        items: impl Iterator<Item = (&'a CqlValueCodec, &'a CqlValue)>,
        version: ProtocolVersion,
    ) -> Result<Bytes, InvalidTypeError> {
        let mut buf = BytesMut::new();
        write_collection_size(count, &mut buf, version).map_err(|_| self.too_big(count))?;
        for (codec, item) in items {
            let bytes = codec.encode(item, version)?;
            write_collection_value(&bytes, &mut buf, version)
                .map_err(|_| self.too_big(bytes.len()))?;
        }
        Ok(buf.freeze())
    }

    /// Splits a collection payload into `count * per_entry` element payloads.
    fn read_collection<'b>(
        &self,
        bytes: &'b [u8],
        per_entry: usize,
        version: ProtocolVersion,
    ) -> Result<Vec<&'b [u8]>, InvalidTypeError> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let mut buf = bytes;
        let count = read_collection_size(&mut buf, version).map_err(|err| self.err(err))?;
        let total = count
            .checked_mul(per_entry)
            .ok_or_else(|| self.err(InvalidTypeErrorKind::ValueOverflow))?;
        let mut items = Vec::new();
        for _ in 0..total {
            let item = read_collection_value(&mut buf, version)
                .map_err(|err| self.err(err))?
                .ok_or_else(|| self.incompatible("non-null collection element"))?;
            items.push(item);
        }
        if !buf.is_empty() {
            return Err(self.err(InvalidTypeErrorKind::TrailingBytes {
                remaining: buf.len(),
            }));
        }
        Ok(items)
    }

    fn encode_udt(
        &self,
        definition: &UserDefinedType,
        codecs: &[CqlValueCodec],
        fields: &[(String, Option<CqlValue>)],
        version: ProtocolVersion,
    ) -> Result<Bytes, InvalidTypeError> {
        let unknown_field = fields
            .iter()
            .any(|(name, _)| !definition.field_types.iter().any(|(field, _)| field == name));
        if unknown_field {
            return Err(self.incompatible("fields of the user defined type"));
        }
        let mut buf = BytesMut::new();
        for ((name, _), codec) in definition.field_types.iter().zip(codecs) {
            let field = fields
                .iter()
                .find(|(field, _)| field == name)
                .and_then(|(_, value)| value.as_ref());
            let bytes = codec.serialize(field, version)?;
            write_bytes_opt(bytes.as_ref(), &mut buf)
                .map_err(|_| self.too_big(bytes.as_ref().map_or(0, Bytes::len)))?;
        }
        Ok(buf.freeze())
    }

    fn decode_udt(
        &self,
        definition: &UserDefinedType,
        codecs: &[CqlValueCodec],
        bytes: &[u8],
        version: ProtocolVersion,
    ) -> Result<CqlValue, InvalidTypeError> {
        let mut buf = bytes;
        let mut fields = Vec::with_capacity(codecs.len());
        for ((name, _), codec) in definition.field_types.iter().zip(codecs) {
            // Fields missing at the end of the payload were added to the
            // type after the value was written.
            let value = if buf.is_empty() {
                None
            } else {
                let field = read_bytes_opt(&mut buf).map_err(|err| self.err(err))?;
                codec.deserialize(field, version)?
            };
            fields.push((name.clone(), value));
        }
        Ok(CqlValue::UserDefinedType {
            keyspace: definition.keyspace.clone(),
            name: definition.name.clone(),
            fields,
        })
    }

    /// Parses `open entry, entry, ... close`, handing each entry to `entry`.
    fn parse_delimited<'s>(
        &self,
        literal: &'s str,
        open: &'static str,
        close: &'static str,
        mut entry: impl FnMut(ParserState<'s>) -> Result<ParserState<'s>, InvalidTypeError>,
    ) -> Result<(), InvalidTypeError> {
        let expect_end = |p: ParserState<'s>| {
            if p.skip_white().is_at_eof() {
                Ok(())
            } else {
                Err(self.unparsable(literal, "unexpected characters after the closing bracket"))
            }
        };

        let p = ParserState::new(literal).skip_white();
        let p = p
            .accept(open)
            .map_err(|_| self.unparsable(literal, "missing opening bracket"))?
            .skip_white();
        if let Ok(p) = p.accept(close) {
            return expect_end(p);
        }

        let mut p = p;
        loop {
            p = entry(p)?.skip_white();
            if let Ok(p) = p.accept(close) {
                return expect_end(p);
            }
            if p.is_at_eof() {
                return Err(self.unparsable(literal, "missing closing bracket"));
            }
            p = p
                .accept(",")
                .map_err(|_| self.unparsable(literal, "expecting ',' or a closing bracket"))?
                .skip_white();
        }
    }

    fn parse_elements(
        &self,
        element: &CqlValueCodec,
        literal: &str,
        open: &'static str,
        close: &'static str,
    ) -> Result<Vec<CqlValue>, InvalidTypeError> {
        let mut items = Vec::new();
        self.parse_delimited(literal, open, close, |p| {
            let (item, p) = p
                .skip_cql_value()
                .map_err(|_| self.unparsable(literal, "invalid collection element"))?;
            items.push(element.parse_element(item)?);
            Ok(p)
        })?;
        Ok(items)
    }

    fn parse_map(
        &self,
        key: &CqlValueCodec,
        value: &CqlValueCodec,
        literal: &str,
    ) -> Result<Vec<(CqlValue, CqlValue)>, InvalidTypeError> {
        let mut entries = Vec::new();
        self.parse_delimited(literal, "{", "}", |p| {
            let (k, p) = p
                .skip_cql_value()
                .map_err(|_| self.unparsable(literal, "invalid map key"))?;
            let p = p
                .skip_white()
                .accept(":")
                .map_err(|_| self.unparsable(literal, "expecting ':' after a map key"))?
                .skip_white();
            let (v, p) = p
                .skip_cql_value()
                .map_err(|_| self.unparsable(literal, "invalid map value"))?;
            entries.push((key.parse_element(k)?, value.parse_element(v)?));
            Ok(p)
        })?;
        Ok(entries)
    }

    fn parse_udt(
        &self,
        definition: &UserDefinedType,
        codecs: &[CqlValueCodec],
        literal: &str,
    ) -> Result<CqlValue, InvalidTypeError> {
        let mut fields: Vec<(String, Option<CqlValue>)> = definition
            .field_types
            .iter()
            .map(|(name, _)| (name.clone(), None))
            .collect();
        self.parse_delimited(literal, "{", "}", |p| {
            let (raw_name, p) = p
                .skip_cql_identifier()
                .map_err(|_| self.unparsable(literal, "invalid field name"))?;
            let name = unquote_identifier(raw_name);
            let idx = fields
                .iter()
                .position(|(field, _)| *field == name)
                .ok_or_else(|| self.unparsable(literal, "unknown field name"))?;
            let p = p
                .skip_white()
                .accept(":")
                .map_err(|_| self.unparsable(literal, "expecting ':' after a field name"))?
                .skip_white();
            let (v, p) = p
                .skip_cql_value()
                .map_err(|_| self.unparsable(literal, "invalid field value"))?;
            fields[idx].1 = codecs[idx].parse(v)?;
            Ok(p)
        })?;
        Ok(CqlValue::UserDefinedType {
            keyspace: definition.keyspace.clone(),
            name: definition.name.clone(),
            fields,
        })
    }
}

/// Turns a raw identifier into its name: quoted identifiers keep their case,
/// unquoted ones are case-insensitive and folded to lower case.
fn unquote_identifier(raw: &str) -> String {
    match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => raw.to_lowercase(),
    }
}

impl TypeCodec for CqlValueCodec {
    type Value = CqlValue;

    fn cql_type(&self) -> &ColumnType {
        &self.cql_type
    }

    fn encode(&self, value: &CqlValue, version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        match (&self.kind, value) {
            (CodecKind::Native(native), value) => self.encode_native(*native, value, version),
            (CodecKind::List(element), CqlValue::List(items))
            | (CodecKind::Set(element), CqlValue::Set(items)) => self.encode_collection(
                items.len(),
                items.iter().map(|item| (&**element, item)),
                version,
            ),
            (CodecKind::Map(key, val), CqlValue::Map(entries)) => self.encode_collection(
                entries.len(),
                entries
                    .iter()
                    .flat_map(|(k, v)| [(&**key, k), (&**val, v)]),
                version,
            ),
            (CodecKind::Tuple(codec), CqlValue::Tuple(items)) => codec.encode(items, version),
            (
                CodecKind::UserDefined { definition, fields: codecs },
                CqlValue::UserDefinedType { fields, .. },
            ) => self.encode_udt(definition, codecs, fields, version),
            (CodecKind::Custom, CqlValue::Blob(b)) => Ok(Bytes::copy_from_slice(b)),
            (CodecKind::List(_), _) => Err(self.incompatible("list")),
            (CodecKind::Set(_), _) => Err(self.incompatible("set")),
            (CodecKind::Map(..), _) => Err(self.incompatible("map")),
            (CodecKind::Tuple(_), _) => Err(self.incompatible("tuple")),
            (CodecKind::UserDefined { .. }, _) => Err(self.incompatible("user defined type")),
            (CodecKind::Custom, _) => Err(self.incompatible("blob")),
        }
    }

    fn decode(&self, bytes: &[u8], version: ProtocolVersion) -> Result<Option<CqlValue>, InvalidTypeError> {
        let value = match &self.kind {
            CodecKind::Native(native) => self.decode_native(*native, bytes, version)?,
            CodecKind::List(element) => CqlValue::List(
                self.read_collection(bytes, 1, version)?
                    .into_iter()
                    .map(|item| element.decode_value(item, version))
                    .collect::<Result<_, _>>()?,
            ),
            CodecKind::Set(element) => CqlValue::Set(
                self.read_collection(bytes, 1, version)?
                    .into_iter()
                    .map(|item| element.decode_value(item, version))
                    .collect::<Result<_, _>>()?,
            ),
            CodecKind::Map(key, val) => CqlValue::Map(
                self.read_collection(bytes, 2, version)?
                    .into_iter()
                    .tuples::<(_, _)>()
                    .map(|(k, v)| Ok((key.decode_value(k, version)?, val.decode_value(v, version)?)))
                    .collect::<Result<_, InvalidTypeError>>()?,
            ),
            CodecKind::Tuple(codec) => CqlValue::Tuple(
                codec
                    .decode(bytes, version)?
                    .unwrap_or_else(|| vec![None; codec.arity()]),
            ),
            CodecKind::UserDefined { definition, fields } => {
                self.decode_udt(definition, fields, bytes, version)?
            }
            CodecKind::Custom => CqlValue::Blob(bytes.to_vec()),
        };
        Ok(Some(value))
    }

    fn format_value(&self, value: &CqlValue) -> Result<String, InvalidTypeError> {
        match (&self.kind, value) {
            (CodecKind::Native(native), value) => {
                if !native_accepts(*native, value) {
                    return Err(self.incompatible(native.name()));
                }
                Ok(CqlValueDisplayer(value).to_string())
            }
            (CodecKind::List(element), CqlValue::List(items)) => Ok(format!(
                "[{}]",
                items
                    .iter()
                    .map(|item| element.format_value(item))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(",")
            )),
            (CodecKind::Set(element), CqlValue::Set(items)) => Ok(format!(
                "{{{}}}",
                items
                    .iter()
                    .map(|item| element.format_value(item))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(",")
            )),
            (CodecKind::Map(key, val), CqlValue::Map(entries)) => Ok(format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| Ok(format!("{}:{}", key.format_value(k)?, val.format_value(v)?)))
                    .collect::<Result<Vec<_>, InvalidTypeError>>()?
                    .join(",")
            )),
            (CodecKind::Tuple(codec), CqlValue::Tuple(items)) => codec.format_value(items),
            (
                CodecKind::UserDefined { definition, fields: codecs },
                CqlValue::UserDefinedType { fields, .. },
            ) => {
                let mut parts = Vec::with_capacity(fields.len());
                for (name, field) in fields {
                    let idx = definition
                        .field_types
                        .iter()
                        .position(|(field, _)| field == name)
                        .ok_or_else(|| self.incompatible("fields of the user defined type"))?;
                    parts.push(format!(
                        "{}:{}",
                        CqlIdentifierDisplayer(name),
                        codecs[idx].format(field.as_ref())?
                    ));
                }
                Ok(format!("{{{}}}", parts.join(",")))
            }
            (CodecKind::Custom, CqlValue::Blob(_)) => Ok(CqlValueDisplayer(value).to_string()),
            _ => Err(self.incompatible("a value matching the type")),
        }
    }

    fn parse_literal(&self, literal: &str) -> Result<CqlValue, InvalidTypeError> {
        match &self.kind {
            CodecKind::Native(native) => self.parse_native(*native, literal),
            CodecKind::List(element) => {
                Ok(CqlValue::List(self.parse_elements(element, literal, "[", "]")?))
            }
            CodecKind::Set(element) => {
                Ok(CqlValue::Set(self.parse_elements(element, literal, "{", "}")?))
            }
            CodecKind::Map(key, val) => Ok(CqlValue::Map(self.parse_map(key, val, literal)?)),
            CodecKind::Tuple(codec) => Ok(CqlValue::Tuple(codec.parse_literal(literal)?)),
            CodecKind::UserDefined { definition, fields } => {
                self.parse_udt(definition, fields, literal)
            }
            CodecKind::Custom => Ok(CqlValue::Blob(BlobCodec.parse_literal(literal)?)),
        }
    }
}
