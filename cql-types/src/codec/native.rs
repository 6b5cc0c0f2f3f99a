//! Codecs binding plain Rust values to native CQL types.

use std::net::IpAddr;
use std::str::FromStr;

use bytes::Bytes;
use uuid::Uuid;

use super::temporal::parse_iso_timestamp;
use super::TypeCodec;
use crate::cql_type::{ColumnType, NativeType};
use crate::errors::{mk_err, unparsable, InvalidTypeError, InvalidTypeErrorKind};
use crate::frame::ProtocolVersion;
use crate::pretty::{FloatLiteral, HexBytes};
use crate::utils::literal::{is_long_literal, parse_hex_blob, quote, strip_optional_quotes, unquote};

/// Checks that a fixed-width payload has exactly `N` bytes.
pub(crate) fn fixed_bytes<const N: usize>(
    cql_type: &ColumnType,
    bytes: &[u8],
) -> Result<[u8; N], InvalidTypeError> {
    bytes.try_into().map_err(|_| {
        mk_err(
            cql_type,
            InvalidTypeErrorKind::ByteLengthMismatch {
                expected: N,
                got: bytes.len(),
            },
        )
    })
}

/// Strips the mandatory single quotes of a literal.
pub(crate) fn require_quotes(cql_type: &ColumnType, literal: &str) -> Result<String, InvalidTypeError> {
    unquote(literal).ok_or_else(|| {
        mk_err(
            cql_type,
            InvalidTypeErrorKind::MissingQuotes {
                literal: literal.to_owned(),
            },
        )
    })
}

trait NumericLiteral {
    fn literal(&self) -> String;
}

macro_rules! impl_integer_literal {
    ($($t:ty),*) => {
        $(impl NumericLiteral for $t {
            fn literal(&self) -> String {
                self.to_string()
            }
        })*
    };
}

impl_integer_literal!(i8, i16, i32, i64);

impl NumericLiteral for f32 {
    fn literal(&self) -> String {
        FloatLiteral(*self).to_string()
    }
}

impl NumericLiteral for f64 {
    fn literal(&self) -> String {
        FloatLiteral(*self).to_string()
    }
}

macro_rules! impl_numeric_codec {
    ($(#[$meta:meta])* $codec:ident, $native:ident, $rust:ty, $zero:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $codec;

        impl TypeCodec for $codec {
            type Value = $rust;

            fn cql_type(&self) -> &ColumnType {
                NativeType::$native.column_type()
            }

            fn encode(&self, value: &$rust, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
                Ok(Bytes::copy_from_slice(&value.to_be_bytes()))
            }

            fn decode(&self, bytes: &[u8], _version: ProtocolVersion) -> Result<Option<$rust>, InvalidTypeError> {
                // A zero-length payload reads as zero.
                if bytes.is_empty() {
                    return Ok(Some($zero));
                }
                let raw = fixed_bytes(self.cql_type(), bytes)?;
                Ok(Some(<$rust>::from_be_bytes(raw)))
            }

            fn format_value(&self, value: &$rust) -> Result<String, InvalidTypeError> {
                Ok(value.literal())
            }

            fn parse_literal(&self, literal: &str) -> Result<$rust, InvalidTypeError> {
                literal.parse::<$rust>().map_err(|_| {
                    mk_err(
                        self.cql_type(),
                        unparsable(literal, concat!("not a valid ", stringify!($rust), " literal")),
                    )
                })
            }
        }
    };
}

impl_numeric_codec!(
    /// `tinyint` as i8.
    TinyIntCodec, TinyInt, i8, 0
);
impl_numeric_codec!(
    /// `smallint` as i16.
    SmallIntCodec, SmallInt, i16, 0
);
impl_numeric_codec!(
    /// `int` as i32.
    IntCodec, Int, i32, 0
);
impl_numeric_codec!(
    /// `bigint` as i64.
    BigIntCodec, BigInt, i64, 0
);
impl_numeric_codec!(
    /// `counter` as i64.
    CounterCodec, Counter, i64, 0
);
impl_numeric_codec!(
    /// `float` as f32. `NaN` and `Infinity` are valid literals.
    FloatCodec, Float, f32, 0.0
);
impl_numeric_codec!(
    /// `double` as f64. `NaN` and `Infinity` are valid literals.
    DoubleCodec, Double, f64, 0.0
);

/// `boolean` as bool.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl TypeCodec for BooleanCodec {
    type Value = bool;

    fn cql_type(&self) -> &ColumnType {
        NativeType::Boolean.column_type()
    }

    fn encode(&self, value: &bool, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        Ok(Bytes::copy_from_slice(&[*value as u8]))
    }

    fn decode(&self, bytes: &[u8], _version: ProtocolVersion) -> Result<Option<bool>, InvalidTypeError> {
        if bytes.is_empty() {
            return Ok(Some(false));
        }
        let [b] = fixed_bytes::<1>(self.cql_type(), bytes)?;
        Ok(Some(b != 0))
    }

    fn format_value(&self, value: &bool) -> Result<String, InvalidTypeError> {
        Ok(value.to_string())
    }

    fn parse_literal(&self, literal: &str) -> Result<bool, InvalidTypeError> {
        if literal.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if literal.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(mk_err(
                self.cql_type(),
                unparsable(literal, "expected true or false"),
            ))
        }
    }
}

/// `text`, `varchar` or `ascii` as String.
///
/// Literals must be single-quoted; embedded quotes are doubled.
#[derive(Debug, Clone, Copy)]
pub struct TextCodec {
    native: NativeType,
}

impl TextCodec {
    /// UTF-8 strings of the `text` type.
    pub fn text() -> Self {
        Self {
            native: NativeType::Text,
        }
    }

    /// Same as [TextCodec::text], bound to the `varchar` alias.
    pub fn varchar() -> Self {
        Self {
            native: NativeType::Varchar,
        }
    }

    /// Rejects non-ASCII strings in both directions.
    pub fn ascii() -> Self {
        Self {
            native: NativeType::Ascii,
        }
    }

    fn check_ascii(&self, s: &str) -> Result<(), InvalidTypeError> {
        if self.native == NativeType::Ascii && !s.is_ascii() {
            return Err(mk_err(self.cql_type(), InvalidTypeErrorKind::ExpectedAscii));
        }
        Ok(())
    }
}

impl TypeCodec for TextCodec {
    type Value = String;

    fn cql_type(&self) -> &ColumnType {
        self.native.column_type()
    }

    fn encode(&self, value: &String, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        self.check_ascii(value)?;
        Ok(Bytes::copy_from_slice(value.as_bytes()))
    }

    fn decode(&self, bytes: &[u8], _version: ProtocolVersion) -> Result<Option<String>, InvalidTypeError> {
        let s = std::str::from_utf8(bytes).map_err(|err| mk_err(self.cql_type(), err))?;
        self.check_ascii(s)?;
        Ok(Some(s.to_owned()))
    }

    fn format_value(&self, value: &String) -> Result<String, InvalidTypeError> {
        Ok(quote(value))
    }

    fn parse_literal(&self, literal: &str) -> Result<String, InvalidTypeError> {
        let s = require_quotes(self.cql_type(), literal)?;
        self.check_ascii(&s)?;
        Ok(s)
    }
}

/// `blob` as a byte vector. Literals are `0x`-prefixed hexadecimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobCodec;

impl TypeCodec for BlobCodec {
    type Value = Vec<u8>;

    fn cql_type(&self) -> &ColumnType {
        NativeType::Blob.column_type()
    }

    fn encode(&self, value: &Vec<u8>, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        Ok(Bytes::copy_from_slice(value))
    }

    fn decode(&self, bytes: &[u8], _version: ProtocolVersion) -> Result<Option<Vec<u8>>, InvalidTypeError> {
        Ok(Some(bytes.to_vec()))
    }

    fn format_value(&self, value: &Vec<u8>) -> Result<String, InvalidTypeError> {
        Ok(format!("0x{:x}", HexBytes(value)))
    }

    fn parse_literal(&self, literal: &str) -> Result<Vec<u8>, InvalidTypeError> {
        parse_hex_blob(literal)
            .ok_or_else(|| mk_err(self.cql_type(), unparsable(literal, "not a hexadecimal blob")))
    }
}

/// `uuid` or `timeuuid` as [Uuid].
#[derive(Debug, Clone, Copy)]
pub struct UuidCodec {
    native: NativeType,
}

impl UuidCodec {
    /// Accepts UUIDs of any version.
    pub fn uuid() -> Self {
        Self {
            native: NativeType::Uuid,
        }
    }

    /// Accepts only version 1 (time-based) UUIDs.
    pub fn timeuuid() -> Self {
        Self {
            native: NativeType::Timeuuid,
        }
    }

    fn check_version(&self, uuid: Uuid) -> Result<Uuid, InvalidTypeError> {
        if self.native == NativeType::Timeuuid && uuid.get_version_num() != 1 {
            return Err(mk_err(
                self.cql_type(),
                InvalidTypeErrorKind::IncompatibleValue {
                    expected: "version 1 uuid",
                },
            ));
        }
        Ok(uuid)
    }
}

impl TypeCodec for UuidCodec {
    type Value = Uuid;

    fn cql_type(&self) -> &ColumnType {
        self.native.column_type()
    }

    fn encode(&self, value: &Uuid, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        let uuid = self.check_version(*value)?;
        Ok(Bytes::copy_from_slice(uuid.as_bytes()))
    }

    fn decode(&self, bytes: &[u8], _version: ProtocolVersion) -> Result<Option<Uuid>, InvalidTypeError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let raw = fixed_bytes::<16>(self.cql_type(), bytes)?;
        self.check_version(Uuid::from_bytes(raw)).map(Some)
    }

    fn format_value(&self, value: &Uuid) -> Result<String, InvalidTypeError> {
        Ok(value.to_string())
    }

    fn parse_literal(&self, literal: &str) -> Result<Uuid, InvalidTypeError> {
        let uuid = Uuid::parse_str(literal)
            .map_err(|_| mk_err(self.cql_type(), unparsable(literal, "not a valid uuid")))?;
        self.check_version(uuid)
    }
}

/// `inet` as [IpAddr]. Literals must be single-quoted.
#[derive(Debug, Clone, Copy, Default)]
pub struct InetCodec;

impl TypeCodec for InetCodec {
    type Value = IpAddr;

    fn cql_type(&self) -> &ColumnType {
        NativeType::Inet.column_type()
    }

    fn encode(&self, value: &IpAddr, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        Ok(match value {
            IpAddr::V4(addr) => Bytes::copy_from_slice(&addr.octets()),
            IpAddr::V6(addr) => Bytes::copy_from_slice(&addr.octets()),
        })
    }

    fn decode(&self, bytes: &[u8], _version: ProtocolVersion) -> Result<Option<IpAddr>, InvalidTypeError> {
        match bytes.len() {
            0 => Ok(None),
            4 => {
                let raw: [u8; 4] = fixed_bytes(self.cql_type(), bytes)?;
                Ok(Some(IpAddr::from(raw)))
            }
            16 => {
                let raw: [u8; 16] = fixed_bytes(self.cql_type(), bytes)?;
                Ok(Some(IpAddr::from(raw)))
            }
            got => Err(mk_err(
                self.cql_type(),
                InvalidTypeErrorKind::BadInetLength { got },
            )),
        }
    }

    fn format_value(&self, value: &IpAddr) -> Result<String, InvalidTypeError> {
        Ok(quote(&value.to_string()))
    }

    fn parse_literal(&self, literal: &str) -> Result<IpAddr, InvalidTypeError> {
        let address = require_quotes(self.cql_type(), literal)?;
        IpAddr::from_str(address.trim())
            .map_err(|_| mk_err(self.cql_type(), unparsable(literal, "not a valid IP address")))
    }
}

/// `timestamp` as raw milliseconds since the unix epoch.
///
/// Formats as a bare number. Parses either a number of milliseconds or an
/// ISO-8601 timestamp, both optionally single-quoted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampLongCodec;

impl TypeCodec for TimestampLongCodec {
    type Value = i64;

    fn cql_type(&self) -> &ColumnType {
        NativeType::Timestamp.column_type()
    }

    fn encode(&self, value: &i64, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        Ok(Bytes::copy_from_slice(&value.to_be_bytes()))
    }

    fn decode(&self, bytes: &[u8], _version: ProtocolVersion) -> Result<Option<i64>, InvalidTypeError> {
        if bytes.is_empty() {
            return Ok(Some(0));
        }
        let raw = fixed_bytes(self.cql_type(), bytes)?;
        Ok(Some(i64::from_be_bytes(raw)))
    }

    fn format_value(&self, value: &i64) -> Result<String, InvalidTypeError> {
        Ok(value.to_string())
    }

    fn parse_literal(&self, literal: &str) -> Result<i64, InvalidTypeError> {
        let inner = strip_optional_quotes(literal);
        if is_long_literal(&inner) {
            return inner
                .parse::<i64>()
                .map_err(|_| mk_err(self.cql_type(), InvalidTypeErrorKind::ValueOverflow));
        }
        parse_iso_timestamp(&inner)
            .map(|timestamp| timestamp.timestamp_millis())
            .ok_or_else(|| {
                mk_err(
                    self.cql_type(),
                    unparsable(literal, "expected milliseconds or an ISO-8601 timestamp"),
                )
            })
    }
}
