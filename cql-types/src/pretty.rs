//! Displayers producing CQL literal and identifier syntax.

use std::borrow::Borrow;
use std::fmt::{Display, LowerHex, UpperHex};

use itertools::Itertools;

use crate::codec::temporal::format_instant;
use crate::value::{CqlDate, CqlTime, CqlTimestamp, CqlValue};

pub(crate) struct HexBytes<'a>(pub(crate) &'a [u8]);

impl LowerHex for HexBytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl UpperHex for HexBytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

/// Displays a CqlValue using CQL literal syntax.
///
/// Scalars render in a form accepted back by the literal parsers of
/// [crate::codec::CqlValueCodec]. Nulls inside tuples and UDTs render as `NULL`.
pub struct CqlValueDisplayer<C>(pub C);

impl<C> Display for CqlValueDisplayer<C>
where
    C: Borrow<CqlValue>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.borrow() {
            // Scalar types
            CqlValue::Ascii(a) => write!(f, "{}", CqlStringLiteralDisplayer(a))?,
            CqlValue::Text(t) => write!(f, "{}", CqlStringLiteralDisplayer(t))?,
            CqlValue::Blob(b) => write!(f, "0x{:x}", HexBytes(b))?,
            CqlValue::Empty => write!(f, "0x")?,
            CqlValue::Decimal(d) => write!(f, "{}", d)?,
            CqlValue::Float(fl) => write!(f, "{}", FloatLiteral(*fl))?,
            CqlValue::Double(d) => write!(f, "{}", FloatLiteral(*d))?,
            CqlValue::Boolean(b) => write!(f, "{}", b)?,
            CqlValue::Int(i) => write!(f, "{}", i)?,
            CqlValue::BigInt(bi) => write!(f, "{}", bi)?,
            CqlValue::Inet(i) => write!(f, "'{}'", i)?,
            CqlValue::SmallInt(si) => write!(f, "{}", si)?,
            CqlValue::TinyInt(ti) => write!(f, "{}", ti)?,
            CqlValue::Varint(vi) => write!(f, "{}", vi)?,
            CqlValue::Counter(c) => write!(f, "{}", c.0)?,
            CqlValue::Date(date) => match chrono_04::NaiveDate::try_from(*date) {
                Ok(d) => write!(f, "'{}'", d.format("%Y-%m-%d"))?,
                // Outside of chrono's range the raw day count is still a valid literal.
                Err(_) => write!(f, "{}", date.0)?,
            },
            CqlValue::Time(CqlTime(t)) => {
                write!(
                    f,
                    "'{:02}:{:02}:{:02}.{:09}'",
                    t / 3_600_000_000_000,
                    t / 60_000_000_000 % 60,
                    t / 1_000_000_000 % 60,
                    t % 1_000_000_000,
                )?;
            }
            CqlValue::Timestamp(ts @ CqlTimestamp(millis)) => {
                match chrono_04::DateTime::<chrono_04::Utc>::try_from(*ts) {
                    Ok(d) => write!(f, "'{}'", format_instant(&d))?,
                    Err(_) => write!(f, "{}", millis)?,
                }
            }
            CqlValue::Timeuuid(t) => write!(f, "{}", t)?,
            CqlValue::Uuid(u) => write!(f, "{}", u)?,

            // Compound types
            CqlValue::Tuple(t) => {
                f.write_str("(")?;
                t.iter()
                    .map(|x| MaybeNullDisplayer(x.as_ref().map(CqlValueDisplayer)))
                    .format(",")
                    .fmt(f)?;
                f.write_str(")")?;
            }
            CqlValue::List(v) => {
                f.write_str("[")?;
                v.iter().map(CqlValueDisplayer).format(",").fmt(f)?;
                f.write_str("]")?;
            }
            CqlValue::Set(v) => {
                f.write_str("{")?;
                v.iter().map(CqlValueDisplayer).format(",").fmt(f)?;
                f.write_str("}")?;
            }
            CqlValue::Map(m) => {
                f.write_str("{")?;
                m.iter()
                    .map(|(k, v)| PairDisplayer(CqlValueDisplayer(k), CqlValueDisplayer(v)))
                    .format(",")
                    .fmt(f)?;
                f.write_str("}")?;
            }
            CqlValue::UserDefinedType {
                keyspace: _,
                name: _,
                fields,
            } => {
                f.write_str("{")?;
                fields
                    .iter()
                    .map(|(k, v)| {
                        PairDisplayer(
                            CqlIdentifierDisplayer(k),
                            MaybeNullDisplayer(v.as_ref().map(CqlValueDisplayer)),
                        )
                    })
                    .format(",")
                    .fmt(f)?;
                f.write_str("}")?;
            }
        }
        Ok(())
    }
}

pub(crate) struct FloatLiteral<T>(pub(crate) T);

impl<T> Display for FloatLiteral<T>
where
    T: Display + Into<f64> + Copy,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value: f64 = self.0.into();
        if value.is_nan() {
            f.write_str("NaN")
        } else if value.is_infinite() {
            f.write_str(if value > 0.0 { "Infinity" } else { "-Infinity" })
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Displays a string as a CQL string literal.
pub struct CqlStringLiteralDisplayer<'a>(pub &'a str);

impl Display for CqlStringLiteralDisplayer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // CQL string literals use single quotes. The only character that
        // needs escaping is singular quote, and escaping is done by repeating
        // the quote character.
        f.write_str("'")?;
        let mut first = true;
        for part in self.0.split('\'') {
            if first {
                first = false;
            } else {
                f.write_str("''")?;
            }
            f.write_str(part)?;
        }
        f.write_str("'")?;
        Ok(())
    }
}

// Keywords that cannot be used as unquoted identifiers.
const RESERVED_KEYWORDS: &[&str] = &[
    "add", "allow", "alter", "and", "apply", "asc", "authorize", "batch", "begin", "by",
    "columnfamily", "create", "delete", "desc", "describe", "drop", "entries", "execute", "from",
    "full", "grant", "if", "in", "index", "infinity", "insert", "into", "is", "keyspace", "limit",
    "materialized", "mbean", "mbeans", "modify", "nan", "norecursive", "not", "null", "of", "on",
    "or", "order", "primary", "rename", "replace", "revoke", "schema", "select", "set", "table",
    "to", "token", "truncate", "unlogged", "unset", "update", "use", "using", "view", "where",
    "with",
];

/// Whether the identifier can be written without double quotes.
pub fn is_plain_identifier(id: &str) -> bool {
    let mut chars = id.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    starts_with_letter
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !RESERVED_KEYWORDS.contains(&id)
}

/// Displays a CQL identifier, double-quoting it when needed.
pub struct CqlIdentifierDisplayer<'a>(pub &'a str);

impl Display for CqlIdentifierDisplayer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if is_plain_identifier(self.0) {
            return f.write_str(self.0);
        }
        f.write_str("\"")?;
        f.write_str(&self.0.replace('"', "\"\""))?;
        f.write_str("\"")
    }
}

pub(crate) struct PairDisplayer<K, V>(K, V);

impl<K, V> Display for PairDisplayer<K, V>
where
    K: Display,
    V: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

pub(crate) struct MaybeNullDisplayer<T>(pub(crate) Option<T>);

impl<T> Display for MaybeNullDisplayer<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            None => write!(f, "NULL")?,
            Some(v) => write!(f, "{}", v)?,
        }
        Ok(())
    }
}
