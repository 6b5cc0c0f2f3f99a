use std::net::IpAddr;

use thiserror::Error;
use uuid::Uuid;

use crate::pretty::CqlValueDisplayer;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[error("Value is too large to fit in the CQL type")]
pub struct ValueOverflow;

/// Represents an counter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Counter(pub i64);

/// Native CQL date representation that allows for a bigger range of dates (-262145-1-1 to 262143-12-31).
///
/// Represented as number of days since -5877641-06-23 i.e. 2^31 days before unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CqlDate(pub u32);

/// Native CQL timestamp representation that allows full supported timestamp range.
///
/// Represented as signed milliseconds since unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CqlTimestamp(pub i64);

/// Native CQL time representation.
///
/// Represented as nanoseconds since midnight.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CqlTime(pub i64);

impl CqlDate {
    /// The date of the unix epoch.
    pub const UNIX_EPOCH: CqlDate = CqlDate(1 << 31);

    /// Signed number of days since the unix epoch.
    pub fn days_since_epoch(self) -> i64 {
        self.0 as i64 - (1 << 31)
    }

    pub fn from_days_since_epoch(days: i64) -> Result<Self, ValueOverflow> {
        u32::try_from(days + (1 << 31))
            .map(CqlDate)
            .map_err(|_| ValueOverflow)
    }
}

impl CqlTime {
    pub const MAX_NANOS: i64 = 86_399_999_999_999;
}

impl From<chrono_04::NaiveDate> for CqlDate {
    fn from(value: chrono_04::NaiveDate) -> Self {
        let unix_epoch = chrono_04::DateTime::<chrono_04::Utc>::UNIX_EPOCH.date_naive();

        // `NaiveDate` range is -262145-01-01 to 262143-12-31
        // Both values are well within supported range
        let days = ((1 << 31) + value.signed_duration_since(unix_epoch).num_days()) as u32;

        Self(days)
    }
}

impl TryFrom<CqlDate> for chrono_04::NaiveDate {
    type Error = ValueOverflow;

    fn try_from(value: CqlDate) -> Result<Self, Self::Error> {
        // A u32 shifted by 2^31 always fits in chrono::Duration.
        let duration_since_unix_epoch =
            chrono_04::Duration::try_days(value.days_since_epoch()).ok_or(ValueOverflow)?;

        chrono_04::DateTime::<chrono_04::Utc>::UNIX_EPOCH
            .date_naive()
            .checked_add_signed(duration_since_unix_epoch)
            .ok_or(ValueOverflow)
    }
}

impl From<chrono_04::DateTime<chrono_04::Utc>> for CqlTimestamp {
    fn from(value: chrono_04::DateTime<chrono_04::Utc>) -> Self {
        Self(value.timestamp_millis())
    }
}

impl TryFrom<CqlTimestamp> for chrono_04::DateTime<chrono_04::Utc> {
    type Error = ValueOverflow;

    fn try_from(value: CqlTimestamp) -> Result<Self, Self::Error> {
        chrono_04::DateTime::from_timestamp_millis(value.0).ok_or(ValueOverflow)
    }
}

impl TryFrom<chrono_04::NaiveTime> for CqlTime {
    type Error = ValueOverflow;

    fn try_from(value: chrono_04::NaiveTime) -> Result<Self, Self::Error> {
        let nanos = value
            .signed_duration_since(chrono_04::NaiveTime::MIN)
            .num_nanoseconds()
            .ok_or(ValueOverflow)?;

        // Value can exceed max CQL time in case of leap second
        if nanos <= CqlTime::MAX_NANOS {
            Ok(Self(nanos))
        } else {
            Err(ValueOverflow)
        }
    }
}

impl TryFrom<CqlTime> for chrono_04::NaiveTime {
    type Error = ValueOverflow;

    fn try_from(value: CqlTime) -> Result<Self, Self::Error> {
        let secs = (value.0 / 1_000_000_000)
            .try_into()
            .map_err(|_| ValueOverflow)?;
        let nanos = (value.0 % 1_000_000_000)
            .try_into()
            .map_err(|_| ValueOverflow)?;
        chrono_04::NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).ok_or(ValueOverflow)
    }
}

/// A dynamically typed CQL value.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum CqlValue {
    Ascii(String),
    Boolean(bool),
    Blob(Vec<u8>),
    Counter(Counter),
    Decimal(bigdecimal_04::BigDecimal),
    /// Days since -5877641-06-23 i.e. 2^31 days before unix epoch
    Date(CqlDate),
    Double(f64),
    /// A zero-length payload of a type for which it is not a regular value.
    Empty,
    Float(f32),
    Int(i32),
    BigInt(i64),
    /// Used for both `text` and `varchar`.
    Text(String),
    /// Milliseconds since unix epoch
    Timestamp(CqlTimestamp),
    Inet(IpAddr),
    List(Vec<CqlValue>),
    Map(Vec<(CqlValue, CqlValue)>),
    Set(Vec<CqlValue>),
    UserDefinedType {
        keyspace: String,
        name: String,
        /// Order of `fields` vector must match the order of fields as defined in the UDT.
        fields: Vec<(String, Option<CqlValue>)>,
    },
    SmallInt(i16),
    TinyInt(i8),
    /// Nanoseconds since midnight
    Time(CqlTime),
    Timeuuid(Uuid),
    Tuple(Vec<Option<CqlValue>>),
    Uuid(Uuid),
    Varint(num_bigint_04::BigInt),
}

impl CqlValue {
    pub fn as_ascii(&self) -> Option<&String> {
        match self {
            Self::Ascii(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Vec<u8>> {
        match self {
            Self::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bigint(&self) -> Option<i64> {
        match self {
            Self::BigInt(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_cql_date(&self) -> Option<CqlDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_cql_timestamp(&self) -> Option<CqlTimestamp> {
        match self {
            Self::Timestamp(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_cql_time(&self) -> Option<CqlTime> {
        match self {
            Self::Time(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(u) | Self::Timeuuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<CqlValue>> {
        match self {
            Self::List(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&Vec<CqlValue>> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Vec<(CqlValue, CqlValue)>> {
        match self {
            Self::Map(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&Vec<Option<CqlValue>>> {
        match self {
            Self::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Self::Ascii(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for CqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", CqlValueDisplayer(self))
    }
}

#[cfg(test)]
mod tests {
    use chrono_04::{NaiveDate, NaiveTime};

    use super::{CqlDate, CqlTime, CqlTimestamp, ValueOverflow};

    #[test]
    fn date_conversions() {
        let date = NaiveDate::from_ymd_opt(2010, 6, 30).unwrap();
        let cql: CqlDate = date.into();
        assert_eq!(cql.days_since_epoch(), 14790);
        assert_eq!(NaiveDate::try_from(cql), Ok(date));

        assert_eq!(CqlDate::UNIX_EPOCH.days_since_epoch(), 0);
        // The extreme CQL dates do not fit into chrono.
        assert_eq!(NaiveDate::try_from(CqlDate(0)), Err(ValueOverflow));
        assert_eq!(CqlDate::from_days_since_epoch(-(1 << 31)), Ok(CqlDate(0)));
        assert_eq!(
            CqlDate::from_days_since_epoch(1 << 31),
            Err(ValueOverflow)
        );
    }

    #[test]
    fn timestamp_conversions() {
        let ts = CqlTimestamp(1_277_860_847_999);
        let dt: chrono_04::DateTime<chrono_04::Utc> = ts.try_into().unwrap();
        assert_eq!(
            dt.to_rfc3339_opts(chrono_04::SecondsFormat::Millis, true),
            "2010-06-30T01:20:47.999Z"
        );
        assert_eq!(CqlTimestamp::from(dt), ts);
        assert!(chrono_04::DateTime::<chrono_04::Utc>::try_from(CqlTimestamp(i64::MAX)).is_err());
    }

    #[test]
    fn time_conversions() {
        let time = NaiveTime::from_hms_milli_opt(13, 25, 47, 123).unwrap();
        let cql = CqlTime::try_from(time).unwrap();
        assert_eq!(cql, CqlTime(48_347_123_000_000));
        assert_eq!(NaiveTime::try_from(cql), Ok(time));

        let leap = NaiveTime::from_hms_nano_opt(23, 59, 59, 1_500_000_000).unwrap();
        assert_eq!(CqlTime::try_from(leap), Err(ValueOverflow));
    }
}
