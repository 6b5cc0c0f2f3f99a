//! Codecs mapping chrono types to `timestamp`, `date`, `time` and to the
//! zoned timestamp stored as `tuple<timestamp, varchar>`.
//!
//! Timestamp literals are ISO-8601: a date, an optional time of day
//! separated by `T` or a space, with optional seconds and fraction, and an
//! optional zone given as `Z`, `UTC`/`GMT`/`UT` or a numeric offset.
//! A timestamp without a zone is read in UTC.
//!
//! The zone component of a zoned timestamp may also name a region of the
//! tz database, such as `Europe/Paris`.

use std::fmt::Write;

use bytes::Bytes;
use chrono_04::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use super::composite::{CompositeCodec, CompositeValue, ElementCodec};
use super::native::{fixed_bytes, require_quotes, TextCodec};
use super::TypeCodec;
use crate::cql_type::{ColumnType, NativeType};
use crate::errors::{mk_err, unparsable, InvalidTypeError, InvalidTypeErrorKind};
use crate::frame::ProtocolVersion;
use crate::utils::literal::{is_long_literal, quote, strip_optional_quotes};
use crate::utils::parse::ParserState;
use crate::value::{CqlDate, CqlTime};

fn take_digits(p: ParserState<'_>, count: usize) -> Option<(u32, ParserState<'_>)> {
    let input = p.remaining_input();
    let digits = input.get(..count)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (_, rest) = p.take_while({
        let mut taken = 0;
        move |_| {
            taken += 1;
            taken <= count
        }
    });
    Some((digits.parse().ok()?, rest))
}

fn parse_date(p: ParserState<'_>) -> Option<(NaiveDate, ParserState<'_>)> {
    let (negative, p) = match p.accept("-") {
        Ok(p) => (true, p),
        Err(_) => (false, p.accept("+").unwrap_or(p)),
    };
    let (year, p) = p.take_while(|c| c.is_ascii_digit());
    if year.len() < 4 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let year = if negative { -year } else { year };
    let (month, p) = take_digits(p.accept("-").ok()?, 2)?;
    let (day, p) = take_digits(p.accept("-").ok()?, 2)?;
    Some((NaiveDate::from_ymd_opt(year, month, day)?, p))
}

/// Parses `HH:MM[:SS[.fffffffff]]`.
fn parse_time_of_day(p: ParserState<'_>) -> Option<(NaiveTime, ParserState<'_>)> {
    let (hour, p) = take_digits(p, 2)?;
    let (minute, p) = take_digits(p.accept(":").ok()?, 2)?;
    let Ok(p) = p.accept(":") else {
        return Some((NaiveTime::from_hms_opt(hour, minute, 0)?, p));
    };
    let (second, p) = take_digits(p, 2)?;
    let Ok(p) = p.accept(".") else {
        return Some((NaiveTime::from_hms_opt(hour, minute, second)?, p));
    };
    let (fraction, p) = p.take_while(|c| c.is_ascii_digit());
    if fraction.is_empty() || fraction.len() > 9 {
        return None;
    }
    let nanos = fraction.parse::<u32>().ok()? * 10u32.pow(9 - fraction.len() as u32);
    Some((NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?, p))
}

/// Parses `±HH`, `±HHMM[SS]` or `±HH:MM[:SS]`, up to `±23:59:59`.
fn parse_offset(p: ParserState<'_>) -> Option<(FixedOffset, ParserState<'_>)> {
    let (sign, p) = match p.accept("+") {
        Ok(p) => (1, p),
        Err(_) => (-1, p.accept("-").ok()?),
    };
    let (hours, p) = take_digits(p, 2)?;
    let (minutes, seconds, p) = match p.accept(":") {
        Ok(p) => {
            let (minutes, p) = take_digits(p, 2)?;
            match p.accept(":") {
                Ok(p) => {
                    let (seconds, p) = take_digits(p, 2)?;
                    (minutes, seconds, p)
                }
                Err(_) => (minutes, 0, p),
            }
        }
        Err(_) => match take_digits(p, 2) {
            Some((minutes, p)) => {
                let (seconds, p) = take_digits(p, 2).unwrap_or((0, p));
                (minutes, seconds, p)
            }
            None => (0, 0, p),
        },
    };
    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }
    let total = (hours * 3600 + minutes * 60 + seconds) as i32;
    Some((FixedOffset::east_opt(sign * total)?, p))
}

fn parse_zone(p: ParserState<'_>) -> Option<(FixedOffset, ParserState<'_>)> {
    let utc = FixedOffset::east_opt(0)?;
    if let Ok(p) = p.accept("Z") {
        return Some((utc, p));
    }
    for prefix in ["UTC", "GMT", "UT"] {
        if let Ok(p) = p.accept(prefix) {
            if p.is_at_eof() {
                return Some((utc, p));
            }
            return parse_offset(p);
        }
    }
    parse_offset(p)
}

/// Parses an ISO-8601 timestamp.
pub(crate) fn parse_iso_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let (date, p) = parse_date(ParserState::new(text))?;
    let (time, p) = match p.accept("T").or_else(|_| p.accept(" ")) {
        Ok(p) => parse_time_of_day(p)?,
        Err(_) => (NaiveTime::MIN, p),
    };
    let p = p.skip_white();
    let (offset, p) = if p.is_at_eof() {
        (FixedOffset::east_opt(0)?, p)
    } else {
        parse_zone(p)?
    };
    if !p.is_at_eof() {
        return None;
    }
    offset
        .from_local_datetime(&NaiveDateTime::new(date, time))
        .single()
}

/// Parses the identifier of a zone: `Z`, `UTC`, `GMT`, `UT`, optionally
/// followed by an offset, or a bare offset.
pub(crate) fn parse_zone_id(text: &str) -> Option<FixedOffset> {
    let (offset, p) = parse_zone(ParserState::new(text.trim()))?;
    p.is_at_eof().then_some(offset)
}

/// `Z` for UTC, `±HH:MM` otherwise, with `:SS` when the offset has seconds.
pub(crate) fn format_zone_id(offset: &FixedOffset) -> String {
    let total = offset.local_minus_utc();
    if total == 0 {
        return "Z".to_owned();
    }
    let sign = if total < 0 { '-' } else { '+' };
    let total = total.unsigned_abs();
    let mut out = format!("{}{:02}:{:02}", sign, total / 3600, total / 60 % 60);
    if total % 60 != 0 {
        let _ = write!(out, ":{:02}", total % 60);
    }
    out
}

// Fractions are printed with as few digits as needed and omitted when zero.
fn push_fraction(out: &mut String, nanos: u32) {
    if nanos == 0 {
        return;
    }
    let digits = format!("{:09}", nanos);
    out.push('.');
    out.push_str(digits.trim_end_matches('0'));
}

/// Renders an instant as `YYYY-MM-DDTHH:MM:SS[.f]Z`.
pub(crate) fn format_instant(instant: &DateTime<Utc>) -> String {
    let mut out = instant.format("%Y-%m-%dT%H:%M:%S").to_string();
    push_fraction(&mut out, instant.nanosecond() % 1_000_000_000);
    out.push('Z');
    out
}

/// Renders a time of day the way it is usually written: seconds are
/// omitted when both they and the fraction are zero, the fraction is
/// printed in groups of three digits.
pub(crate) fn format_time_of_day(time: &NaiveTime) -> String {
    let mut out = format!("{:02}:{:02}", time.hour(), time.minute());
    let (second, nanos) = (time.second(), time.nanosecond() % 1_000_000_000);
    if second == 0 && nanos == 0 {
        return out;
    }
    let _ = write!(out, ":{:02}", second);
    if nanos == 0 {
        return out;
    }
    let _ = if nanos % 1_000_000 == 0 {
        write!(out, ".{:03}", nanos / 1_000_000)
    } else if nanos % 1_000 == 0 {
        write!(out, ".{:06}", nanos / 1_000)
    } else {
        write!(out, ".{:09}", nanos)
    };
    out
}

/// Parses a `date` literal: a quoted or bare `YYYY-MM-DD`, or the raw
/// unsigned day count centred on the unix epoch at 2^31.
pub(crate) fn parse_date_literal(literal: &str) -> Option<CqlDate> {
    let inner = strip_optional_quotes(literal);
    if is_long_literal(&inner) {
        return inner.parse::<u32>().ok().map(CqlDate);
    }
    let (date, p) = parse_date(ParserState::new(&inner))?;
    p.is_at_eof().then(|| CqlDate::from(date))
}

/// Parses a `time` literal: a quoted number of nanoseconds since midnight
/// or a quoted `HH:MM[:SS[.f]]`.
pub(crate) fn parse_time_literal(
    cql_type: &ColumnType,
    literal: &str,
) -> Result<CqlTime, InvalidTypeError> {
    let inner = require_quotes(cql_type, literal)?;
    let inner = inner.trim();
    let invalid = || mk_err(cql_type, unparsable(literal, "expected nanoseconds of the day or HH:MM:SS"));
    if is_long_literal(inner) {
        let nanos: i64 = inner.parse().map_err(|_| invalid())?;
        if !(0..=CqlTime::MAX_NANOS).contains(&nanos) {
            return Err(mk_err(cql_type, InvalidTypeErrorKind::ValueOverflow));
        }
        return Ok(CqlTime(nanos));
    }
    match parse_time_of_day(ParserState::new(inner)) {
        Some((time, p)) if p.is_at_eof() => {
            CqlTime::try_from(time).map_err(|err| mk_err(cql_type, err))
        }
        _ => Err(invalid()),
    }
}

/// Parses an optionally quoted timestamp literal: milliseconds since the
/// epoch or ISO-8601.
fn parse_instant_literal(cql_type: &ColumnType, literal: &str) -> Result<DateTime<Utc>, InvalidTypeError> {
    let inner = strip_optional_quotes(literal);
    if is_long_literal(&inner) {
        let millis: i64 = inner
            .parse()
            .map_err(|_| mk_err(cql_type, InvalidTypeErrorKind::ValueOverflow))?;
        return DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| mk_err(cql_type, InvalidTypeErrorKind::ValueOverflow));
    }
    parse_iso_timestamp(&inner)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .ok_or_else(|| {
            mk_err(
                cql_type,
                unparsable(literal, "expected milliseconds or an ISO-8601 timestamp"),
            )
        })
}

/// `timestamp` as a UTC instant with millisecond precision.
///
/// ```
/// # use cql_types::codec::{InstantCodec, TypeCodec};
/// let instant = InstantCodec.parse("1277860847999").unwrap().unwrap();
/// assert_eq!(InstantCodec.format_value(&instant).unwrap(), "'2010-06-30T01:20:47.999Z'");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantCodec;

impl TypeCodec for InstantCodec {
    type Value = DateTime<Utc>;

    fn cql_type(&self) -> &ColumnType {
        NativeType::Timestamp.column_type()
    }

    fn encode(&self, value: &DateTime<Utc>, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        Ok(Bytes::copy_from_slice(&value.timestamp_millis().to_be_bytes()))
    }

    fn decode(
        &self,
        bytes: &[u8],
        _version: ProtocolVersion,
    ) -> Result<Option<DateTime<Utc>>, InvalidTypeError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let millis = i64::from_be_bytes(fixed_bytes(self.cql_type(), bytes)?);
        DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| mk_err(self.cql_type(), InvalidTypeErrorKind::ValueOverflow))
    }

    fn format_value(&self, value: &DateTime<Utc>) -> Result<String, InvalidTypeError> {
        Ok(quote(&format_instant(value)))
    }

    fn parse_literal(&self, literal: &str) -> Result<DateTime<Utc>, InvalidTypeError> {
        parse_instant_literal(self.cql_type(), literal)
    }
}

/// `date` as a calendar date.
///
/// Formats as `'YYYY-MM-DD'`; parses that form or the raw day count.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDateCodec;

impl TypeCodec for LocalDateCodec {
    type Value = NaiveDate;

    fn cql_type(&self) -> &ColumnType {
        NativeType::Date.column_type()
    }

    fn encode(&self, value: &NaiveDate, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        Ok(Bytes::copy_from_slice(&CqlDate::from(*value).0.to_be_bytes()))
    }

    fn decode(&self, bytes: &[u8], _version: ProtocolVersion) -> Result<Option<NaiveDate>, InvalidTypeError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let days = u32::from_be_bytes(fixed_bytes(self.cql_type(), bytes)?);
        NaiveDate::try_from(CqlDate(days))
            .map(Some)
            .map_err(|err| mk_err(self.cql_type(), err))
    }

    fn format_value(&self, value: &NaiveDate) -> Result<String, InvalidTypeError> {
        Ok(quote(&value.format("%Y-%m-%d").to_string()))
    }

    fn parse_literal(&self, literal: &str) -> Result<NaiveDate, InvalidTypeError> {
        let date = parse_date_literal(literal)
            .ok_or_else(|| mk_err(self.cql_type(), unparsable(literal, "expected YYYY-MM-DD")))?;
        NaiveDate::try_from(date).map_err(|err| mk_err(self.cql_type(), err))
    }
}

/// `time` as a time of day with nanosecond precision.
///
/// Literals must be quoted and contain either `HH:MM[:SS[.f]]` or the
/// number of nanoseconds since midnight.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTimeCodec;

impl TypeCodec for LocalTimeCodec {
    type Value = NaiveTime;

    fn cql_type(&self) -> &ColumnType {
        NativeType::Time.column_type()
    }

    fn encode(&self, value: &NaiveTime, _version: ProtocolVersion) -> Result<Bytes, InvalidTypeError> {
        let nanos = CqlTime::try_from(*value).map_err(|err| mk_err(self.cql_type(), err))?;
        Ok(Bytes::copy_from_slice(&nanos.0.to_be_bytes()))
    }

    fn decode(&self, bytes: &[u8], _version: ProtocolVersion) -> Result<Option<NaiveTime>, InvalidTypeError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let nanos = i64::from_be_bytes(fixed_bytes(self.cql_type(), bytes)?);
        if !(0..=CqlTime::MAX_NANOS).contains(&nanos) {
            return Err(mk_err(self.cql_type(), InvalidTypeErrorKind::ValueOverflow));
        }
        NaiveTime::try_from(CqlTime(nanos))
            .map(Some)
            .map_err(|err| mk_err(self.cql_type(), err))
    }

    fn format_value(&self, value: &NaiveTime) -> Result<String, InvalidTypeError> {
        Ok(quote(&format_time_of_day(value)))
    }

    fn parse_literal(&self, literal: &str) -> Result<NaiveTime, InvalidTypeError> {
        let nanos = parse_time_literal(self.cql_type(), literal)?;
        NaiveTime::try_from(nanos).map_err(|err| mk_err(self.cql_type(), err))
    }
}

/// The zone component of a zoned timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Zone {
    Fixed(FixedOffset),
    /// A tz database region, whose offset depends on the instant.
    Region(Tz),
}

impl Zone {
    fn parse(id: &str) -> Option<Self> {
        if let Some(offset) = parse_zone_id(id) {
            return Some(Zone::Fixed(offset));
        }
        id.trim().parse::<Tz>().ok().map(Zone::Region)
    }

    fn id(&self) -> String {
        match self {
            Zone::Fixed(offset) => format_zone_id(offset),
            Zone::Region(tz) => tz.name().to_owned(),
        }
    }

    fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset {
        match self {
            Zone::Fixed(offset) => *offset,
            Zone::Region(tz) => tz.offset_from_utc_datetime(&instant.naive_utc()).fix(),
        }
    }
}

/// Components of a zoned timestamp as they travel through the tuple codec.
#[derive(Debug, Clone, Default)]
struct ZonedParts {
    instant: Option<DateTime<Utc>>,
    zone: Option<Zone>,
}

impl CompositeValue for ZonedParts {
    fn with_arity(_arity: usize) -> Self {
        Self::default()
    }
}

impl ZonedParts {
    fn into_zoned(self) -> Option<DateTime<FixedOffset>> {
        let instant = self.instant?;
        let offset = match self.zone {
            Some(zone) => zone.offset_at(&instant),
            None => Utc.fix(),
        };
        Some(instant.with_timezone(&offset))
    }
}

impl From<&DateTime<FixedOffset>> for ZonedParts {
    fn from(value: &DateTime<FixedOffset>) -> Self {
        Self {
            instant: Some(value.with_timezone(&Utc)),
            zone: Some(Zone::Fixed(*value.offset())),
        }
    }
}

struct InstantElement {
    cql_type: ColumnType,
}

impl ElementCodec<ZonedParts> for InstantElement {
    fn element_type(&self) -> &ColumnType {
        &self.cql_type
    }

    fn serialize_element(
        &self,
        value: &ZonedParts,
        version: ProtocolVersion,
    ) -> Result<Option<Bytes>, InvalidTypeError> {
        InstantCodec.serialize(value.instant.as_ref(), version)
    }

    fn deserialize_element(
        &self,
        value: &mut ZonedParts,
        bytes: Option<&[u8]>,
        version: ProtocolVersion,
    ) -> Result<(), InvalidTypeError> {
        value.instant = InstantCodec.deserialize(bytes, version)?;
        Ok(())
    }

    fn format_element(&self, value: &ZonedParts) -> Result<String, InvalidTypeError> {
        InstantCodec.format(value.instant.as_ref())
    }

    fn parse_element(&self, value: &mut ZonedParts, literal: &str) -> Result<(), InvalidTypeError> {
        value.instant = InstantCodec.parse(literal)?;
        Ok(())
    }
}

struct ZoneElement {
    text: TextCodec,
}

impl ZoneElement {
    fn parse_id(&self, id: &str) -> Result<Zone, InvalidTypeError> {
        Zone::parse(id).ok_or_else(|| {
            mk_err(
                self.element_type(),
                unparsable(id, "expected Z, UTC, a numeric offset or a region"),
            )
        })
    }
}

impl ElementCodec<ZonedParts> for ZoneElement {
    fn element_type(&self) -> &ColumnType {
        self.text.cql_type()
    }

    fn serialize_element(
        &self,
        value: &ZonedParts,
        version: ProtocolVersion,
    ) -> Result<Option<Bytes>, InvalidTypeError> {
        let id = value.zone.as_ref().map(Zone::id);
        self.text.serialize(id.as_ref(), version)
    }

    fn deserialize_element(
        &self,
        value: &mut ZonedParts,
        bytes: Option<&[u8]>,
        version: ProtocolVersion,
    ) -> Result<(), InvalidTypeError> {
        value.zone = match self.text.deserialize(bytes, version)? {
            Some(id) => Some(self.parse_id(&id)?),
            None => None,
        };
        Ok(())
    }

    fn format_element(&self, value: &ZonedParts) -> Result<String, InvalidTypeError> {
        let id = value.zone.as_ref().map(Zone::id);
        self.text.format(id.as_ref())
    }

    fn parse_element(&self, value: &mut ZonedParts, literal: &str) -> Result<(), InvalidTypeError> {
        value.zone = match self.text.parse(literal)? {
            Some(id) => Some(self.parse_id(&id)?),
            None => None,
        };
        Ok(())
    }
}

/// A timestamp together with its zone offset, stored as
/// `tuple<timestamp, varchar>`: the instant in milliseconds and the zone id.
///
/// The instant element is always formatted in UTC; the offset is applied
/// when the tuple is read back. A missing zone reads as UTC, a missing
/// instant makes the whole value absent. A region zone id reads as the
/// offset the region had at that instant, and is written back as that
/// offset.
#[derive(Debug)]
pub struct ZonedTimestampCodec {
    inner: CompositeCodec<ZonedParts>,
}

impl ZonedTimestampCodec {
    /// Builds the codec for `tuple<timestamp, varchar>` (or `text`).
    pub fn new(cql_type: &ColumnType) -> Result<Self, InvalidTypeError> {
        let unsupported = || {
            mk_err(
                cql_type,
                InvalidTypeErrorKind::UnsupportedType {
                    codec: "ZonedTimestampCodec",
                },
            )
        };
        let ColumnType::Tuple(elements) = cql_type else {
            return Err(unsupported());
        };
        let [ColumnType::Native(NativeType::Timestamp), ColumnType::Native(zone)] =
            elements.as_slice()
        else {
            return Err(unsupported());
        };
        let text = match zone {
            NativeType::Varchar => TextCodec::varchar(),
            NativeType::Text => TextCodec::text(),
            _ => return Err(unsupported()),
        };
        let elements: Vec<Box<dyn ElementCodec<ZonedParts>>> = vec![
            Box::new(InstantElement {
                cql_type: NativeType::Timestamp.column_type().clone(),
            }),
            Box::new(ZoneElement { text }),
        ];
        Ok(Self {
            inner: CompositeCodec::new(cql_type.clone(), elements)?,
        })
    }

    /// The codec for `tuple<timestamp, varchar>`.
    pub fn with_varchar_zone() -> Result<Self, InvalidTypeError> {
        Self::new(&ColumnType::tuple([
            NativeType::Timestamp.into(),
            NativeType::Varchar.into(),
        ]))
    }
}

impl TypeCodec for ZonedTimestampCodec {
    type Value = DateTime<FixedOffset>;

    fn cql_type(&self) -> &ColumnType {
        self.inner.cql_type()
    }

    fn encode(
        &self,
        value: &DateTime<FixedOffset>,
        version: ProtocolVersion,
    ) -> Result<Bytes, InvalidTypeError> {
        self.inner.encode(&ZonedParts::from(value), version)
    }

    fn decode(
        &self,
        bytes: &[u8],
        version: ProtocolVersion,
    ) -> Result<Option<DateTime<FixedOffset>>, InvalidTypeError> {
        Ok(self
            .inner
            .decode(bytes, version)?
            .and_then(ZonedParts::into_zoned))
    }

    fn format_value(&self, value: &DateTime<FixedOffset>) -> Result<String, InvalidTypeError> {
        self.inner.format_value(&ZonedParts::from(value))
    }

    fn parse_literal(&self, literal: &str) -> Result<DateTime<FixedOffset>, InvalidTypeError> {
        self.inner
            .parse_literal(literal)?
            .into_zoned()
            .ok_or_else(|| mk_err(self.cql_type(), unparsable(literal, "missing timestamp component")))
    }
}

#[cfg(test)]
mod tests {
    use chrono_04::{NaiveDate, NaiveTime};

    use chrono_04::FixedOffset;

    use super::{format_time_of_day, format_zone_id, parse_iso_timestamp, parse_zone_id, Zone};

    #[test]
    fn iso_timestamps() {
        let expected = 1_277_860_847_999;
        for text in [
            "2010-06-30T01:20:47.999Z",
            "2010-06-30T01:20:47.999",
            "2010-06-30T01:20:47.999+00:00",
            "2010-06-30T02:20:47.999+01:00",
            "2010-06-30T02:20:47.999+0100",
            "2010-06-30T02:20:47.999 UTC+01:00",
            "2010-06-29T20:20:47.999-05",
            "2010-06-30 01:20:47.999+0000",
        ] {
            let parsed = parse_iso_timestamp(text).unwrap_or_else(|| panic!("{text}"));
            assert_eq!(parsed.timestamp_millis(), expected, "{text}");
        }
        assert_eq!(
            parse_iso_timestamp("2010-06-30").unwrap().timestamp_millis(),
            1_277_856_000_000
        );
        assert_eq!(
            parse_iso_timestamp("2010-06-30T01:20").unwrap().timestamp_millis(),
            1_277_860_800_000
        );
    }

    #[test]
    fn invalid_timestamps() {
        for text in [
            "",
            "2010-6-30",
            "2010-06-31",
            "2010-06-30T25:00",
            "2010-06-30T01:20:47.1234567890",
            "2010-06-30T01:20:47 Europe/Paris",
            "2010-06-30T01:20:47Zjunk",
            "yesterday",
        ] {
            assert!(parse_iso_timestamp(text).is_none(), "{text}");
        }
    }

    #[test]
    fn zone_ids() {
        assert_eq!(parse_zone_id("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_zone_id("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_zone_id("+01:00").unwrap().local_minus_utc(), 3600);
        assert_eq!(parse_zone_id("GMT-02:30").unwrap().local_minus_utc(), -9000);
        assert_eq!(parse_zone_id("+01:00:30").unwrap().local_minus_utc(), 3630);
        assert_eq!(parse_zone_id("-010030").unwrap().local_minus_utc(), -3630);
        assert_eq!(parse_zone_id("+19:00").unwrap().local_minus_utc(), 19 * 3600);
        assert_eq!(parse_zone_id("-23:59:59").unwrap().local_minus_utc(), -86_399);
        assert!(parse_zone_id("America/New_York").is_none());
        assert!(parse_zone_id("+24:00").is_none());
        assert!(parse_zone_id("+01:60").is_none());
        assert!(parse_zone_id("+01:00:60").is_none());
    }

    #[test]
    fn zone_ids_round_trip() {
        for seconds in [0, 3600, -9000, 3630, -3630, 19 * 3600, 86_399, -86_399] {
            let offset = FixedOffset::east_opt(seconds).unwrap();
            let id = format_zone_id(&offset);
            assert_eq!(parse_zone_id(&id), Some(offset), "{id}");
        }
        assert_eq!(format_zone_id(&FixedOffset::east_opt(3630).unwrap()), "+01:00:30");
        assert_eq!(format_zone_id(&FixedOffset::west_opt(9000).unwrap()), "-02:30");
    }

    #[test]
    fn region_zones() {
        assert_eq!(Zone::parse("Europe/Paris").unwrap().id(), "Europe/Paris");
        assert_eq!(Zone::parse("+01:00"), Some(Zone::Fixed(FixedOffset::east_opt(3600).unwrap())));
        assert!(Zone::parse("Mars/Olympus_Mons").is_none());
    }

    #[test]
    fn times_of_day() {
        let t = |h, m, s, n| NaiveTime::from_hms_nano_opt(h, m, s, n).unwrap();
        assert_eq!(format_time_of_day(&t(13, 25, 0, 0)), "13:25");
        assert_eq!(format_time_of_day(&t(13, 25, 47, 0)), "13:25:47");
        assert_eq!(format_time_of_day(&t(13, 25, 47, 123_000_000)), "13:25:47.123");
        assert_eq!(format_time_of_day(&t(13, 25, 47, 123_456_000)), "13:25:47.123456");
        assert_eq!(format_time_of_day(&t(13, 25, 47, 123_456_789)), "13:25:47.123456789");
        assert_eq!(format_time_of_day(&t(0, 0, 0, 1_000_000)), "00:00:00.001");
    }

    #[test]
    fn dates_before_common_era() {
        let parsed = parse_iso_timestamp("-0044-03-15T12:00Z").unwrap();
        assert_eq!(parsed.date_naive(), NaiveDate::from_ymd_opt(-44, 3, 15).unwrap());
    }
}
