use assert_matches::assert_matches;
use chrono_04::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use super::{InstantCodec, LocalDateCodec, LocalTimeCodec, TypeCodec, ZonedTimestampCodec};
use crate::cql_type::{ColumnType, NativeType};
use crate::errors::InvalidTypeErrorKind;
use crate::frame::ProtocolVersion;

const V4: ProtocolVersion = ProtocolVersion::V4;
const MILLIS: i64 = 1_277_860_847_999;

fn instant() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(MILLIS).unwrap()
}

fn plus_one_hour() -> FixedOffset {
    FixedOffset::east_opt(3600).unwrap()
}

#[test]
fn instant_parses_millis_and_iso() {
    let codec = InstantCodec;
    for literal in [
        "1277860847999",
        "'1277860847999'",
        "'2010-06-30T01:20:47.999Z'",
        "'2010-06-30T01:20:47.999'",
        "'2010-06-30T02:20:47.999+01:00'",
        "2010-06-30T01:20:47.999Z",
    ] {
        assert_eq!(codec.parse(literal).unwrap(), Some(instant()), "{literal}");
    }
}

#[test]
fn instant_parses_partial_times() {
    let codec = InstantCodec;
    let at = |h, m, s| Utc.with_ymd_and_hms(2010, 6, 30, h, m, s).unwrap();
    assert_eq!(codec.parse("'2010-06-30T01:20'").unwrap(), Some(at(1, 20, 0)));
    assert_eq!(codec.parse("'2010-06-30T01:20Z'").unwrap(), Some(at(1, 20, 0)));
    assert_eq!(codec.parse("'2010-06-30T01:20:47'").unwrap(), Some(at(1, 20, 47)));
    assert_eq!(
        codec.parse("'2010-06-30T01:20:47+01:00'").unwrap(),
        Some(at(0, 20, 47))
    );
    assert_eq!(
        codec.parse("'2010-06-30T01:20:47.999999Z'").unwrap(),
        Some(
            at(1, 20, 47)
                + chrono_04::Duration::microseconds(999_999)
        )
    );
}

#[test]
fn instant_formats_in_utc() {
    let codec = InstantCodec;
    assert_eq!(
        codec.format_value(&instant()).unwrap(),
        "'2010-06-30T01:20:47.999Z'"
    );
    let whole = Utc.with_ymd_and_hms(2010, 6, 30, 1, 20, 0).unwrap();
    assert_eq!(codec.format_value(&whole).unwrap(), "'2010-06-30T01:20:00Z'");
    assert_eq!(codec.format(None).unwrap(), "NULL");
}

#[test]
fn instant_wire_form() {
    let codec = InstantCodec;
    let bytes = codec.encode(&instant(), V4).unwrap();
    assert_eq!(&bytes[..], &MILLIS.to_be_bytes());
    assert_eq!(codec.decode(&bytes, V4).unwrap(), Some(instant()));
    assert_eq!(codec.decode(&[], V4).unwrap(), None);
    assert_matches!(
        codec.decode(&[0, 1], V4).unwrap_err().kind,
        InvalidTypeErrorKind::ByteLengthMismatch {
            expected: 8,
            got: 2
        }
    );
}

#[test]
fn instant_rejects_garbage() {
    assert_matches!(
        InstantCodec.parse("'30/06/2010'").unwrap_err().kind,
        InvalidTypeErrorKind::UnparsableLiteral { .. }
    );
}

#[test]
fn local_date() {
    let codec = LocalDateCodec;
    let date = NaiveDate::from_ymd_opt(2010, 6, 30).unwrap();
    let raw = ((1u32 << 31) + 14790).to_string();

    assert_eq!(codec.parse(&raw).unwrap(), Some(date));
    assert_eq!(codec.parse("'2010-06-30'").unwrap(), Some(date));
    assert_eq!(codec.format_value(&date).unwrap(), "'2010-06-30'");

    let bytes = codec.encode(&date, V4).unwrap();
    assert_eq!(&bytes[..], &((1u32 << 31) + 14790).to_be_bytes());
    assert_eq!(codec.decode(&bytes, V4).unwrap(), Some(date));
    assert!(codec.parse("'2010-02-30'").is_err());
}

#[test]
fn local_time_parses() {
    let codec = LocalTimeCodec;
    let t = |n| NaiveTime::from_hms_nano_opt(13, 25, 47, n).unwrap();
    for (literal, expected) in [
        ("'48347123456789'", t(123_456_789)),
        ("'13:25:47'", t(0)),
        ("'13:25:47.123'", t(123_000_000)),
        ("'13:25:47.123456'", t(123_456_000)),
        ("'13:25:47.123456789'", t(123_456_789)),
    ] {
        assert_eq!(codec.parse(literal).unwrap(), Some(expected), "{literal}");
    }
}

#[test]
fn local_time_requires_quotes() {
    assert_matches!(
        LocalTimeCodec.parse("13:25:47").unwrap_err().kind,
        InvalidTypeErrorKind::MissingQuotes { .. }
    );
    assert_matches!(
        LocalTimeCodec.parse("'86400000000000'").unwrap_err().kind,
        InvalidTypeErrorKind::ValueOverflow
    );
}

#[test]
fn local_time_formats_and_encodes() {
    let codec = LocalTimeCodec;
    let time = NaiveTime::from_hms_milli_opt(13, 25, 47, 123).unwrap();
    assert_eq!(codec.format_value(&time).unwrap(), "'13:25:47.123'");

    let bytes = codec.encode(&time, V4).unwrap();
    assert_eq!(&bytes[..], &48_347_123_000_000i64.to_be_bytes());
    assert_eq!(codec.decode(&bytes, V4).unwrap(), Some(time));
    assert_matches!(
        codec.decode(&(-1i64).to_be_bytes(), V4).unwrap_err().kind,
        InvalidTypeErrorKind::ValueOverflow
    );
}

#[test]
fn zoned_timestamp_parses() {
    let codec = ZonedTimestampCodec::with_varchar_zone().unwrap();
    let expected = instant().with_timezone(&plus_one_hour());
    for literal in [
        "(1277860847999             ,'+01:00')",
        "('2010-06-30T01:20:47.999Z' ,'+01:00')",
        "('2010-06-30T02:20:47.999+01:00','+01:00')",
        "( '1277860847999' , '+01:00' )",
    ] {
        let parsed = codec.parse(literal).unwrap().unwrap();
        assert_eq!(parsed, expected, "{literal}");
        assert_eq!(parsed.offset(), &plus_one_hour(), "{literal}");
    }
}

#[test]
fn zoned_timestamp_formats_instant_in_utc() {
    let codec = ZonedTimestampCodec::with_varchar_zone().unwrap();
    let value = instant().with_timezone(&plus_one_hour());
    assert_eq!(
        codec.format_value(&value).unwrap(),
        "('2010-06-30T01:20:47.999Z','+01:00')"
    );
    let utc = instant().fixed_offset();
    assert_eq!(
        codec.format_value(&utc).unwrap(),
        "('2010-06-30T01:20:47.999Z','Z')"
    );
}

#[test]
fn zoned_timestamp_wire_form() {
    let codec = ZonedTimestampCodec::with_varchar_zone().unwrap();
    let value = instant().with_timezone(&plus_one_hour());
    let bytes = codec.encode(&value, V4).unwrap();

    let mut expected = vec![0, 0, 0, 8];
    expected.extend_from_slice(&MILLIS.to_be_bytes());
    expected.extend_from_slice(&[0, 0, 0, 6]);
    expected.extend_from_slice(b"+01:00");
    assert_eq!(&bytes[..], &expected[..]);

    let decoded = codec.decode(&bytes, V4).unwrap().unwrap();
    assert_eq!(decoded, value);
    assert_eq!(decoded.offset(), &plus_one_hour());
}

fn zoned_bytes(millis: i64, zone: &str) -> Vec<u8> {
    let mut bytes = vec![0, 0, 0, 8];
    bytes.extend_from_slice(&millis.to_be_bytes());
    bytes.extend_from_slice(&(zone.len() as i32).to_be_bytes());
    bytes.extend_from_slice(zone.as_bytes());
    bytes
}

#[test]
fn zoned_timestamp_unusual_offsets() {
    let codec = ZonedTimestampCodec::with_varchar_zone().unwrap();
    for (offset, id) in [
        (FixedOffset::east_opt(3630).unwrap(), "+01:00:30"),
        (FixedOffset::east_opt(19 * 3600).unwrap(), "+19:00"),
        (FixedOffset::west_opt(23 * 3600 + 59 * 60 + 59).unwrap(), "-23:59:59"),
    ] {
        let value = instant().with_timezone(&offset);

        let bytes = codec.encode(&value, V4).unwrap();
        assert_eq!(&bytes[..], &zoned_bytes(MILLIS, id)[..]);
        let decoded = codec.decode(&bytes, V4).unwrap().unwrap();
        assert_eq!(decoded.offset(), &offset, "{id}");

        let literal = codec.format_value(&value).unwrap();
        assert_eq!(literal, format!("('2010-06-30T01:20:47.999Z','{id}')"));
        let parsed = codec.parse(&literal).unwrap().unwrap();
        assert_eq!(parsed.offset(), &offset, "{id}");
        assert_eq!(parsed, value);
    }
}

#[test]
fn zoned_timestamp_region_ids() {
    let codec = ZonedTimestampCodec::with_varchar_zone().unwrap();

    // Central European summer time.
    let decoded = codec
        .decode(&zoned_bytes(MILLIS, "Europe/Paris"), V4)
        .unwrap()
        .unwrap();
    assert_eq!(decoded, instant());
    assert_eq!(decoded.offset().local_minus_utc(), 7200);

    // Standard time in winter.
    let winter = Utc.with_ymd_and_hms(2010, 1, 15, 12, 0, 0).unwrap();
    let decoded = codec
        .decode(&zoned_bytes(winter.timestamp_millis(), "Europe/Paris"), V4)
        .unwrap()
        .unwrap();
    assert_eq!(decoded, winter);
    assert_eq!(decoded.offset().local_minus_utc(), 3600);

    let parsed = codec
        .parse("('2010-06-30T01:20:47.999Z','Europe/Paris')")
        .unwrap()
        .unwrap();
    assert_eq!(parsed.offset().local_minus_utc(), 7200);
    assert_eq!(
        codec.format_value(&parsed).unwrap(),
        "('2010-06-30T01:20:47.999Z','+02:00')"
    );

    assert_matches!(
        codec
            .decode(&zoned_bytes(MILLIS, "Mars/Olympus_Mons"), V4)
            .unwrap_err()
            .kind,
        InvalidTypeErrorKind::UnparsableLiteral { .. }
    );
}

#[test]
fn zoned_timestamp_missing_components() {
    let codec = ZonedTimestampCodec::with_varchar_zone().unwrap();

    // No zone: the instant is read in UTC.
    let mut only_instant = vec![0, 0, 0, 8];
    only_instant.extend_from_slice(&MILLIS.to_be_bytes());
    let decoded = codec.decode(&only_instant, V4).unwrap().unwrap();
    assert_eq!(decoded.offset().local_minus_utc(), 0);

    // No instant: the value is absent.
    assert_eq!(codec.decode(&[], V4).unwrap(), None);
    assert_eq!(codec.decode(&[0xff, 0xff, 0xff, 0xff], V4).unwrap(), None);
    assert_matches!(
        codec.parse("(NULL,'+01:00')").unwrap_err().kind,
        InvalidTypeErrorKind::UnparsableLiteral { .. }
    );
}

#[test]
fn zoned_timestamp_zone_requires_quotes() {
    let codec = ZonedTimestampCodec::with_varchar_zone().unwrap();
    assert_matches!(
        codec.parse("(1277860847999,+01:00)").unwrap_err().kind,
        InvalidTypeErrorKind::MissingQuotes { .. }
    );
}

#[test]
fn zoned_timestamp_accepts_only_its_tuple() {
    let text_zone = ColumnType::tuple([NativeType::Timestamp.into(), NativeType::Text.into()]);
    assert!(ZonedTimestampCodec::new(&text_zone).is_ok());

    for wrong in [
        ColumnType::tuple([NativeType::Timestamp.into(), NativeType::Int.into()]),
        ColumnType::tuple([NativeType::Timestamp.into()]),
        NativeType::Timestamp.column_type().clone(),
    ] {
        assert_matches!(
            ZonedTimestampCodec::new(&wrong).unwrap_err().kind,
            InvalidTypeErrorKind::UnsupportedType { .. }
        );
    }
}
