use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::Arc;

use assert_matches::assert_matches;
use bigdecimal_04::BigDecimal;
use num_bigint_04::BigInt;
use uuid::Uuid;

use super::{CqlValueCodec, TypeCodec};
use crate::cql_type::{ColumnType, NativeType, UserDefinedType};
use crate::errors::InvalidTypeErrorKind;
use crate::frame::ProtocolVersion;
use crate::value::{Counter, CqlDate, CqlTime, CqlTimestamp, CqlValue};

fn codec(cql_type: ColumnType) -> CqlValueCodec {
    CqlValueCodec::new(&cql_type).unwrap()
}

fn native(native: NativeType) -> CqlValueCodec {
    codec(native.into())
}

fn address_type() -> ColumnType {
    ColumnType::user_defined(
        Arc::new(UserDefinedType::new(
            "ks",
            "address",
            vec![
                ("street".to_owned(), NativeType::Text.into()),
                ("zip".to_owned(), NativeType::Int.into()),
                ("Tags".to_owned(), ColumnType::set(NativeType::Text.into(), true)),
            ],
        )),
        true,
    )
}

/// Checks that the wire and literal forms both carry the value back.
fn assert_round_trips(codec: &CqlValueCodec, value: CqlValue) {
    for version in ProtocolVersion::ALL {
        let bytes = codec.encode(&value, version).unwrap();
        assert_eq!(
            codec.decode(&bytes, version).unwrap().as_ref(),
            Some(&value),
            "{} under {}",
            codec.cql_type(),
            version
        );
    }
    let literal = codec.format_value(&value).unwrap();
    assert_eq!(
        codec.parse(&literal).unwrap().as_ref(),
        Some(&value),
        "{literal}"
    );
}

#[test]
fn natives_round_trip() {
    let cases = [
        (NativeType::Ascii, CqlValue::Ascii("plain".into())),
        (NativeType::Text, CqlValue::Text("it's ż".into())),
        (NativeType::Varchar, CqlValue::Text(String::new())),
        (NativeType::Blob, CqlValue::Blob(vec![0, 1, 0xfe])),
        (NativeType::Boolean, CqlValue::Boolean(true)),
        (NativeType::TinyInt, CqlValue::TinyInt(-7)),
        (NativeType::SmallInt, CqlValue::SmallInt(300)),
        (NativeType::Int, CqlValue::Int(-123_456)),
        (NativeType::BigInt, CqlValue::BigInt(i64::MIN)),
        (NativeType::Counter, CqlValue::Counter(Counter(42))),
        (NativeType::Float, CqlValue::Float(-0.5)),
        (NativeType::Double, CqlValue::Double(f64::INFINITY)),
        (
            NativeType::Decimal,
            CqlValue::Decimal(BigDecimal::from_str("-12.345").unwrap()),
        ),
        (
            NativeType::Varint,
            CqlValue::Varint(BigInt::from_str("-123456789012345678901234567890").unwrap()),
        ),
        (
            NativeType::Timestamp,
            CqlValue::Timestamp(CqlTimestamp(1_277_860_847_999)),
        ),
        (NativeType::Date, CqlValue::Date(CqlDate((1 << 31) + 14790))),
        (NativeType::Time, CqlValue::Time(CqlTime(48_347_123_456_789))),
        (
            NativeType::Inet,
            CqlValue::Inet(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1))),
        ),
        (NativeType::Uuid, CqlValue::Uuid(Uuid::new_v4())),
        (
            NativeType::Timeuuid,
            CqlValue::Timeuuid(Uuid::parse_str("d2177dd0-eaa2-11de-a572-001b779c76e3").unwrap()),
        ),
    ];
    for (typ, value) in cases {
        assert_round_trips(&native(typ), value);
    }
}

#[test]
fn decimal_wire_layout() {
    let codec = native(NativeType::Decimal);
    let value = CqlValue::Decimal(BigDecimal::from_str("1.5").unwrap());
    let bytes = codec.encode(&value, ProtocolVersion::V4).unwrap();
    assert_eq!(&bytes[..], &[0, 0, 0, 1, 15]);
    assert_matches!(
        codec.decode(&[0, 0], ProtocolVersion::V4).unwrap_err().kind,
        InvalidTypeErrorKind::ByteLengthMismatch { expected: 4, got: 2 }
    );
}

#[test]
fn timestamp_literals_use_the_iso_form() {
    let timestamp = native(NativeType::Timestamp);
    let value = CqlValue::Timestamp(CqlTimestamp(1_277_860_847_999));
    assert_eq!(
        timestamp.format_value(&value).unwrap(),
        "'2010-06-30T01:20:47.999Z'"
    );
    assert_eq!(
        timestamp.format_value(&CqlValue::Timestamp(CqlTimestamp(1_277_860_800_000))).unwrap(),
        "'2010-06-30T01:20:00Z'"
    );
    assert_eq!(timestamp.parse("'2010-06-30T01:20:47.999Z'").unwrap(), Some(value));

    let list = codec(ColumnType::list(NativeType::Timestamp.into(), false));
    let value = CqlValue::List(vec![CqlValue::Timestamp(CqlTimestamp(0))]);
    assert_eq!(list.format_value(&value).unwrap(), "['1970-01-01T00:00:00Z']");
    assert_eq!(list.parse("['1970-01-01T00:00:00Z']").unwrap(), Some(value));
}

#[test]
fn empty_payloads() {
    for typ in [NativeType::Int, NativeType::Uuid, NativeType::Timestamp, NativeType::Varint] {
        let codec = native(typ);
        assert_eq!(
            codec.decode(&[], ProtocolVersion::V4).unwrap(),
            Some(CqlValue::Empty),
            "{typ}"
        );
        assert_eq!(codec.format_value(&CqlValue::Empty).unwrap(), "0x");
        assert_eq!(codec.parse("0x").unwrap(), Some(CqlValue::Empty));
        assert!(codec.encode(&CqlValue::Empty, ProtocolVersion::V4).unwrap().is_empty());
    }

    // Empty strings and blobs are regular values.
    assert_eq!(
        native(NativeType::Text).decode(&[], ProtocolVersion::V4).unwrap(),
        Some(CqlValue::Text(String::new()))
    );
    assert_eq!(
        native(NativeType::Blob).parse("0x").unwrap(),
        Some(CqlValue::Blob(Vec::new()))
    );
    assert_matches!(
        native(NativeType::Text)
            .encode(&CqlValue::Empty, ProtocolVersion::V4)
            .unwrap_err()
            .kind,
        InvalidTypeErrorKind::IncompatibleValue { .. }
    );
}

#[test]
fn mismatched_values_are_rejected() {
    let codec = native(NativeType::Int);
    let err = codec
        .encode(&CqlValue::Text("1".into()), ProtocolVersion::V4)
        .unwrap_err();
    assert_matches!(err.kind, InvalidTypeErrorKind::IncompatibleValue { expected: "int" });

    let list = codec_list_of_ints();
    assert_matches!(
        list.encode(&CqlValue::Set(vec![]), ProtocolVersion::V4).unwrap_err().kind,
        InvalidTypeErrorKind::IncompatibleValue { expected: "list" }
    );
}

fn codec_list_of_ints() -> CqlValueCodec {
    codec(ColumnType::list(NativeType::Int.into(), false))
}

#[test]
fn collections_round_trip() {
    assert_round_trips(
        &codec_list_of_ints(),
        CqlValue::List(vec![CqlValue::Int(1), CqlValue::Int(2)]),
    );
    assert_round_trips(&codec_list_of_ints(), CqlValue::List(vec![]));
    assert_round_trips(
        &codec(ColumnType::set(NativeType::Text.into(), true)),
        CqlValue::Set(vec![CqlValue::Text("a,b".into()), CqlValue::Text("}".into())]),
    );
    assert_round_trips(
        &codec(ColumnType::map(
            NativeType::Text.into(),
            ColumnType::list(NativeType::Int.into(), true),
            false,
        )),
        CqlValue::Map(vec![
            (
                CqlValue::Text("k:1".into()),
                CqlValue::List(vec![CqlValue::Int(1)]),
            ),
            (CqlValue::Text("k2".into()), CqlValue::List(vec![])),
        ]),
    );
}

#[test]
fn collection_sizes_follow_protocol_version() {
    let codec = codec_list_of_ints();
    let value = CqlValue::List(vec![CqlValue::Int(7)]);
    assert_eq!(
        &codec.encode(&value, ProtocolVersion::V2).unwrap()[..],
        &[0, 1, 0, 4, 0, 0, 0, 7]
    );
    assert_eq!(
        &codec.encode(&value, ProtocolVersion::V4).unwrap()[..],
        &[0, 0, 0, 1, 0, 0, 0, 4, 0, 0, 0, 7]
    );
}

#[test]
fn collection_payload_errors() {
    let codec = codec_list_of_ints();
    // A zero-length payload is an empty collection.
    assert_eq!(
        codec.decode(&[], ProtocolVersion::V4).unwrap(),
        Some(CqlValue::List(vec![]))
    );
    assert_matches!(
        codec
            .decode(&[0, 0, 0, 1, 0xff, 0xff, 0xff, 0xff], ProtocolVersion::V4)
            .unwrap_err()
            .kind,
        InvalidTypeErrorKind::IncompatibleValue { .. }
    );
    assert_matches!(
        codec
            .decode(&[0, 0, 0, 2, 0, 0, 0, 4, 0, 0, 0, 7], ProtocolVersion::V4)
            .unwrap_err()
            .kind,
        InvalidTypeErrorKind::Truncated(_)
    );
    assert_matches!(
        codec
            .decode(&[0, 0, 0, 0, 9], ProtocolVersion::V4)
            .unwrap_err()
            .kind,
        InvalidTypeErrorKind::TrailingBytes { remaining: 1 }
    );
}

#[test]
fn collection_literals() {
    let list = codec_list_of_ints();
    assert_eq!(
        list.parse(" [ 1 ,2 , 3 ] ").unwrap(),
        Some(CqlValue::List(vec![
            CqlValue::Int(1),
            CqlValue::Int(2),
            CqlValue::Int(3)
        ]))
    );
    assert_eq!(list.parse("[]").unwrap(), Some(CqlValue::List(vec![])));
    for bad in ["[1,2", "1,2]", "[1;2]", "[1,NULL]", "[1] x"] {
        assert_matches!(
            list.parse(bad).unwrap_err().kind,
            InvalidTypeErrorKind::UnparsableLiteral { .. },
            "{bad}"
        );
    }

    let map = codec(ColumnType::map(
        NativeType::Int.into(),
        NativeType::Text.into(),
        false,
    ));
    assert_eq!(
        map.parse("{1 : 'one', 2:'two'}").unwrap(),
        Some(CqlValue::Map(vec![
            (CqlValue::Int(1), CqlValue::Text("one".into())),
            (CqlValue::Int(2), CqlValue::Text("two".into())),
        ]))
    );
    assert!(map.parse("{1 'one'}").is_err());
}

#[test]
fn tuples() {
    let codec = codec(ColumnType::tuple([
        NativeType::Int.into(),
        ColumnType::list(NativeType::Text.into(), true),
    ]));
    let value = CqlValue::Tuple(vec![
        Some(CqlValue::Int(1)),
        Some(CqlValue::List(vec![CqlValue::Text("x".into())])),
    ]);
    assert_round_trips(&codec, value);
    assert_round_trips(&codec, CqlValue::Tuple(vec![None, None]));
    assert_eq!(
        codec
            .format_value(&CqlValue::Tuple(vec![Some(CqlValue::Int(1)), None]))
            .unwrap(),
        "(1,NULL)"
    );
}

#[test]
fn null_tuple_is_a_null_marker() {
    let codec = codec(ColumnType::tuple([
        NativeType::Int.into(),
        ColumnType::tuple([NativeType::Text.into()]),
    ]));
    let value = CqlValue::Tuple(vec![Some(CqlValue::Int(1)), None]);
    let bytes = codec.encode(&value, ProtocolVersion::V4).unwrap();
    assert_eq!(&bytes[8..], &[0xff, 0xff, 0xff, 0xff]);
}

#[test]
fn user_defined_types() {
    let codec = codec(address_type());
    let value = CqlValue::UserDefinedType {
        keyspace: "ks".into(),
        name: "address".into(),
        fields: vec![
            ("street".into(), Some(CqlValue::Text("Main St".into()))),
            ("zip".into(), None),
            (
                "Tags".into(),
                Some(CqlValue::Set(vec![CqlValue::Text("home".into())])),
            ),
        ],
    };
    assert_round_trips(&codec, value.clone());
    assert_eq!(
        codec.format_value(&value).unwrap(),
        "{street:'Main St',zip:NULL,\"Tags\":{'home'}}"
    );

    // Field names are matched like identifiers and missing fields are null.
    assert_eq!(
        codec.parse("{ STREET : 'Main St', \"Tags\": {'home'} }").unwrap(),
        Some(value)
    );
    assert_matches!(
        codec.parse("{tags: {'home'}}").unwrap_err().kind,
        InvalidTypeErrorKind::UnparsableLiteral {
            reason: "unknown field name",
            ..
        }
    );
}

#[test]
fn user_defined_type_short_payload() {
    let codec = codec(address_type());
    let mut bytes = vec![0, 0, 0, 1, b'x'];
    bytes.extend_from_slice(&[0, 0, 0, 4, 0, 0, 0, 9]);
    assert_eq!(
        codec.decode(&bytes, ProtocolVersion::V4).unwrap(),
        Some(CqlValue::UserDefinedType {
            keyspace: "ks".into(),
            name: "address".into(),
            fields: vec![
                ("street".into(), Some(CqlValue::Text("x".into()))),
                ("zip".into(), Some(CqlValue::Int(9))),
                ("Tags".into(), None),
            ],
        })
    );
}

#[test]
fn user_defined_type_rejects_unknown_fields() {
    let codec = codec(address_type());
    let value = CqlValue::UserDefinedType {
        keyspace: "ks".into(),
        name: "address".into(),
        fields: vec![("country".into(), None)],
    };
    assert_matches!(
        codec.encode(&value, ProtocolVersion::V4).unwrap_err().kind,
        InvalidTypeErrorKind::IncompatibleValue { .. }
    );
}

#[test]
fn custom_types_are_opaque() {
    let codec = codec(ColumnType::Custom(
        "org.apache.cassandra.db.marshal.DynamicCompositeType".into(),
    ));
    assert_round_trips(&codec, CqlValue::Blob(vec![1, 2, 3]));
}

#[test]
fn errors_name_the_type() {
    let codec = codec(ColumnType::map(
        NativeType::Text.into(),
        NativeType::Int.into(),
        false,
    ));
    let err = codec.parse("{'a': x}").unwrap_err();
    assert_eq!(err.cql_type, ColumnType::Native(NativeType::Int));
}
