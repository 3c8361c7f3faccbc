//! Property-based tests for the field table codec.

use proptest::prelude::*;
use tablerpc_codec::{
    decode_table, encode_table, encoded_len, CodecError, Decimal, FieldTable, FieldValue,
    LongString, Timestamp,
};

const KNOWN_TAGS: &[u8] = b"sSIDTFAtV";

fn scalar() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        "[ -~]{0,32}".prop_map(FieldValue::ShortString),
        "\\PC{0,16}".prop_map(FieldValue::ShortString),
        prop::collection::vec(any::<u8>(), 0..64)
            .prop_map(|bytes| FieldValue::LongString(LongString::from(bytes))),
        any::<i32>().prop_map(FieldValue::Integer),
        (any::<i32>(), any::<u8>())
            .prop_map(|(value, scale)| FieldValue::Decimal(Decimal::new(value, scale))),
        any::<i64>().prop_map(|secs| FieldValue::Timestamp(Timestamp::from_secs(secs))),
        any::<bool>().prop_map(FieldValue::Boolean),
        Just(FieldValue::Void),
    ]
}

fn value() -> impl Strategy<Value = FieldValue> {
    scalar().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(FieldValue::Array),
            prop::collection::vec(("[a-z_]{0,12}", inner), 0..8)
                .prop_map(|fields| FieldValue::Table(fields.into_iter().collect())),
        ]
    })
}

fn table() -> impl Strategy<Value = FieldTable> {
    prop::collection::vec(("[a-zA-Z_.-]{0,16}", value()), 0..12)
        .prop_map(|fields| fields.into_iter().collect())
}

// Property: decode(encode(t)) == t for every representable table
proptest! {
    #[test]
    fn prop_table_roundtrip(table in table()) {
        let bytes = encode_table(&table).expect("encode should succeed");
        let decoded = decode_table(&bytes).expect("decode should succeed");
        prop_assert_eq!(decoded, table);
    }
}

// Property: the outer length prefix counts exactly the bytes that follow it
proptest! {
    #[test]
    fn prop_length_prefix_is_exact(table in table()) {
        let bytes = encode_table(&table).expect("encode should succeed");
        let declared = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        prop_assert_eq!(declared, bytes.len() - 4);
        prop_assert_eq!(encoded_len(&table), bytes.len());
    }
}

// Property: removing any non-empty suffix makes decoding fail
proptest! {
    #[test]
    fn prop_truncation_detected(table in table(), seed in any::<usize>()) {
        let bytes = encode_table(&table).expect("encode should succeed");
        let cut = 1 + seed % bytes.len();
        let result = decode_table(&bytes[..bytes.len() - cut]);
        prop_assert!(matches!(result, Err(ref err) if err.is_decoding()));
    }
}

// Property: a tag outside the known set is rejected
proptest! {
    #[test]
    fn prop_unknown_tag_rejected(tag in any::<u8>().prop_filter("unknown tag", |t| !KNOWN_TAGS.contains(t))) {
        let bytes = [0, 0, 0, 3, 1, b'k', tag];
        let result = decode_table(&bytes);
        prop_assert!(
            matches!(result, Err(CodecError::UnknownTag { tag: got, offset: 6 }) if got == tag),
            "unexpected result: {:?}",
            result
        );
    }
}

// Property: arbitrary input never panics the decoder
proptest! {
    #[test]
    fn prop_decode_arbitrary_bytes_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_table(&data);
    }
}
