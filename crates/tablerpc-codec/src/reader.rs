use bytes::{Buf, Bytes};

use crate::codec::{CodecConfig, DuplicateKeys};
use crate::error::{CodecError, Direction, Result};
use crate::table::FieldTable;
use crate::value::{
    Decimal, FieldValue, LongString, Timestamp, TAG_ARRAY, TAG_BOOLEAN, TAG_DECIMAL, TAG_INTEGER,
    TAG_LONG_STRING, TAG_SHORT_STRING, TAG_TABLE, TAG_TIMESTAMP, TAG_VOID,
};

/// Reads field tables and tagged values from a byte slice.
///
/// Every table and array is a frame: the reader never reads past the end of
/// the innermost open frame. A read that would cross it fails with
/// [`CodecError::FrameOverrun`]; a frame that claims more bytes than the input
/// holds fails with [`CodecError::Truncated`].
pub struct TableReader<'a> {
    src: &'a [u8],
    pos: usize,
    frame_end: Option<usize>,
    depth: usize,
    config: CodecConfig,
}

impl<'a> TableReader<'a> {
    /// Create a reader with default configuration.
    pub fn new(src: &'a [u8]) -> Self {
        Self::with_config(src, CodecConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(src: &'a [u8], config: CodecConfig) -> Self {
        Self {
            src,
            pos: 0,
            frame_end: None,
            depth: 0,
            config,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left in the input.
    pub fn remaining(&self) -> usize {
        self.src.len() - self.pos
    }

    /// Fail with [`CodecError::TrailingBytes`] unless the input is exhausted.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(CodecError::TrailingBytes { count }),
        }
    }

    /// Read a table frame and every field inside it.
    pub fn read_table(&mut self) -> Result<FieldTable> {
        self.enter()?;
        let parent = self.frame_end;
        let result = self.read_fields();
        self.frame_end = parent;
        self.depth -= 1;
        result
    }

    fn read_fields(&mut self) -> Result<FieldTable> {
        let end = self.open_frame()?;
        let mut table = FieldTable::new();
        while self.pos < end {
            let key = self.read_short_str("field name")?;
            let value = self.read_value()?;
            if self.config.duplicate_keys == DuplicateKeys::Reject && table.contains_key(&key) {
                return Err(CodecError::DuplicateKey { key });
            }
            table.insert(key, value);
        }
        Ok(table)
    }

    /// Read a tag byte and the value it introduces.
    pub fn read_value(&mut self) -> Result<FieldValue> {
        let tag = self.read_tag()?;
        self.read_value_with_tag(tag)
    }

    /// Consume a single tag byte.
    pub fn read_tag(&mut self) -> Result<u8> {
        Ok(self.take(1)?.get_u8())
    }

    /// Read the payload for a tag just consumed with [`read_tag`](Self::read_tag).
    ///
    /// An unknown tag is reported at the offset of the tag byte.
    pub fn read_value_with_tag(&mut self, tag: u8) -> Result<FieldValue> {
        self.read_payload(tag, self.pos.saturating_sub(1))
    }

    fn read_payload(&mut self, tag: u8, offset: usize) -> Result<FieldValue> {
        let value = match tag {
            TAG_SHORT_STRING => FieldValue::ShortString(self.read_short_str("short string")?),
            TAG_LONG_STRING => {
                let len = self.take(4)?.get_u32() as usize;
                let bytes = self.take(len)?;
                FieldValue::LongString(LongString::new(Bytes::copy_from_slice(bytes)))
            }
            TAG_INTEGER => FieldValue::Integer(self.take(4)?.get_i32()),
            TAG_DECIMAL => {
                let scale = self.take(1)?.get_u8();
                let value = self.take(4)?.get_i32();
                FieldValue::Decimal(Decimal::new(value, scale))
            }
            TAG_TIMESTAMP => FieldValue::Timestamp(Timestamp::from_secs(self.take(8)?.get_i64())),
            TAG_TABLE => FieldValue::Table(self.read_table()?),
            TAG_ARRAY => FieldValue::Array(self.read_array()?),
            TAG_BOOLEAN => FieldValue::Boolean(self.take(1)?.get_u8() != 0),
            TAG_VOID => FieldValue::Void,
            tag => return Err(CodecError::UnknownTag { tag, offset }),
        };
        Ok(value)
    }

    fn read_array(&mut self) -> Result<Vec<FieldValue>> {
        self.enter()?;
        let parent = self.frame_end;
        let result = self.read_items();
        self.frame_end = parent;
        self.depth -= 1;
        result
    }

    fn read_items(&mut self) -> Result<Vec<FieldValue>> {
        let end = self.open_frame()?;
        let mut items = Vec::new();
        while self.pos < end {
            items.push(self.read_value()?);
        }
        Ok(items)
    }

    fn read_short_str(&mut self, what: &'static str) -> Result<String> {
        let len = usize::from(self.take(1)?.get_u8());
        let offset = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8 { what, offset })
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                direction: Direction::Decode,
                max: self.config.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Read a frame length and make the frame the read limit.
    ///
    /// Returns the new frame end. The caller restores the enclosing one.
    fn open_frame(&mut self) -> Result<usize> {
        let prefix_offset = self.pos;
        let len = self.take(4)?.get_u32() as usize;
        if len > self.config.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                direction: Direction::Decode,
                size: len,
                max: self.config.max_frame_size,
            });
        }

        let end = self.pos.saturating_add(len);
        if end > self.src.len() {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        if let Some(parent_end) = self.frame_end {
            if end > parent_end {
                return Err(CodecError::FrameOverrun {
                    offset: prefix_offset,
                    frame_end: parent_end,
                });
            }
        }

        self.frame_end = Some(end);
        Ok(end)
    }

    /// Consume `n` bytes without crossing the innermost open frame.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let limit = self.frame_end.unwrap_or(self.src.len());
        let end = self.pos.saturating_add(n);
        if end > limit {
            return Err(match self.frame_end {
                Some(frame_end) => CodecError::FrameOverrun {
                    offset: self.pos,
                    frame_end,
                },
                None => CodecError::Truncated {
                    offset: self.pos,
                    needed: n,
                    available: self.remaining(),
                },
            });
        }
        let src = self.src;
        let bytes = &src[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::{decode_table, encode_table, TableCodec};

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u32(body.len() as u32);
        buf.put_slice(body);
        buf.to_vec()
    }

    #[test]
    fn read_empty_table() {
        let table = decode_table(&[0, 0, 0, 0]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn empty_input_is_truncated() {
        let err = decode_table(&[]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Truncated {
                offset: 0,
                needed: 4,
                available: 0
            }
        ));
    }

    #[test]
    fn declared_length_past_input_is_truncated() {
        let mut bytes = frame(b"\x01aI\x00\x00\x00\x01");
        bytes.pop();
        let err = decode_table(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { offset: 4, .. }));
        assert!(err.is_decoding());
    }

    #[test]
    fn every_truncation_of_a_valid_encoding_fails() {
        let table = FieldTable::new()
            .with("status", "ok")
            .with("code", 200)
            .with(
                "meta",
                FieldTable::new()
                    .with("retries", 3)
                    .with("tags", vec![FieldValue::from("x"), FieldValue::Void]),
            );
        let bytes = encode_table(&table).unwrap();
        for cut in 1..=bytes.len() {
            let err = decode_table(&bytes[..bytes.len() - cut]).unwrap_err();
            assert!(err.is_decoding(), "cut {cut}: {err}");
        }
    }

    #[test]
    fn unknown_tag_rejected() {
        let bytes = frame(b"\x01kZ");
        let err = decode_table(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::UnknownTag { tag: b'Z', offset: 6 }));
    }

    #[test]
    fn field_crossing_frame_end_is_overrun() {
        // frame claims 4 bytes, the integer needs 4 more after name and tag
        let mut bytes = frame(b"\x01kI\x00");
        bytes.extend_from_slice(&[0, 0, 7]);
        let err = decode_table(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::FrameOverrun {
                offset: 7,
                frame_end: 8
            }
        ));
    }

    #[test]
    fn nested_frame_larger_than_parent_is_overrun() {
        // inner table claims 8 bytes but only 3 remain in the parent frame
        let mut body = b"\x01tF".to_vec();
        body.extend_from_slice(&8u32.to_be_bytes());
        body.extend_from_slice(b"\x01aV");
        let mut bytes = frame(&body);
        bytes.extend_from_slice(&[0; 8]);
        let err = decode_table(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::FrameOverrun { .. }));
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        let bytes = frame(b"\x01kI\x00\x00\x00\x01\x01kI\x00\x00\x00\x02");
        let table = decode_table(&bytes).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("k"), Some(&FieldValue::Integer(2)));
    }

    #[test]
    fn duplicate_keys_rejected_by_policy() {
        let bytes = frame(b"\x01kI\x00\x00\x00\x01\x01kV");
        let codec =
            TableCodec::new(CodecConfig::default().with_duplicate_keys(DuplicateKeys::Reject));
        let err = codec.decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::DuplicateKey { ref key } if key == "k"));
    }

    #[test]
    fn invalid_utf8_key() {
        let bytes = frame(b"\x02\xff\xfeV");
        let err = decode_table(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidUtf8 {
                what: "field name",
                offset: 5
            }
        ));
    }

    #[test]
    fn long_string_keeps_raw_bytes() {
        let bytes = frame(b"\x01bS\x00\x00\x00\x02\xff\x00");
        let table = decode_table(&bytes).unwrap();
        match table.get("b") {
            Some(FieldValue::LongString(s)) => assert_eq!(s.as_bytes(), &[0xff, 0x00]),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn boolean_nonzero_is_true() {
        let bytes = frame(b"\x01bt\x02");
        let table = decode_table(&bytes).unwrap();
        assert_eq!(table.get("b"), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn depth_limit_on_decode() {
        let mut nested = FieldTable::new().with("leaf", 1);
        for _ in 0..4 {
            nested = FieldTable::new().with("n", nested);
        }
        let bytes = encode_table(&nested).unwrap();

        let shallow = TableCodec::new(CodecConfig::default().with_max_depth(4));
        let err = shallow.decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::DepthLimitExceeded {
                direction: Direction::Decode,
                max: 4
            }
        ));

        let deep_enough = TableCodec::new(CodecConfig::default().with_max_depth(5));
        assert_eq!(deep_enough.decode(&bytes).unwrap(), nested);
    }

    #[test]
    fn arrays_count_toward_depth() {
        let value = FieldValue::Array(vec![FieldValue::Array(vec![FieldValue::Void])]);
        let bytes = encode_table(&FieldTable::new().with("a", value)).unwrap();
        let codec = TableCodec::new(CodecConfig::default().with_max_depth(2));
        assert!(matches!(
            codec.decode(&bytes),
            Err(CodecError::DepthLimitExceeded { .. })
        ));
    }

    #[test]
    fn frame_size_limit_on_decode() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(1024u32 * 1024).to_be_bytes());
        let codec = TableCodec::new(CodecConfig::default().with_max_frame_size(1024));
        let err = codec.decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::FrameTooLarge {
                direction: Direction::Decode,
                ..
            }
        ));
    }

    #[test]
    fn read_value_with_pre_read_tag() {
        let mut reader = TableReader::new(b"I\x00\x00\x00\x2a");
        let tag = reader.read_tag().unwrap();
        assert_eq!(tag, b'I');
        let value = reader.read_value_with_tag(tag).unwrap();
        assert_eq!(value, FieldValue::Integer(42));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn read_value_unknown_tag_reports_tag_offset() {
        let mut reader = TableReader::new(b"?");
        let err = reader.read_value().unwrap_err();
        assert!(matches!(err, CodecError::UnknownTag { tag: b'?', offset: 0 }));

        let mut reader = TableReader::new(b"?");
        let tag = reader.read_tag().unwrap();
        let err = reader.read_value_with_tag(tag).unwrap_err();
        assert!(matches!(err, CodecError::UnknownTag { tag: b'?', offset: 0 }));
    }

    #[test]
    fn reader_state_restored_after_nested_error() {
        // {"a": {"b": {"c": 1}}} read with room for two levels
        let bytes = encode_table(&FieldTable::new().with(
            "a",
            FieldTable::new().with("b", FieldTable::new().with("c", 1)),
        ))
        .unwrap();
        let mut reader =
            TableReader::with_config(&bytes, CodecConfig::default().with_max_depth(2));
        assert!(reader.read_table().is_err());
        assert_eq!(reader.depth, 0);
        assert_eq!(reader.frame_end, None);

        // a truncated nested array leaves the same clean state
        let bytes = frame(b"\x01xA\x00\x00\x00\x08I\x00");
        let mut reader = TableReader::new(&bytes);
        assert!(reader.read_table().is_err());
        assert_eq!(reader.depth, 0);
        assert_eq!(reader.frame_end, None);
    }
}
