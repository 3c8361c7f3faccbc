use bytes::{BufMut, BytesMut};

use crate::codec::CodecConfig;
use crate::error::{CodecError, Direction, Result};
use crate::table::FieldTable;
use crate::value::FieldValue;

/// Frame length prefix: 4-byte big-endian byte count.
const FRAME_PREFIX_SIZE: usize = 4;

/// Writes tagged field values and table frames into a `BytesMut`.
///
/// Table and array frames are written with a zeroed length prefix that is
/// backpatched once the frame contents are known, so nothing is measured
/// twice. On error the buffer may hold a partial frame; callers that keep
/// the buffer should truncate it back (see [`encode_into`](crate::TableCodec::encode_into)).
pub struct TableWriter<'a> {
    dst: &'a mut BytesMut,
    config: CodecConfig,
    depth: usize,
}

impl<'a> TableWriter<'a> {
    /// Create a writer with default configuration.
    pub fn new(dst: &'a mut BytesMut) -> Self {
        Self::with_config(dst, CodecConfig::default())
    }

    /// Create a writer with explicit configuration.
    pub fn with_config(dst: &'a mut BytesMut, config: CodecConfig) -> Self {
        Self {
            dst,
            config,
            depth: 0,
        }
    }

    /// Write a table frame: length prefix, then `name, tag, payload` per field.
    pub fn write_table(&mut self, table: &FieldTable) -> Result<()> {
        self.enter()?;
        let result = self.write_fields(table);
        self.depth -= 1;
        result
    }

    /// Write a tag byte followed by the value's payload.
    pub fn write_value(&mut self, value: &FieldValue) -> Result<()> {
        self.dst.put_u8(value.tag());
        match value {
            FieldValue::ShortString(s) => {
                let len = short_len(s.len())
                    .ok_or(CodecError::ShortStringTooLong { len: s.len() })?;
                self.dst.put_u8(len);
                self.dst.put_slice(s.as_bytes());
            }
            FieldValue::LongString(s) => {
                let len = u32::try_from(s.len())
                    .map_err(|_| CodecError::LongStringTooLong { len: s.len() })?;
                self.dst.put_u32(len);
                self.dst.put_slice(s.as_bytes());
            }
            FieldValue::Integer(v) => self.dst.put_i32(*v),
            FieldValue::Decimal(d) => {
                self.dst.put_u8(d.scale());
                self.dst.put_i32(d.value());
            }
            FieldValue::Timestamp(t) => self.dst.put_i64(t.as_secs()),
            FieldValue::Table(t) => self.write_table(t)?,
            FieldValue::Array(items) => self.write_array(items)?,
            FieldValue::Boolean(b) => self.dst.put_u8(u8::from(*b)),
            FieldValue::Void => {}
        }
        Ok(())
    }

    fn write_fields(&mut self, table: &FieldTable) -> Result<()> {
        let start = self.begin_frame();
        for (key, value) in table {
            self.write_key(key)?;
            self.write_value(value)?;
        }
        self.end_frame(start)
    }

    fn write_array(&mut self, items: &[FieldValue]) -> Result<()> {
        self.enter()?;
        let result = self.write_items(items);
        self.depth -= 1;
        result
    }

    fn write_items(&mut self, items: &[FieldValue]) -> Result<()> {
        let start = self.begin_frame();
        for item in items {
            self.write_value(item)?;
        }
        self.end_frame(start)
    }

    fn write_key(&mut self, key: &str) -> Result<()> {
        let len = short_len(key.len()).ok_or(CodecError::KeyTooLong { len: key.len() })?;
        self.dst.put_u8(len);
        self.dst.put_slice(key.as_bytes());
        Ok(())
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                direction: Direction::Encode,
                max: self.config.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn begin_frame(&mut self) -> usize {
        let start = self.dst.len();
        self.dst.put_u32(0);
        start
    }

    fn end_frame(&mut self, start: usize) -> Result<()> {
        let size = self.dst.len() - start - FRAME_PREFIX_SIZE;
        let len = u32::try_from(size)
            .ok()
            .filter(|_| size <= self.config.max_frame_size)
            .ok_or(CodecError::FrameTooLarge {
                direction: Direction::Encode,
                size,
                max: self.config.max_frame_size.min(u32::MAX as usize),
            })?;
        self.dst[start..start + FRAME_PREFIX_SIZE].copy_from_slice(&len.to_be_bytes());
        Ok(())
    }
}

fn short_len(len: usize) -> Option<u8> {
    u8::try_from(len).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Decimal, LongString, Timestamp};

    fn encode_value(value: &FieldValue) -> Vec<u8> {
        let mut buf = BytesMut::new();
        TableWriter::new(&mut buf).write_value(value).unwrap();
        buf.to_vec()
    }

    #[test]
    fn empty_table_is_four_zero_bytes() {
        let mut buf = BytesMut::new();
        TableWriter::new(&mut buf)
            .write_table(&FieldTable::new())
            .unwrap();
        assert_eq!(buf.as_ref(), &[0, 0, 0, 0]);
    }

    #[test]
    fn single_integer_field_layout() {
        let mut buf = BytesMut::new();
        let table = FieldTable::new().with("code", 200);
        TableWriter::new(&mut buf).write_table(&table).unwrap();

        let mut expected = vec![0, 0, 0, 10, 4];
        expected.extend_from_slice(b"code");
        expected.push(b'I');
        expected.extend_from_slice(&200i32.to_be_bytes());
        assert_eq!(buf.as_ref(), expected.as_slice());
    }

    #[test]
    fn scalar_payloads() {
        assert_eq!(
            encode_value(&FieldValue::ShortString("ok".to_string())),
            b"s\x02ok"
        );
        assert_eq!(
            encode_value(&FieldValue::LongString(LongString::from("ok"))),
            b"S\x00\x00\x00\x02ok"
        );
        assert_eq!(encode_value(&FieldValue::from("ok")), b"S\x00\x00\x00\x02ok");
        assert_eq!(encode_value(&FieldValue::Integer(-1)), b"I\xff\xff\xff\xff");
        assert_eq!(
            encode_value(&FieldValue::Decimal(Decimal::new(-5, 2))),
            b"D\x02\xff\xff\xff\xfb"
        );
        assert_eq!(
            encode_value(&FieldValue::Timestamp(Timestamp::from_secs(1))),
            b"T\x00\x00\x00\x00\x00\x00\x00\x01"
        );
        assert_eq!(encode_value(&FieldValue::Boolean(true)), b"t\x01");
        assert_eq!(encode_value(&FieldValue::Void), b"V");
    }

    #[test]
    fn array_frame_counts_bytes() {
        let value = FieldValue::Array(vec![FieldValue::Integer(1), FieldValue::Void]);
        assert_eq!(
            encode_value(&value),
            b"A\x00\x00\x00\x06I\x00\x00\x00\x01V"
        );
    }

    #[test]
    fn nested_table_is_backpatched() {
        let inner = FieldTable::new().with("retries", 3);
        let outer = FieldTable::new().with("meta", inner);
        let mut buf = BytesMut::new();
        TableWriter::new(&mut buf).write_table(&outer).unwrap();

        // outer body: name(1+4) tag(1) inner-prefix(4) inner-body(1+7+1+4)
        assert_eq!(&buf[0..4], &23u32.to_be_bytes());
        assert_eq!(&buf[10..14], &13u32.to_be_bytes());
        assert_eq!(buf.len(), 27);
    }

    #[test]
    fn short_string_too_long() {
        let mut buf = BytesMut::new();
        let err = TableWriter::new(&mut buf)
            .write_value(&FieldValue::ShortString("x".repeat(256)))
            .unwrap_err();
        assert!(matches!(err, CodecError::ShortStringTooLong { len: 256 }));
        assert!(err.is_encoding());
    }

    #[test]
    fn key_too_long() {
        let mut buf = BytesMut::new();
        let table = FieldTable::new().with("k".repeat(256), 1);
        let err = TableWriter::new(&mut buf).write_table(&table).unwrap_err();
        assert!(matches!(err, CodecError::KeyTooLong { len: 256 }));
    }

    #[test]
    fn depth_limit_on_encode() {
        let config = CodecConfig::default().with_max_depth(2);
        let table = FieldTable::new().with(
            "a",
            FieldTable::new().with("b", FieldTable::new().with("c", 1)),
        );
        let mut buf = BytesMut::new();
        let err = TableWriter::with_config(&mut buf, config)
            .write_table(&table)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::DepthLimitExceeded {
                direction: Direction::Encode,
                max: 2
            }
        ));
    }

    #[test]
    fn writer_is_reusable_after_depth_error() {
        let config = CodecConfig::default().with_max_depth(2);
        let too_deep = FieldTable::new().with(
            "a",
            FieldTable::new().with("b", FieldTable::new().with("c", 1)),
        );
        let fits = FieldTable::new().with("a", FieldTable::new().with("b", 1));

        let mut buf = BytesMut::new();
        let mut writer = TableWriter::with_config(&mut buf, config);
        assert!(writer.write_table(&too_deep).is_err());
        assert_eq!(writer.depth, 0);
        writer.write_table(&fits).unwrap();
        assert_eq!(writer.depth, 0);
    }

    #[test]
    fn frame_size_limit_on_encode() {
        let config = CodecConfig::default().with_max_frame_size(8);
        let table = FieldTable::new().with("status", "ok");
        let mut buf = BytesMut::new();
        let err = TableWriter::with_config(&mut buf, config)
            .write_table(&table)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::FrameTooLarge {
                direction: Direction::Encode,
                size: 14,
                max: 8
            }
        ));
    }
}
