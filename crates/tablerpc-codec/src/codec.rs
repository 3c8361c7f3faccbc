use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::error::Result;
use crate::reader::TableReader;
use crate::table::FieldTable;
use crate::value::FieldValue;
use crate::writer::TableWriter;

/// Default maximum nesting depth for tables and arrays (the outer table counts as 1).
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default maximum size of a single table or array frame: 16 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// What the decoder does when a table repeats a field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeys {
    /// The later field overwrites the earlier one.
    #[default]
    LastWins,
    /// Decoding fails with [`CodecError::DuplicateKey`](crate::CodecError::DuplicateKey).
    Reject,
}

/// Limits and policies applied while encoding and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum nesting of tables and arrays. Default: 64.
    pub max_depth: usize,
    /// Maximum byte length of any single table or array frame. Default: 16 MiB.
    pub max_frame_size: usize,
    /// Duplicate field name policy on decode. Default: last write wins.
    pub duplicate_keys: DuplicateKeys,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            duplicate_keys: DuplicateKeys::LastWins,
        }
    }
}

impl CodecConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn with_duplicate_keys(mut self, duplicate_keys: DuplicateKeys) -> Self {
        self.duplicate_keys = duplicate_keys;
        self
    }
}

/// Encode and decode field tables under a fixed [`CodecConfig`].
///
/// Wire format of a table:
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────┐
/// │ Length (4B)  │ Fields (Length bytes)                            │
/// │ big-endian   │ ┌──────────┬───────────┬─────────┬───────────┐   │
/// │              │ │ NameLen  │ Name      │ Tag     │ Payload   │.. │
/// │              │ │ (1B)     │ (NameLen) │ (1B)    │ (per tag) │   │
/// │              │ └──────────┴───────────┴─────────┴───────────┘   │
/// └──────────────┴──────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TableCodec {
    config: CodecConfig,
}

impl TableCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode `table` into a freshly allocated buffer.
    pub fn encode(&self, table: &FieldTable) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(encoded_len(table));
        self.encode_into(table, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the encoding of `table` to `dst`.
    ///
    /// On error `dst` is restored to its original length.
    pub fn encode_into(&self, table: &FieldTable, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        let result = TableWriter::with_config(dst, self.config).write_table(table);
        if result.is_err() {
            dst.truncate(start);
        } else {
            trace!(fields = table.len(), bytes = dst.len() - start, "encoded field table");
        }
        result
    }

    /// Decode exactly one table; bytes after its frame are an error.
    pub fn decode(&self, src: &[u8]) -> Result<FieldTable> {
        let mut reader = TableReader::with_config(src, self.config);
        let table = reader.read_table()?;
        reader.finish()?;
        trace!(fields = table.len(), bytes = src.len(), "decoded field table");
        Ok(table)
    }

    /// Decode one table from the front of `src`.
    ///
    /// Returns the table and the number of bytes its frame occupied; anything
    /// after the frame is left for the caller.
    pub fn decode_prefix(&self, src: &[u8]) -> Result<(FieldTable, usize)> {
        let mut reader = TableReader::with_config(src, self.config);
        let table = reader.read_table()?;
        Ok((table, reader.position()))
    }
}

/// Encode a table with the default configuration.
pub fn encode_table(table: &FieldTable) -> Result<Bytes> {
    TableCodec::default().encode(table)
}

/// Decode a table with the default configuration, rejecting trailing bytes.
pub fn decode_table(src: &[u8]) -> Result<FieldTable> {
    TableCodec::default().decode(src)
}

/// Decode a table from the front of `src` with the default configuration.
pub fn decode_table_prefix(src: &[u8]) -> Result<(FieldTable, usize)> {
    TableCodec::default().decode_prefix(src)
}

/// Exact number of bytes `table` encodes to, length prefix included.
///
/// Does not check limits; a table that fails to encode still has a size.
/// Walks the table with an explicit stack, so any nesting depth is safe.
pub fn encoded_len(table: &FieldTable) -> usize {
    let mut total = 4;
    let mut pending: Vec<&FieldValue> = Vec::new();
    for (key, value) in table {
        total += 1 + key.len();
        pending.push(value);
    }

    while let Some(value) = pending.pop() {
        let payload = match value {
            FieldValue::ShortString(s) => 1 + s.len(),
            FieldValue::LongString(s) => 4 + s.len(),
            FieldValue::Integer(_) => 4,
            FieldValue::Decimal(_) => 5,
            FieldValue::Timestamp(_) => 8,
            FieldValue::Table(t) => {
                for (key, value) in t {
                    total += 1 + key.len();
                    pending.push(value);
                }
                4
            }
            FieldValue::Array(items) => {
                pending.extend(items);
                4
            }
            FieldValue::Boolean(_) => 1,
            FieldValue::Void => 0,
        };
        total += 1 + payload;
    }
    total
}
