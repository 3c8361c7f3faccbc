//! Self-describing binary codec for field tables.
//!
//! This is the core of tablerpc. A field table maps names to typed values and
//! is encoded as a length-prefixed frame:
//! - A 4-byte big-endian byte count of the fields that follow
//! - Per field: a 1-byte name length, the name, a 1-byte type tag, the payload
//! - Nested tables and arrays are frames of their own, so a reader can skip
//!   them without parsing
//!
//! The layout matches the AMQP 0-9-1 field table encoding for the supported
//! types.

pub mod codec;
pub mod error;
pub mod reader;
pub mod table;
pub mod value;
pub mod writer;

pub use codec::{
    decode_table, decode_table_prefix, encode_table, encoded_len, CodecConfig, DuplicateKeys,
    TableCodec, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FRAME_SIZE,
};
pub use error::{CodecError, Direction, Result};
pub use reader::TableReader;
pub use table::FieldTable;
pub use value::{Decimal, FieldValue, LongString, Timestamp};
pub use writer::TableWriter;
