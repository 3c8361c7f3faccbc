use std::fmt;

/// Which side of the codec raised a shared limit error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encode,
    Decode,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encode => f.write_str("encode"),
            Direction::Decode => f.write_str("decode"),
        }
    }
}

/// Errors that can occur while encoding or decoding field tables.
///
/// Offsets are byte positions from the start of the decoded input.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A short string value does not fit its 1-byte length prefix.
    #[error("short string too long ({len} bytes, max 255)")]
    ShortStringTooLong { len: usize },

    /// A long string value does not fit its 4-byte length prefix.
    #[error("long string too long ({len} bytes, max 4294967295)")]
    LongStringTooLong { len: usize },

    /// A field name does not fit its 1-byte length prefix.
    #[error("field name too long ({len} bytes, max 255)")]
    KeyTooLong { len: usize },

    /// A table or array frame exceeds the configured maximum size.
    #[error("{direction}: frame too large ({size} bytes, max {max})")]
    FrameTooLarge {
        direction: Direction,
        size: usize,
        max: usize,
    },

    /// Tables and arrays are nested deeper than the configured maximum.
    #[error("{direction}: nesting depth exceeds limit of {max}")]
    DepthLimitExceeded { direction: Direction, max: usize },

    /// A value tag byte matches no known variant.
    #[error("unknown field value tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// The input ended before a declared length was satisfied.
    #[error("truncated input at offset {offset} (needed {needed} bytes, {available} available)")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A field extends past the end of the frame that contains it.
    #[error("field at offset {offset} overruns its enclosing frame ending at offset {frame_end}")]
    FrameOverrun { offset: usize, frame_end: usize },

    /// Bytes remain after the outermost table frame.
    #[error("{count} trailing bytes after table frame")]
    TrailingBytes { count: usize },

    /// A field name or short string is not valid UTF-8.
    #[error("invalid UTF-8 in {what} at offset {offset}")]
    InvalidUtf8 { what: &'static str, offset: usize },

    /// A table repeats a field name and the policy rejects duplicates.
    #[error("duplicate field name {key:?}")]
    DuplicateKey { key: String },
}

impl CodecError {
    /// Returns true if the error was raised while encoding.
    pub fn is_encoding(&self) -> bool {
        match self {
            CodecError::ShortStringTooLong { .. }
            | CodecError::LongStringTooLong { .. }
            | CodecError::KeyTooLong { .. } => true,
            CodecError::FrameTooLarge { direction, .. }
            | CodecError::DepthLimitExceeded { direction, .. } => *direction == Direction::Encode,
            _ => false,
        }
    }

    /// Returns true if the error was raised while decoding.
    pub fn is_decoding(&self) -> bool {
        !self.is_encoding()
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
