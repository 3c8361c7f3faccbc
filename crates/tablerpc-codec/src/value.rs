//! Field value types.
//!
//! [`FieldValue`] is the closed set of types a field table may carry. Each
//! variant maps to exactly one tag byte on the wire.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::table::FieldTable;

/// Tag for [`FieldValue::ShortString`] (`'s'`).
pub const TAG_SHORT_STRING: u8 = b's';
/// Tag for [`FieldValue::LongString`] (`'S'`).
pub const TAG_LONG_STRING: u8 = b'S';
/// Tag for [`FieldValue::Integer`] (`'I'`).
pub const TAG_INTEGER: u8 = b'I';
/// Tag for [`FieldValue::Decimal`] (`'D'`).
pub const TAG_DECIMAL: u8 = b'D';
/// Tag for [`FieldValue::Timestamp`] (`'T'`).
pub const TAG_TIMESTAMP: u8 = b'T';
/// Tag for [`FieldValue::Table`] (`'F'`).
pub const TAG_TABLE: u8 = b'F';
/// Tag for [`FieldValue::Array`] (`'A'`).
pub const TAG_ARRAY: u8 = b'A';
/// Tag for [`FieldValue::Boolean`] (`'t'`).
pub const TAG_BOOLEAN: u8 = b't';
/// Tag for [`FieldValue::Void`] (`'V'`).
pub const TAG_VOID: u8 = b'V';

/// A typed value stored in a [`FieldTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// UTF-8 text of at most 255 bytes. Only built explicitly; plain strings
    /// convert to [`LongString`](FieldValue::LongString).
    ShortString(String),
    /// Arbitrary bytes with a 32-bit length.
    LongString(LongString),
    /// 32-bit signed integer.
    Integer(i32),
    /// Scaled decimal.
    Decimal(Decimal),
    /// Whole seconds since the Unix epoch.
    Timestamp(Timestamp),
    /// Nested table.
    Table(FieldTable),
    /// Ordered sequence of values of any variant.
    Array(Vec<FieldValue>),
    /// Single byte, nonzero is true.
    Boolean(bool),
    /// Explicit absence of a value.
    Void,
}

impl FieldValue {
    /// Wire tag byte for this value.
    pub fn tag(&self) -> u8 {
        match self {
            FieldValue::ShortString(_) => TAG_SHORT_STRING,
            FieldValue::LongString(_) => TAG_LONG_STRING,
            FieldValue::Integer(_) => TAG_INTEGER,
            FieldValue::Decimal(_) => TAG_DECIMAL,
            FieldValue::Timestamp(_) => TAG_TIMESTAMP,
            FieldValue::Table(_) => TAG_TABLE,
            FieldValue::Array(_) => TAG_ARRAY,
            FieldValue::Boolean(_) => TAG_BOOLEAN,
            FieldValue::Void => TAG_VOID,
        }
    }

    /// Human-readable variant name.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::ShortString(_) => "short-string",
            FieldValue::LongString(_) => "long-string",
            FieldValue::Integer(_) => "integer",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Table(_) => "table",
            FieldValue::Array(_) => "array",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Void => "void",
        }
    }

    /// Text of a short string, or of a long string holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::ShortString(s) => Some(s),
            FieldValue::LongString(s) => s.as_str(),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            FieldValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&FieldTable> {
        match self {
            FieldValue::Table(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, FieldValue::Void)
    }
}

impl From<String> for FieldValue {
    /// Text is written as a long string (`'S'`), whatever its length.
    fn from(value: String) -> Self {
        FieldValue::LongString(LongString::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::LongString(LongString::from(value))
    }
}

impl From<LongString> for FieldValue {
    fn from(value: LongString) -> Self {
        FieldValue::LongString(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(value: Timestamp) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<FieldTable> for FieldValue {
    fn from(value: FieldTable) -> Self {
        FieldValue::Table(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::Array(value)
    }
}

/// A string payload with a 4-byte length prefix.
///
/// Long strings are opaque bytes on the wire; they are not required to hold
/// UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LongString(Bytes);

impl LongString {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The contents as text, if they are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<String> for LongString {
    fn from(value: String) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<&str> for LongString {
    fn from(value: &str) -> Self {
        Self(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<Vec<u8>> for LongString {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

impl fmt::Display for LongString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// A decimal number stored as an unscaled 32-bit integer and a scale.
///
/// The numeric value is `value * 10^-scale`. Scale and unscaled value are kept
/// exactly as given, so `1.0` (value 10, scale 1) and `1` (value 1, scale 0)
/// are distinct decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    scale: u8,
    value: i32,
}

impl Decimal {
    pub const fn new(value: i32, scale: u8) -> Self {
        Self { scale, value }
    }

    /// Number of digits after the decimal point.
    pub const fn scale(self) -> u8 {
        self.scale
    }

    /// The unscaled integer value.
    pub const fn value(self) -> i32 {
        self.value
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.value < 0 { "-" } else { "" };
        let digits = self.value.unsigned_abs().to_string();
        let scale = usize::from(self.scale);
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

/// A point in time with whole-second precision, relative to the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Seconds since the Unix epoch (negative before it).
    pub const fn as_secs(self) -> i64 {
        self.0
    }

    /// The current time, truncated to the second.
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    /// Convert back to a `SystemTime`, or `None` if it is out of range for the platform.
    pub fn to_system_time(self) -> Option<SystemTime> {
        let magnitude = Duration::from_secs(self.0.unsigned_abs());
        if self.0 >= 0 {
            UNIX_EPOCH.checked_add(magnitude)
        } else {
            UNIX_EPOCH.checked_sub(magnitude)
        }
    }
}

impl From<SystemTime> for Timestamp {
    /// Sub-second precision is discarded, rounding toward the past.
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self(saturating_secs(after)),
            Err(err) => {
                let before = err.duration();
                let mut secs = saturating_secs(before);
                if before.subsec_nanos() > 0 {
                    secs = secs.saturating_add(1);
                }
                Self(-secs)
            }
        }
    }
}

fn saturating_secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
