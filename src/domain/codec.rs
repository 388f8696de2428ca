//! Wire token for per-call boundary metadata: `<file>:<line>:<side>`,
//! percent-encoded so it can ride in a URL query value.

use crate::domain::boundary::Side;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

pub const DELIMITER: char = ':';

/// Same unreserved set as `encodeURIComponent`.
pub const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Metadata stamped onto one matched call at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryRecord {
    pub file: String,
    pub line: u32,
    pub side: Side,
}

impl BoundaryRecord {
    pub fn new(file: impl Into<String>, line: u32, side: Side) -> Self {
        Self {
            file: file.into(),
            line,
            side,
        }
    }
}

/// Whatever could be recovered from a token. Absent fields were missing or corrupt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedRecord {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub side: Option<Side>,
}

impl DecodedRecord {
    pub fn into_record(self) -> Option<BoundaryRecord> {
        Some(BoundaryRecord {
            file: self.file?,
            line: self.line?,
            side: self.side?,
        })
    }
}

pub fn encode(record: &BoundaryRecord) -> String {
    let raw = format!(
        "{}{DELIMITER}{}{DELIMITER}{}",
        record.file, record.line, record.side
    );
    utf8_percent_encode(&raw, COMPONENT).to_string()
}

/// Decode a token; tolerates an already-decoded token and never fails.
pub fn decode(token: &str) -> DecodedRecord {
    let raw = percent_decode_str(token).decode_utf8_lossy();
    let mut parts = raw.split(DELIMITER);

    let file = parts
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let line = parts.next().and_then(|s| s.trim().parse::<u32>().ok());
    let side = parts.next().and_then(|s| Side::parse(s.trim()));

    DecodedRecord { file, line, side }
}
