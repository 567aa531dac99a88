//! Error type for the dump-format decoder.
//!
//! A plain enum, a hand-written `Display`, and a `std::error::Error` impl —
//! no `thiserror`. Every fallible decode operation returns
//! `Result<T, RdbError>` so callers can match on the exact failure instead
//! of inspecting a formatted string.

use std::fmt;
use std::io;

/// Everything that can go wrong while decoding a dump file.
#[derive(Debug)]
pub enum RdbError {
    /// Failed to read from the underlying source.
    Io(io::Error),
    /// The header's first 5 bytes are not the expected magic tag.
    InvalidMagic,
    /// The header version is outside the supported range `[1, 6]`.
    InvalidVersion(u32),
    /// The byte source ran short of a fixed-width or length-prefixed read.
    UnexpectedEof,
    /// A top-level byte is neither a known opcode nor a known type tag.
    UnknownType(u8),
    /// LZF-decompressed length does not match the declared uncompressed length.
    CorruptLzf,
    /// An intset's encoding width field is not 2, 4, or 8.
    CorruptIntset(u32),
    /// A ziplist's terminator, entry header, or pair count is malformed.
    /// The `&'static str` names which check failed, for diagnosis.
    CorruptZiplist(&'static str),
    /// A zipmap ended mid-record.
    CorruptZipmap,
    /// A sorted-set score used a sentinel length (253/254/255) this decoder
    /// does not translate to a float.
    UnsupportedScore(u8),
    /// Wraps another `RdbError` with the key being processed when it occurred.
    WithKey {
        key: Vec<u8>,
        source: Box<RdbError>,
    },
}

impl RdbError {
    /// Attaches `key` to this error, for diagnosis at the call site that
    /// first knows which key was in flight. Idempotent: re-wrapping an
    /// already-keyed error keeps the innermost (first-assigned) key.
    pub fn with_key(self, key: &[u8]) -> RdbError {
        match self {
            RdbError::WithKey { .. } => self,
            other => RdbError::WithKey {
                key: key.to_vec(),
                source: Box::new(other),
            },
        }
    }
}

impl fmt::Display for RdbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdbError::Io(e) => write!(f, "io error: {e}"),
            RdbError::InvalidMagic => write!(f, "invalid magic string in header"),
            RdbError::InvalidVersion(v) => write!(f, "invalid rdb version {v}, expected 1..=6"),
            RdbError::UnexpectedEof => write!(f, "unexpected end of file"),
            RdbError::UnknownType(t) => write!(f, "unknown opcode/type tag {t}"),
            RdbError::CorruptLzf => write!(f, "lzf decompression length mismatch"),
            RdbError::CorruptIntset(enc) => write!(f, "invalid intset encoding width {enc}"),
            RdbError::CorruptZiplist(why) => write!(f, "corrupt ziplist: {why}"),
            RdbError::CorruptZipmap => write!(f, "zipmap ended mid-record"),
            RdbError::UnsupportedScore(l) => {
                write!(f, "unsupported sorted-set score length marker {l}")
            }
            RdbError::WithKey { key, source } => {
                write!(f, "{source} (key: {:?})", String::from_utf8_lossy(key))
            }
        }
    }
}

impl std::error::Error for RdbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RdbError::Io(e) => Some(e),
            RdbError::WithKey { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for RdbError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            RdbError::UnexpectedEof
        } else {
            RdbError::Io(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, RdbError>;
