//! zipmap: the legacy packed hash encoding (superseded by ziplist/hashtable
//! for new writes, still read for compatibility with older snapshots).
//!
//! Layout: a 1-byte advisory entry count (not trusted — the real count is
//! discovered by scanning to the terminator), then `key, value` records each
//! carrying a free-padding byte count after the value payload, then a single
//! 0xFF terminator byte.

use std::io::Cursor;

use crate::error::{RdbError, Result};
use crate::reader::ByteReader;
use crate::value::Value;

const ZIPMAP_END: u8 = 0xFF;

/// Reads one zipmap length field: values below 254 are the length
/// itself; 254 escapes to a 4-byte little-endian length; 255 marks the
/// terminator and is reported as `None`.
fn next_length(r: &mut ByteReader<Cursor<&[u8]>>) -> Result<Option<u32>> {
    let marker = r.read_u8()?;
    if marker == ZIPMAP_END {
        return Ok(None);
    }
    if marker == 254 {
        return Ok(Some(r.read_u32_le()?));
    }
    Ok(Some(marker as u32))
}

/// Classifies a zipmap value payload as an integer when it parses as the
/// ASCII decimal representation of one, mirroring the convention the format
/// otherwise only applies to the length-with-encoding string path.
fn classify(bytes: Vec<u8>) -> Value {
    if let Ok(s) = std::str::from_utf8(&bytes) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
    }
    Value::Bytes(bytes)
}

/// Decodes a zipmap from its raw byte string into field/value pairs.
pub fn decode(raw: &[u8]) -> Result<Vec<(Value, Value)>> {
    let mut r = ByteReader::new(Cursor::new(raw));
    let _advisory_count = r.read_u8()?;

    let mut out = Vec::new();
    loop {
        let key_len = match next_length(&mut r)? {
            Some(n) => n,
            None => break,
        };
        let key = r.read_bytes(key_len as usize)?;

        let value_len = match next_length(&mut r)? {
            Some(n) => n,
            None => return Err(RdbError::CorruptZipmap),
        };
        let free = r.read_u8()?;
        let value = r.read_bytes(value_len as usize)?;
        r.skip(free as u64)?;

        out.push((Value::Bytes(key), classify(value)));
    }

    Ok(out)
}
