//! intset: a contiguous packed set of same-width little-endian integers.

use std::io::Cursor;

use crate::error::{RdbError, Result};
use crate::reader::ByteReader;
use crate::value::Value;

/// Decodes an intset from its raw byte string, returning the member values
/// in on-disk order.
///
/// Header: 4-byte little-endian encoding width in {2, 4, 8} bytes per
/// integer, then a 4-byte little-endian entry count, then that many
/// unsigned little-endian integers of the declared width.
pub fn decode(raw: &[u8]) -> Result<Vec<Value>> {
    let mut r = ByteReader::new(Cursor::new(raw));
    let encoding = r.read_u32_le()?;
    let count = r.read_u32_le()?;

    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let v = match encoding {
            2 => r.read_u16_le()? as i64,
            4 => r.read_u32_le()? as i64,
            8 => r.read_u64_le()? as i64,
            other => return Err(RdbError::CorruptIntset(other)),
        };
        out.push(Value::Int(v));
    }
    Ok(out)
}
