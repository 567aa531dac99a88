//! LZF decompression.
//!
//! # Security boundary
//!
//! `decompress` is on the untrusted-input decode path: every byte consumed
//! here comes straight from the dump file. Back-references are bounds
//! checked against the output produced so far (never against the
//! caller-declared `expected_len`, which is only checked once at the end) so
//! a malformed `ctrl`/distance pair cannot read out of bounds or panic.

use crate::error::{RdbError, Result};

/// Decompresses an LZF-compressed byte run, returning exactly `expected_len`
/// bytes on success.
///
/// The control-byte loop:
/// - `ctrl < 32`: the next `ctrl + 1` bytes are literals, copied verbatim.
/// - otherwise: `length = ctrl >> 5` (extended by one more byte if it reads
///   as 7), then a back-reference of distance `d = ((ctrl & 0x1F) << 8) |
///   next_byte + 1` is replayed for `length + 2` bytes. The replay is
///   byte-by-byte so a reference may overlap and extend into bytes it is
///   still producing (run-length-style repetition).
pub fn decompress(input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut ip = 0usize;

    while ip < input.len() {
        let ctrl = input[ip] as usize;
        ip += 1;

        if ctrl < 32 {
            let lit_len = ctrl + 1;
            let end = ip.checked_add(lit_len).ok_or(RdbError::CorruptLzf)?;
            if end > input.len() {
                return Err(RdbError::CorruptLzf);
            }
            out.extend_from_slice(&input[ip..end]);
            ip = end;
        } else {
            let mut length = ctrl >> 5;
            if length == 7 {
                let extra = *input.get(ip).ok_or(RdbError::CorruptLzf)?;
                length += extra as usize;
                ip += 1;
            }
            let b2 = *input.get(ip).ok_or(RdbError::CorruptLzf)? as usize;
            ip += 1;
            let dist = (((ctrl & 0x1F) << 8) | b2) + 1;

            let copy_len = length + 2;
            if dist > out.len() {
                return Err(RdbError::CorruptLzf);
            }
            let mut src = out.len() - dist;
            for _ in 0..copy_len {
                let byte = *out.get(src).ok_or(RdbError::CorruptLzf)?;
                out.push(byte);
                src += 1;
            }
        }
    }

    if out.len() != expected_len {
        return Err(RdbError::CorruptLzf);
    }
    Ok(out)
}
