//! Length-with-encoding prefix and string decoding.
//!
//! The top two bits of a length prefix's first byte select one of four
//! classes. The 32-bit class is read as 4 bytes interpreted big-endian
//! directly — equivalent to, but clearer than, reading a little-endian
//! `u32` and byte-swapping it.

use std::io::Read;

use crate::error::{RdbError, Result};
use crate::lzf;
use crate::reader::ByteReader;
use crate::value::Value;

/// Sub-encoding selector carried in the low 6 bits when a length prefix's
/// top two bits are `11` (the "special encoding" class).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecialEncoding {
    Int8,
    Int16,
    Int32,
    Lzf,
}

impl SpecialEncoding {
    fn from_low_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(SpecialEncoding::Int8),
            1 => Some(SpecialEncoding::Int16),
            2 => Some(SpecialEncoding::Int32),
            3 => Some(SpecialEncoding::Lzf),
            _ => None,
        }
    }
}

/// The decoded length-with-encoding prefix: either a plain length, or a
/// special encoding selector (with the length field repurposed to name it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPrefix {
    Length(u32),
    Encoded(u8),
}

impl LengthPrefix {
    pub fn is_encoded(&self) -> bool {
        matches!(self, LengthPrefix::Encoded(_))
    }
}

/// Reads one length-with-encoding prefix.
pub fn read_length_with_encoding<R: Read>(r: &mut ByteReader<R>) -> Result<LengthPrefix> {
    let first = r.read_u8()?;
    let top_bits = (first & 0xC0) >> 6;
    match top_bits {
        0b00 => Ok(LengthPrefix::Length((first & 0x3F) as u32)),
        0b01 => {
            let second = r.read_u8()?;
            let len = (((first & 0x3F) as u32) << 8) | second as u32;
            Ok(LengthPrefix::Length(len))
        }
        0b10 => {
            let len = r.read_u32_be()?;
            Ok(LengthPrefix::Length(len))
        }
        0b11 => Ok(LengthPrefix::Encoded(first & 0x3F)),
        _ => unreachable!("top two bits of a byte can only be one of four values"),
    }
}

/// Reads a plain length prefix, discarding whether it was a special
/// encoding. Used wherever the source only ever expects a count (element
/// counts, database indices) and a special-encoding byte there would be a
/// format violation the driver does not specially diagnose.
pub fn read_length<R: Read>(r: &mut ByteReader<R>) -> Result<u32> {
    match read_length_with_encoding(r)? {
        LengthPrefix::Length(n) => Ok(n),
        LengthPrefix::Encoded(_) => Err(RdbError::UnexpectedEof),
    }
}

/// Decodes a string value: raw bytes, a short integer, or an
/// LZF-compressed run.
pub fn read_string<R: Read>(r: &mut ByteReader<R>) -> Result<Value> {
    match read_length_with_encoding(r)? {
        LengthPrefix::Length(n) => Ok(Value::Bytes(r.read_bytes(n as usize)?)),
        LengthPrefix::Encoded(sub) => match SpecialEncoding::from_low_bits(sub) {
            Some(SpecialEncoding::Int8) => Ok(Value::Int(r.read_i8()? as i64)),
            Some(SpecialEncoding::Int16) => Ok(Value::Int(r.read_i16_le()? as i64)),
            Some(SpecialEncoding::Int32) => Ok(Value::Int(r.read_i32_le()? as i64)),
            Some(SpecialEncoding::Lzf) => {
                let clen = read_length(r)?;
                let ulen = read_length(r)?;
                let compressed = r.read_bytes(clen as usize)?;
                let raw = lzf::decompress(&compressed, ulen as usize)?;
                Ok(Value::Bytes(raw))
            }
            None => Err(RdbError::UnexpectedEof),
        },
    }
}

/// Consumes the same bytes `read_string` would, without materializing them.
/// Must byte-for-byte match `read_string`'s consumption so filter-rejected
/// keys/values advance the stream identically to filter-accepted ones.
pub fn skip_string<R: Read>(r: &mut ByteReader<R>) -> Result<()> {
    match read_length_with_encoding(r)? {
        LengthPrefix::Length(n) => r.skip(n as u64),
        LengthPrefix::Encoded(sub) => match SpecialEncoding::from_low_bits(sub) {
            Some(SpecialEncoding::Int8) => r.skip(1),
            Some(SpecialEncoding::Int16) => r.skip(2),
            Some(SpecialEncoding::Int32) => r.skip(4),
            Some(SpecialEncoding::Lzf) => {
                let clen = read_length(r)?;
                let _ulen = read_length(r)?;
                r.skip(clen as u64)
            }
            None => Err(RdbError::UnexpectedEof),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(bytes: &[u8]) -> ByteReader<Cursor<&[u8]>> {
        ByteReader::new(Cursor::new(bytes))
    }

    #[test]
    fn six_bit_length_class() {
        let mut r = reader(&[0x00]);
        assert_eq!(
            read_length_with_encoding(&mut r).unwrap(),
            LengthPrefix::Length(0)
        );
        let mut r = reader(&[0x3F]);
        assert_eq!(
            read_length_with_encoding(&mut r).unwrap(),
            LengthPrefix::Length(63)
        );
    }

    #[test]
    fn fourteen_bit_length_class_boundary() {
        // 64 needs the 14-bit class: byte0 top bits 01, low6=0, byte1=64.
        let mut r = reader(&[0x40, 64]);
        assert_eq!(
            read_length_with_encoding(&mut r).unwrap(),
            LengthPrefix::Length(64)
        );
        // 16383 = 0x3FFF -> byte0 = 0x40 | 0x3F, byte1 = 0xFF
        let mut r = reader(&[0x7F, 0xFF]);
        assert_eq!(
            read_length_with_encoding(&mut r).unwrap(),
            LengthPrefix::Length(16383)
        );
    }

    #[test]
    fn thirty_two_bit_length_class() {
        // top bits 10, low 6 bits ignored, then 4 bytes big-endian.
        let mut r = reader(&[0x80, 0x00, 0x00, 0x40, 0x00]);
        assert_eq!(
            read_length_with_encoding(&mut r).unwrap(),
            LengthPrefix::Length(16384)
        );
        let mut r = reader(&[0x80, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            read_length_with_encoding(&mut r).unwrap(),
            LengthPrefix::Length(u32::MAX)
        );
    }

    #[test]
    fn special_encoding_class() {
        let mut r = reader(&[0xC0]);
        assert_eq!(
            read_length_with_encoding(&mut r).unwrap(),
            LengthPrefix::Encoded(0)
        );
        let mut r = reader(&[0xC3]);
        assert_eq!(
            read_length_with_encoding(&mut r).unwrap(),
            LengthPrefix::Encoded(3)
        );
    }

    #[test]
    fn string_raw_bytes() {
        let mut r = reader(&[0x03, b'f', b'o', b'o']);
        assert_eq!(read_string(&mut r).unwrap(), Value::Bytes(b"foo".to_vec()));
    }

    #[test]
    fn string_int8_encoding() {
        let mut r = reader(&[0xC0, 42]);
        assert_eq!(read_string(&mut r).unwrap(), Value::Int(42));
    }

    #[test]
    fn string_int16_encoding() {
        let mut r = reader(&[0xC1, 0x2C, 0x01]); // 300 little-endian
        assert_eq!(read_string(&mut r).unwrap(), Value::Int(300));
    }

    #[test]
    fn string_int32_encoding() {
        let mut r = reader(&[0xC2, 0x00, 0x00, 0x01, 0x00]); // 65536 little-endian
        assert_eq!(read_string(&mut r).unwrap(), Value::Int(65536));
    }

    #[test]
    fn string_lzf_encoding_round_trips() {
        // literal run "abcabc": ctrl=5 -> 6 literal bytes.
        let compressed = [5u8, b'a', b'b', b'c', b'a', b'b', b'c'];
        let mut bytes = vec![0xC3]; // encoded, sub=3 (lzf)
        bytes.push(compressed.len() as u8); // clen (6-bit class)
        bytes.push(6); // ulen
        bytes.extend_from_slice(&compressed);
        let mut r = reader(&bytes);
        assert_eq!(
            read_string(&mut r).unwrap(),
            Value::Bytes(b"abcabc".to_vec())
        );
    }

    #[test]
    fn skip_string_consumes_same_bytes_as_read_raw() {
        let bytes = [0x05, b'h', b'e', b'l', b'l', b'o', 0xAA];
        let mut r1 = reader(&bytes);
        read_string(&mut r1).unwrap();
        let rest1 = {
            let mut v = Vec::new();
            r1.into_inner().read_to_end(&mut v).unwrap();
            v
        };

        let mut r2 = reader(&bytes);
        skip_string(&mut r2).unwrap();
        let rest2 = {
            let mut v = Vec::new();
            r2.into_inner().read_to_end(&mut v).unwrap();
            v
        };
        assert_eq!(rest1, rest2);
        assert_eq!(rest1, vec![0xAA]);
    }

    #[test]
    fn skip_string_consumes_same_bytes_as_read_int() {
        let bytes = [0xC1, 0x01, 0x00, 0xBB];
        let mut r1 = reader(&bytes);
        read_string(&mut r1).unwrap();
        let mut r2 = reader(&bytes);
        skip_string(&mut r2).unwrap();
        let mut rest1 = Vec::new();
        r1.into_inner().read_to_end(&mut rest1).unwrap();
        let mut rest2 = Vec::new();
        r2.into_inner().read_to_end(&mut rest2).unwrap();
        assert_eq!(rest1, rest2);
        assert_eq!(rest1, vec![0xBB]);
    }

    #[test]
    fn skip_string_consumes_same_bytes_as_read_lzf() {
        let compressed = [1u8, b'x', b'y'];
        let mut bytes = vec![0xC3, compressed.len() as u8, 2];
        bytes.extend_from_slice(&compressed);
        bytes.push(0xCC);
        let mut r1 = reader(&bytes);
        read_string(&mut r1).unwrap();
        let mut r2 = reader(&bytes);
        skip_string(&mut r2).unwrap();
        let mut rest1 = Vec::new();
        r1.into_inner().read_to_end(&mut rest1).unwrap();
        let mut rest2 = Vec::new();
        r2.into_inner().read_to_end(&mut rest2).unwrap();
        assert_eq!(rest1, rest2);
        assert_eq!(rest1, vec![0xCC]);
    }
}
