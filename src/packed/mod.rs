//! Packed-container decoders.
//!
//! Each decoder here is handed a previously-read raw byte string (obtained
//! through [`crate::length::read_string`]) and parses its interior with a
//! fresh [`crate::reader::ByteReader`] wrapping a `std::io::Cursor` over that
//! byte slice. The outer sequence header from the calling context (the type
//! tag, the key) is never re-read here.

pub mod intset;
pub mod zipmap;
pub mod ziplist;
