//! Top-level driver: header verification, opcode dispatch, per-type value
//! reading, and filter-based skip vs emit.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::trace;

use crate::error::{RdbError, Result};
use crate::filter::FilterConfig;
use crate::length::{read_length, read_string, skip_string};
use crate::packed;
use crate::reader::ByteReader;
use crate::sink::EventSink;
use crate::value::{logical_type_for_tag, Encoding, Value, ValueInfo};

const MAGIC: &[u8; 5] = b"REDIS";

/// Drives a single parse from a byte source to an [`EventSink`], applying
/// an optional [`FilterConfig`].
pub struct Parser {
    sink: Box<dyn EventSink>,
    filter: FilterConfig,
}

impl Parser {
    /// A parser with no filter: every database, key, and type is emitted.
    pub fn new(sink: Box<dyn EventSink>) -> Self {
        Parser {
            sink,
            filter: FilterConfig::none(),
        }
    }

    pub fn with_filter(sink: Box<dyn EventSink>, filter: FilterConfig) -> Self {
        Parser { sink, filter }
    }

    /// Opens `path` read-only, buffers it, and drives the state machine to
    /// completion or failure. The file is closed on every exit path via
    /// `BufReader`'s drop.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::open(path).map_err(RdbError::from)?;
        self.parse(BufReader::new(file))
    }

    /// Drives the state machine over any `Read` source — an in-memory byte
    /// slice in tests, or a stream already wrapped by some outer container.
    pub fn parse<R: Read>(&mut self, source: R) -> Result<()> {
        let mut r = ByteReader::new(source);
        verify_header(&mut r)?;

        self.sink.start_rdb();
        trace!("header verified, entering db loop");

        let mut current_db: Option<u32> = None;
        let mut pending_expiry: Option<SystemTime> = None;

        'outer: loop {
            pending_expiry = None;
            let mut opcode = r.read_u8()?;

            loop {
                match opcode {
                    252 => {
                        let ms = r.read_u64_le()?;
                        pending_expiry = Some(UNIX_EPOCH + Duration::from_micros(ms * 1000));
                        trace!("pending expiration (ms): {ms}");
                        opcode = r.read_u8()?;
                    }
                    253 => {
                        let secs = r.read_u32_le()?;
                        pending_expiry =
                            Some(UNIX_EPOCH + Duration::from_micros(secs as u64 * 1_000_000));
                        trace!("pending expiration (s): {secs}");
                        opcode = r.read_u8()?;
                    }
                    254 => {
                        if let Some(db) = current_db {
                            self.sink.end_database(db);
                        }
                        let idx = read_length(&mut r)?;
                        trace!("select database {idx}");
                        current_db = Some(idx);
                        self.sink.start_database(idx);
                        continue 'outer;
                    }
                    255 => {
                        if let Some(db) = current_db {
                            self.sink.end_database(db);
                        }
                        self.sink.end_rdb();
                        trace!("end of file");
                        break 'outer;
                    }
                    tag => {
                        let db = current_db.unwrap_or(0);
                        self.dispatch_value(&mut r, db, tag, pending_expiry)?;
                        continue 'outer;
                    }
                }
            }
        }

        Ok(())
    }

    fn dispatch_value<R: Read>(
        &mut self,
        r: &mut ByteReader<R>,
        db: u32,
        tag: u8,
        expiry: Option<SystemTime>,
    ) -> Result<()> {
        let logical_type = logical_type_for_tag(tag).ok_or(RdbError::UnknownType(tag))?;

        if !self.filter.accepts_database(db) {
            trace!("db {db} rejected by filter, skipping key and value");
            skip_string(r)?;
            return skip_value(r, tag);
        }

        let key = value_to_key_bytes(read_string(r)?);

        if !self.filter.accepts(db, &key, logical_type) {
            trace!("key rejected by filter, skipping value");
            return skip_value(r, tag);
        }

        self.read_and_emit(r, &key, tag, expiry)
    }

    fn read_and_emit<R: Read>(
        &mut self,
        r: &mut ByteReader<R>,
        key: &[u8],
        tag: u8,
        expiry: Option<SystemTime>,
    ) -> Result<()> {
        match tag {
            0 => {
                let value = read_string(r)?;
                let info = ValueInfo::new(Encoding::String);
                self.sink.set(key, &value, expiry, &info);
            }
            1 => {
                let n = read_length(r)? as usize;
                let info = ValueInfo::new(Encoding::LinkedList);
                self.sink.start_list(key, n, expiry, &info);
                for _ in 0..n {
                    let value = read_string(r)?;
                    self.sink.rpush(key, &value);
                }
                self.sink.end_list(key);
            }
            2 => {
                let n = read_length(r)? as usize;
                let info = ValueInfo::new(Encoding::Hashtable);
                self.sink.start_set(key, n, expiry, &info);
                for _ in 0..n {
                    let member = read_string(r)?;
                    self.sink.sadd(key, &member);
                }
                self.sink.end_set(key);
            }
            3 => {
                let n = read_length(r)? as usize;
                let info = ValueInfo::new(Encoding::Skiplist);
                self.sink.start_sorted_set(key, n, expiry, &info);
                for _ in 0..n {
                    let member = read_string(r)?;
                    let score = read_score(r)?;
                    self.sink.zadd(key, score, &member);
                }
                self.sink.end_sorted_set(key);
            }
            4 => {
                let n = read_length(r)? as usize;
                let info = ValueInfo::new(Encoding::Hashtable);
                self.sink.start_hash(key, n, expiry, &info);
                for _ in 0..n {
                    let field = read_string(r)?;
                    let value = read_string(r)?;
                    self.sink.hset(key, &field, &value);
                }
                self.sink.end_hash(key);
            }
            9 => {
                let raw = read_packed_blob(r)?;
                let pairs = packed::zipmap::decode(&raw)?;
                let info = ValueInfo::with_sizeof(Encoding::Zipmap, raw.len());
                self.sink.start_hash(key, pairs.len(), expiry, &info);
                for (field, value) in &pairs {
                    self.sink.hset(key, field, value);
                }
                self.sink.end_hash(key);
            }
            10 => {
                let raw = read_packed_blob(r)?;
                let values = packed::ziplist::decode_list(&raw)?;
                let info = ValueInfo::with_sizeof(Encoding::Ziplist, raw.len());
                self.sink.start_list(key, values.len(), expiry, &info);
                for value in &values {
                    self.sink.rpush(key, value);
                }
                self.sink.end_list(key);
            }
            11 => {
                let raw = read_packed_blob(r)?;
                let members = packed::intset::decode(&raw)?;
                let info = ValueInfo::with_sizeof(Encoding::Intset, raw.len());
                self.sink.start_set(key, members.len(), expiry, &info);
                for member in &members {
                    self.sink.sadd(key, member);
                }
                self.sink.end_set(key);
            }
            12 => {
                let raw = read_packed_blob(r)?;
                let pairs = packed::ziplist::decode_pairs(&raw)?;
                let info = ValueInfo::with_sizeof(Encoding::Ziplist, raw.len());
                self.sink.start_sorted_set(key, pairs.len(), expiry, &info);
                for (member, score_value) in &pairs {
                    let score = value_as_score(score_value)?;
                    self.sink.zadd(key, score, member);
                }
                self.sink.end_sorted_set(key);
            }
            13 => {
                let raw = read_packed_blob(r)?;
                let pairs = packed::ziplist::decode_pairs(&raw)?;
                let info = ValueInfo::with_sizeof(Encoding::Ziplist, raw.len());
                self.sink.start_hash(key, pairs.len(), expiry, &info);
                for (field, value) in &pairs {
                    self.sink.hset(key, field, value);
                }
                self.sink.end_hash(key);
            }
            other => return Err(RdbError::UnknownType(other)),
        }
        Ok(())
    }
}

fn verify_header<R: Read>(r: &mut ByteReader<R>) -> Result<()> {
    let magic = r.read_bytes(5)?;
    if magic != MAGIC {
        return Err(RdbError::InvalidMagic);
    }
    let version_bytes = r.read_bytes(4)?;
    let version: u32 = std::str::from_utf8(&version_bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    if !(1..=6).contains(&version) {
        return Err(RdbError::InvalidVersion(version));
    }
    Ok(())
}

fn value_to_key_bytes(value: Value) -> Vec<u8> {
    match value {
        Value::Bytes(b) => b,
        Value::Int(i) => i.to_string().into_bytes(),
        Value::Float(f) => f.to_string().into_bytes(),
    }
}

/// Reads a length-prefixed raw byte string for a packed container's
/// interior. Packed payloads are always stored as plain raw strings; an
/// int-encoded length prefix here indicates a malformed stream.
fn read_packed_blob<R: Read>(r: &mut ByteReader<R>) -> Result<Vec<u8>> {
    match read_string(r)? {
        Value::Bytes(b) => Ok(b),
        _ => Err(RdbError::UnexpectedEof),
    }
}

fn value_as_score(value: &Value) -> Result<f64> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Bytes(b) => std::str::from_utf8(b)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or(RdbError::CorruptZiplist("non-numeric sorted-set score")),
    }
}

/// Reads a non-packed sorted-set score: a one-byte length `L`, then `L`
/// ASCII bytes parsed as a float. `L` in {253, 254, 255} is a sentinel for
/// +inf/-inf/nan that this decoder does not translate to a special float
/// value; it emits `UnsupportedScore` instead.
fn read_score<R: Read>(r: &mut ByteReader<R>) -> Result<f64> {
    let len = r.read_u8()?;
    if matches!(len, 253 | 254 | 255) {
        return Err(RdbError::UnsupportedScore(len));
    }
    let bytes = r.read_bytes(len as usize)?;
    std::str::from_utf8(&bytes)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or(RdbError::UnsupportedScore(len))
}

/// Mirrors `read_score`'s consumption for the filter-rejected path: a
/// sentinel length consumes nothing further, matching that `read_score`
/// would fail before reading any score bytes either.
fn skip_score<R: Read>(r: &mut ByteReader<R>) -> Result<()> {
    let len = r.read_u8()?;
    if matches!(len, 253 | 254 | 255) {
        return Ok(());
    }
    r.skip(len as u64)
}

fn skip_value<R: Read>(r: &mut ByteReader<R>, tag: u8) -> Result<()> {
    match tag {
        0 => skip_string(r),
        1 | 2 => {
            let n = read_length(r)?;
            for _ in 0..n {
                skip_string(r)?;
            }
            Ok(())
        }
        3 => {
            let n = read_length(r)?;
            for _ in 0..n {
                skip_string(r)?;
                skip_score(r)?;
            }
            Ok(())
        }
        4 => {
            let n = read_length(r)?;
            for _ in 0..n {
                skip_string(r)?;
                skip_string(r)?;
            }
            Ok(())
        }
        9 | 10 | 11 | 12 | 13 => skip_string(r),
        other => Err(RdbError::UnknownType(other)),
    }
}
