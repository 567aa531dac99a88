//! Streaming, byte-accurate decoder for a Redis-family in-memory
//! key-value store's on-disk dump snapshot format.
//!
//! The decoder reads a dump file sequentially and drives an [`EventSink`]
//! through the databases, keys, expirations, and typed values it finds,
//! including the compact packed encodings (intset, ziplist, zipmap) and
//! LZF-compressed strings. It does not interpret the events itself — that
//! is the embedder's job, via its own `EventSink` implementation.

pub mod driver;
pub mod error;
pub mod filter;
pub mod length;
pub mod lzf;
pub mod packed;
pub mod reader;
pub mod sink;
pub mod value;

pub use driver::Parser;
pub use error::{RdbError, Result};
pub use filter::FilterConfig;
pub use sink::EventSink;
pub use value::{Encoding, LogicalType, Value, ValueInfo};
