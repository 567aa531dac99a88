//! Event sink contract.
//!
//! An interface with no default behavior per-method would force every
//! embedder to implement callbacks it doesn't care about; instead every
//! method here has a no-op default, so a JSON printer only overrides `set`
//! and a memory estimator only overrides the `start_X`/`end_X` pairs it
//! needs — composition instead of an inheritance chain.

use std::time::SystemTime;

use crate::value::{Value, ValueInfo};

/// Receives lifecycle callbacks describing one parse, in file order.
///
/// Every method is total and defaults to doing nothing, so implementations
/// only override what they consume.
pub trait EventSink {
    fn start_rdb(&mut self) {}
    fn end_rdb(&mut self) {}

    fn start_database(&mut self, _idx: u32) {}
    fn end_database(&mut self, _idx: u32) {}

    fn set(&mut self, _key: &[u8], _value: &Value, _expiry: Option<SystemTime>, _info: &ValueInfo) {}

    fn start_hash(&mut self, _key: &[u8], _length: usize, _expiry: Option<SystemTime>, _info: &ValueInfo) {}
    fn hset(&mut self, _key: &[u8], _field: &Value, _value: &Value) {}
    fn end_hash(&mut self, _key: &[u8]) {}

    fn start_set(&mut self, _key: &[u8], _cardinality: usize, _expiry: Option<SystemTime>, _info: &ValueInfo) {}
    fn sadd(&mut self, _key: &[u8], _member: &Value) {}
    fn end_set(&mut self, _key: &[u8]) {}

    fn start_list(&mut self, _key: &[u8], _length: usize, _expiry: Option<SystemTime>, _info: &ValueInfo) {}
    fn rpush(&mut self, _key: &[u8], _value: &Value) {}
    fn end_list(&mut self, _key: &[u8]) {}

    fn start_sorted_set(&mut self, _key: &[u8], _length: usize, _expiry: Option<SystemTime>, _info: &ValueInfo) {}
    fn zadd(&mut self, _key: &[u8], _score: f64, _member: &Value) {}
    fn end_sorted_set(&mut self, _key: &[u8]) {}
}
