#![no_main]
use libfuzzer_sys::fuzz_target;

use rdb_parse::{EventSink, Parser};

struct Noop;
impl EventSink for Noop {}

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes through the full decoder. Err results are
    // expected and fine; what we verify is no panics, no unbounded
    // allocation, and no undefined behavior.
    let mut parser = Parser::new(Box::new(Noop));
    let _ = parser.parse(data);
});
