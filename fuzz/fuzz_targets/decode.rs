#![no_main]
use hashid_rs::{Config, Registry};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let registry = Registry::new(Config::new("fuzz-salt"));
    let _ = registry.hash_to_id(&String::from_utf8_lossy(data), "fuzz");
});
