#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(node) = xmldict::from_bytes(data) {
        let _ = node.to_string();
    }
});
