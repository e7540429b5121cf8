#![no_main]

use libfuzzer_sys::fuzz_target;
use stackql::version::parse_version_line;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Must never panic; a parsed sha is never empty
        if let Ok(info) = parse_version_line(text) {
            assert!(!info.sha.is_empty());
        }
    }
});
