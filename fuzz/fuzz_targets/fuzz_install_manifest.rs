#![no_main]

use libfuzzer_sys::fuzz_target;
use stackql_installer::InstallManifest;

fuzz_target!(|data: &[u8]| {
    // Limit input size to prevent timeout
    if data.len() > 1_000_000 {
        return;
    }

    // Try to decode a manifest - should never panic
    let _ = InstallManifest::decode(data);
});
