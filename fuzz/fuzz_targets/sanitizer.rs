#![no_main]

use libfuzzer_sys::fuzz_target;

use quire::extractor::{DescriptionRule, extract, sanitize};

fuzz_target!(|data: &[u8]| {
    // Convert raw bytes to string, handling invalid UTF-8 gracefully
    let html = String::from_utf8_lossy(data);

    // Sanitizing must never panic and must be stable
    let once = sanitize(&html);
    assert_eq!(sanitize(&once), once);

    let meta = extract(&html, DescriptionRule::default());
    assert!(meta.reading_time_minutes >= 1);
});
