#![no_main]

use libfuzzer_sys::fuzz_target;

use quire::document::decode;
use quire::render::{ImagePolicy, preview};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes may fail to decode but must never panic
    if let Ok(content) = decode(data) {
        let output = preview(&content, &ImagePolicy::InlineDataUri);
        assert!(output.html.matches("<img").count() <= content.images.len());
    }
});
