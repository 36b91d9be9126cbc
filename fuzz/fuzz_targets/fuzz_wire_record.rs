#![no_main]
use actmon::tags::TagContext;
use actmon::WireLine;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Must not panic on any payload
    if let Ok(line) = WireLine::from_json(data) {
        let _ = line.into_line_data(&TagContext::new("fuzz"));
    }
});
