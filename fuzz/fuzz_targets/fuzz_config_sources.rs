#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Must not panic on any config content
    let (_, body) = actmon::config::extract_sources(data);
    if let Ok(config) = actmon::Config::parse(&body) {
        let _ = config.parse_default_filter();
        let _ = config.topic_filters();
    }
});
