#![no_main]
use actmon::tags::TagContext;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let ctx = TagContext::new("fuzz");
    let set = ctx.find_or_create(data);
    // Text form is canonical: parsing it again yields the same set
    assert_eq!(ctx.find_or_create(&set.to_string()), set);
    let _ = ctx.atomic(data);
});
