#![no_main]
use actmon::FilterSet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Anything that parses must print back to an equivalent filter
    if let Ok(filter) = data.parse::<FilterSet>() {
        let again: FilterSet = filter.to_string().parse().unwrap();
        assert_eq!(again, filter);
        assert_eq!(FilterSet::from_bits(filter.to_bits()), filter);
    }
});
