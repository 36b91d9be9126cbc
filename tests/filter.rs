//! Two-axis filter combination, parsing and packing.

use actmon::{Error, FilterSet, Level, LevelFilter};

const AXES: [LevelFilter; 8] = [
    LevelFilter::Undefined,
    LevelFilter::None,
    LevelFilter::Trace,
    LevelFilter::Info,
    LevelFilter::Warn,
    LevelFilter::Error,
    LevelFilter::Fatal,
    LevelFilter::Off,
];

fn every_filter() -> impl Iterator<Item = FilterSet> {
    AXES.into_iter()
        .flat_map(|g| AXES.into_iter().map(move |l| FilterSet::new(g, l)))
}

#[test]
fn combine_is_commutative_and_associative() {
    for a in every_filter() {
        for b in every_filter() {
            assert_eq!(a.combine(b), b.combine(a), "{a} / {b}");
        }
    }
    let samples = [
        FilterSet::UNDEFINED,
        FilterSet::VERBOSE,
        FilterSet::TERSE,
        FilterSet::OFF,
        FilterSet::new(LevelFilter::Undefined, LevelFilter::Warn),
    ];
    for a in samples {
        for b in samples {
            for c in samples {
                assert_eq!(a.combine(b).combine(c), a.combine(b.combine(c)));
            }
        }
    }
}

#[test]
fn undefined_is_neutral_and_off_absorbs() {
    for f in every_filter() {
        assert_eq!(f.combine(FilterSet::UNDEFINED), f);
        assert_eq!(f.combine(FilterSet::OFF), FilterSet::OFF);
    }
}

#[test]
fn combine_keeps_the_more_verbose_threshold() {
    assert_eq!(
        FilterSet::TERSE.combine(FilterSet::MONITOR),
        FilterSet::new(LevelFilter::Trace, LevelFilter::Warn)
    );
    assert_eq!(
        FilterSet::new(LevelFilter::Undefined, LevelFilter::Fatal)
            .combine(FilterSet::new(LevelFilter::Warn, LevelFilter::Undefined)),
        FilterSet::new(LevelFilter::Warn, LevelFilter::Fatal)
    );
}

#[test]
fn combine_none_only_treats_undefined_as_a_value() {
    let parent = FilterSet::new(LevelFilter::Info, LevelFilter::Undefined);
    let child = FilterSet::new(LevelFilter::None, LevelFilter::Warn);
    assert_eq!(
        parent.combine_none_only(child),
        FilterSet::new(LevelFilter::Info, LevelFilter::Undefined)
    );
}

#[test]
fn acceptance_resolves_undefined_against_fallback() {
    let filter = FilterSet::new(LevelFilter::Undefined, LevelFilter::Warn);
    assert!(filter.accepts_group(Level::Info, FilterSet::TERSE));
    assert!(!filter.accepts_group(Level::Info, FilterSet::RELEASE));
    assert!(!filter.accepts_line(Level::Info, FilterSet::VERBOSE));
    assert!(filter.accepts_line(Level::Error, FilterSet::OFF));
}

#[test]
fn presets_round_trip_through_text() {
    for (name, filter) in [
        ("undefined", FilterSet::UNDEFINED),
        ("verbose", FilterSet::VERBOSE),
        ("monitor", FilterSet::MONITOR),
        ("terse", FilterSet::TERSE),
        ("release", FilterSet::RELEASE),
        ("off", FilterSet::OFF),
    ] {
        assert_eq!(filter.to_string(), name);
        assert_eq!(name.parse::<FilterSet>().unwrap(), filter);
    }
}

#[test]
fn custom_filters_parse() {
    let custom: FilterSet = "{ info , fatal }".parse().unwrap();
    assert_eq!(custom, FilterSet::new(LevelFilter::Info, LevelFilter::Fatal));
    assert_eq!(custom.to_string(), "{info,fatal}");
    assert_eq!(
        "warn".parse::<FilterSet>().unwrap(),
        FilterSet::uniform(LevelFilter::Warn)
    );
    assert_eq!("Debug".parse::<FilterSet>().unwrap(), FilterSet::VERBOSE);

    for bad in ["loud", "{info}", "{info,loud}", "{,}", ""] {
        assert!(matches!(bad.parse::<FilterSet>(), Err(Error::InvalidFilter(_))), "{bad}");
    }
}

#[test]
fn bits_pack_both_axes() {
    for f in every_filter() {
        assert_eq!(FilterSet::from_bits(f.to_bits()), f);
    }
    assert_eq!(FilterSet::from_bits(FilterSet::INVALID.to_bits()), FilterSet::INVALID);
    assert!(!FilterSet::INVALID.is_valid());
    assert_ne!(FilterSet::INVALID.to_bits(), FilterSet::UNDEFINED.to_bits());
}

#[test]
fn contribution_check_matches_a_real_recombination() {
    let others = [
        FilterSet::UNDEFINED,
        FilterSet::TERSE,
        FilterSet::new(LevelFilter::Warn, LevelFilter::Undefined),
    ];
    for other in others {
        for value in every_filter() {
            let aggregate = other.combine(value);
            if !value.may_contribute_to(aggregate) {
                assert_eq!(other, aggregate, "{value} was said not to matter");
            }
        }
    }
}

#[test]
fn contribution_examples() {
    let aggregate = FilterSet::new(LevelFilter::Trace, LevelFilter::Warn);
    assert!(!FilterSet::UNDEFINED.may_contribute_to(aggregate));
    assert!(!FilterSet::RELEASE.may_contribute_to(aggregate));
    assert!(FilterSet::uniform(LevelFilter::Warn).may_contribute_to(aggregate));
    assert!(FilterSet::uniform(LevelFilter::Info).may_contribute_to(aggregate));
    assert!(FilterSet::OFF.may_contribute_to(aggregate));
}
