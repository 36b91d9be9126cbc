//! Relaying one monitor's activity onto another.

use actmon::bridge::PREMATURE_CLOSE_TEXT;
use actmon::context::well_known;
use actmon::{
    BridgeRelay, Collector, EntryKind, ExceptionData, FilterSet, Level, LineData, LogTime,
    Monitor, MonitorContext, RelayOptions, WireLine,
};
use std::sync::Arc;

struct Pair {
    source: Monitor,
    target: Monitor,
    received: Arc<Collector>,
}

/// Source and target live in separate contexts, as they would across a boundary.
fn pair(target_filter: FilterSet) -> Pair {
    let source = MonitorContext::new().create_monitor();
    let target = MonitorContext::new().create_monitor();
    target.set_minimal_filter(target_filter).unwrap();
    let received = Arc::new(Collector::new(FilterSet::UNDEFINED, 1000));
    target.register_bound_client(received.clone()).unwrap();
    Pair {
        source,
        target,
        received,
    }
}

fn attach(pair: &Pair, options: RelayOptions) -> Arc<BridgeRelay> {
    let relay = BridgeRelay::new(pair.target.bridge_target(), options);
    pair.source.register_bound_client(relay.clone()).unwrap();
    relay
}

#[test]
fn lines_and_groups_are_replayed() {
    let pair = pair(FilterSet::UNDEFINED);
    attach(&pair, RelayOptions::default());
    let tags = pair.source.context().tags();

    pair.source
        .log_with(LineData::new(Level::Info, "hello").tags(tags.find_or_create("Net|Io")))
        .unwrap();
    pair.source.open_group(Level::Warn, "step").unwrap();
    pair.source.close_group_with("done").unwrap();

    let entries = pair.received.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].text, "hello");
    assert_eq!(entries[0].tags.to_string(), "Io|Net");
    assert!(pair.target.context().tags().accepts(&entries[0].tags));
    assert_eq!(entries[1].kind, EntryKind::OpenGroup);
    assert_eq!(entries[2].kind, EntryKind::CloseGroup);
    assert_eq!(entries[2].conclusions[0].text, "done");
    assert!(entries[2].conclusions[0]
        .tag
        .contains(well_known::USER_CONCLUSION));
    assert_eq!(pair.target.open_group_count(), 0);
}

#[test]
fn groups_opened_before_attach_are_never_closed_on_target() {
    let pair = pair(FilterSet::UNDEFINED);
    pair.source.open_group(Level::Info, "early 1").unwrap();
    pair.source.open_group(Level::Info, "early 2").unwrap();

    let relay = attach(&pair, RelayOptions::default());
    pair.source.open_group(Level::Info, "late").unwrap();
    assert_eq!(pair.target.open_group_count(), 1);
    assert_eq!(relay.forwarded_open_groups(), 1);

    while pair.source.close_group().unwrap() {}

    let closes = pair
        .received
        .entries()
        .into_iter()
        .filter(|e| e.kind == EntryKind::CloseGroup)
        .count();
    assert_eq!(closes, 1);
    assert_eq!(pair.target.open_group_count(), 0);
    assert_eq!(relay.forwarded_open_groups(), 0);
}

#[test]
fn detaching_closes_forwarded_groups_prematurely() {
    let pair = pair(FilterSet::UNDEFINED);
    let relay = attach(&pair, RelayOptions::default());
    pair.source.open_group(Level::Info, "a").unwrap();
    pair.source.open_group(Level::Info, "b").unwrap();
    assert_eq!(pair.target.open_group_count(), 2);

    assert!(pair.source.unregister_client(&relay).unwrap());
    assert_eq!(pair.target.open_group_count(), 0);
    assert_eq!(pair.source.open_group_count(), 2);

    let closes: Vec<_> = pair
        .received
        .entries()
        .into_iter()
        .filter(|e| e.kind == EntryKind::CloseGroup)
        .collect();
    assert_eq!(closes.len(), 2);
    for close in &closes {
        assert_eq!(close.conclusions.len(), 1);
        assert_eq!(close.conclusions[0].text, PREMATURE_CLOSE_TEXT);
        assert!(close.conclusions[0]
            .tag
            .contains(well_known::BRIDGE_PREMATURE_CLOSE));
    }
    assert_eq!(closes[0].text, "b");

    // Later closes on the source no longer reach the target.
    while pair.source.close_group().unwrap() {}
    assert_eq!(
        pair.received
            .entries()
            .iter()
            .filter(|e| e.kind == EntryKind::CloseGroup)
            .count(),
        2
    );
}

#[test]
fn unfiltered_lines_pass_unless_target_filter_applies() {
    let strict = pair(FilterSet::RELEASE);
    attach(&strict, RelayOptions::default());
    strict.source.set_minimal_filter(FilterSet::VERBOSE).unwrap();

    assert!(strict.source.info("filtered info").unwrap());
    strict
        .source
        .unfiltered_log(LineData::new(Level::Info, "forced info"))
        .unwrap();
    assert!(strict.source.error("boom").unwrap());
    assert_eq!(strict.received.lines(), ["forced info", "boom"]);

    let lossy = pair(FilterSet::RELEASE);
    attach(&lossy, RelayOptions::default().apply_target_filter(true));
    lossy.source.set_minimal_filter(FilterSet::VERBOSE).unwrap();

    lossy
        .source
        .unfiltered_log(LineData::new(Level::Info, "forced info"))
        .unwrap();
    assert!(lossy.source.error("boom").unwrap());
    assert_eq!(lossy.received.lines(), ["boom"]);
}

#[test]
fn relay_makes_source_honor_target_filter() {
    let pair = pair(FilterSet::RELEASE);
    let relay = attach(&pair, RelayOptions::default());

    assert_eq!(pair.source.actual_filter().unwrap(), FilterSet::RELEASE);
    assert!(!pair.source.info("too chatty").unwrap());

    pair.target.set_minimal_filter(FilterSet::VERBOSE).unwrap();
    assert!(pair.source.is_filter_dirty());
    assert_eq!(relay.target_filter(), FilterSet::VERBOSE);

    assert!(pair.source.info("wanted now").unwrap());
    assert_eq!(pair.received.lines(), ["wanted now"]);
}

#[test]
fn relay_reads_an_idle_target_without_resyncing_it() {
    let pair = pair(FilterSet::RELEASE);
    attach(&pair, RelayOptions::default());
    assert_eq!(pair.source.actual_filter().unwrap(), FilterSet::RELEASE);

    pair.received.set_minimal_filter(FilterSet::VERBOSE);
    assert!(pair.target.is_filter_dirty());
    assert_eq!(pair.target.bridge_target().actual_filter(), FilterSet::RELEASE);
    assert!(!pair.source.info("target has not caught up").unwrap());
    assert!(pair.target.is_filter_dirty());

    assert_eq!(pair.target.actual_filter().unwrap(), FilterSet::VERBOSE);
    assert!(pair.source.is_filter_dirty());
    assert!(pair.source.info("target caught up").unwrap());
    assert_eq!(pair.received.lines(), ["target caught up"]);
}

#[test]
fn topic_and_tags_can_be_pulled_and_pushed() {
    let pair = pair(FilterSet::UNDEFINED);
    pair.target.set_topic("remote").unwrap();
    pair.target
        .set_auto_tags(pair.target.context().tags().find_or_create("Remote"))
        .unwrap();
    pair.received.clear();

    attach(
        &pair,
        RelayOptions::default()
            .pull_topic_and_tags(true)
            .push_topic_and_tags(true),
    );
    assert_eq!(pair.source.topic(), "remote");
    assert_eq!(pair.source.auto_tags().to_string(), "Remote");
    assert!(pair.received.is_empty());

    pair.source.set_topic("local").unwrap();
    assert_eq!(pair.target.topic(), "local");
    assert_eq!(pair.received.lines(), ["Topic: local"]);

    pair.source
        .set_auto_tags(pair.source.context().tags().find_or_create("Local"))
        .unwrap();
    assert_eq!(pair.target.auto_tags().to_string(), "Local");
}

#[test]
fn relay_to_a_dropped_target_is_harmless() {
    let pair = pair(FilterSet::RELEASE);
    let relay = attach(&pair, RelayOptions::default());
    let Pair { source, target, .. } = pair;
    drop(target);

    assert!(!relay.target().is_alive());
    source.signal_change();
    assert_eq!(source.actual_filter().unwrap(), FilterSet::UNDEFINED);
    assert!(source.info("nobody listens").unwrap());
    assert_eq!(source.client_count(), 1);
}

#[test]
fn wire_line_survives_json() {
    let line = WireLine {
        tags: "Db|Sql".to_string(),
        level: Level::Error,
        filtered: true,
        text: "query failed".to_string(),
        exception: Some(ExceptionData::new("timeout", "5s elapsed")),
        time: LogTime::now(),
        file: "src/db.rs".to_string(),
        line: 42,
    };
    let json = line.to_json().unwrap();
    assert!(json.contains("\"level\":\"error\""));
    assert_eq!(WireLine::from_json(&json).unwrap(), line);
    assert!(WireLine::from_json("{\"tags\":").is_err());
}
