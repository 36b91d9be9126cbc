//! Built-in clients: error counter, path catcher, collector.

use actmon::{
    Collector, ConclusionMode, EntryKind, ErrorCounter, ErrorCounts, FilterSet, Level,
    LevelFilter, Monitor, MonitorContext, PathCatcher,
};
use std::sync::Arc;

fn verbose_monitor() -> Monitor {
    let monitor = MonitorContext::new().create_monitor();
    monitor.set_minimal_filter(FilterSet::VERBOSE).unwrap();
    monitor
}

fn last_conclusions(collector: &Collector) -> Vec<String> {
    collector
        .entries()
        .into_iter()
        .rev()
        .find(|e| e.kind == EntryKind::CloseGroup)
        .map(|e| e.conclusions.into_iter().map(|c| c.text).collect())
        .unwrap_or_default()
}

#[test]
fn error_counter_rolls_counts_up_to_the_parent() {
    let monitor = verbose_monitor();
    let counter = Arc::new(ErrorCounter::new(ConclusionMode::None));
    monitor.register_client(counter.clone()).unwrap();

    monitor.warn("outside").unwrap();
    monitor.open_group(Level::Info, "outer").unwrap();
    monitor.error("e1").unwrap();
    monitor.open_group(Level::Warn, "inner").unwrap();
    monitor.fatal("f1").unwrap();
    assert_eq!(
        counter.current(),
        ErrorCounts {
            fatal: 1,
            error: 0,
            warn: 0
        }
    );
    monitor.close_group().unwrap();
    assert_eq!(
        counter.current(),
        ErrorCounts {
            fatal: 1,
            error: 1,
            warn: 1
        }
    );
    monitor.close_group().unwrap();
    assert_eq!(counter.root().total(), 4);
}

#[test]
fn error_counter_conclusion_modes() {
    let monitor = verbose_monitor();
    let counter = Arc::new(ErrorCounter::new(ConclusionMode::SetWhenEmpty));
    let collector = Arc::new(Collector::new(FilterSet::UNDEFINED, 100));
    monitor.register_client(counter).unwrap();
    monitor.register_bound_client(collector.clone()).unwrap();

    monitor.open_group(Level::Info, "g").unwrap();
    monitor.error("bad").unwrap();
    monitor.warn("meh").unwrap();
    monitor.warn("meh").unwrap();
    monitor.close_group().unwrap();
    assert_eq!(last_conclusions(&collector), ["1 error, 2 warnings"]);

    monitor.open_group(Level::Info, "g").unwrap();
    monitor.error("bad").unwrap();
    monitor.close_group_with("explicit").unwrap();
    assert_eq!(last_conclusions(&collector), ["explicit"]);

    let appending = verbose_monitor();
    let collector = Arc::new(Collector::new(FilterSet::UNDEFINED, 100));
    appending
        .register_client(Arc::new(ErrorCounter::new(ConclusionMode::AlwaysAppend)))
        .unwrap();
    appending.register_bound_client(collector.clone()).unwrap();
    appending.open_group(Level::Info, "g").unwrap();
    appending.error("bad").unwrap();
    appending.close_group_with("explicit").unwrap();
    assert_eq!(last_conclusions(&collector), ["explicit", "1 error"]);

    appending.open_group(Level::Info, "clean").unwrap();
    appending.close_group().unwrap();
    assert!(last_conclusions(&collector).is_empty());
}

#[test]
fn path_catcher_remembers_where_errors_happened() {
    let monitor = verbose_monitor();
    let catcher = Arc::new(PathCatcher::new());
    monitor.register_client(catcher.clone()).unwrap();

    monitor.open_group(Level::Info, "import").unwrap();
    monitor.open_group(Level::Info, "file a").unwrap();
    monitor.warn("slow").unwrap();
    monitor.close_group().unwrap();
    monitor.open_group(Level::Info, "file b").unwrap();
    monitor.error("corrupt").unwrap();
    assert_eq!(catcher.current_path(), ["import", "file b"]);
    monitor.close_group().unwrap();
    monitor.info("done").unwrap();
    monitor.close_group().unwrap();

    assert!(catcher.current_path().is_empty());
    let error = catcher.last_error().unwrap();
    assert_eq!(error.text, "corrupt");
    assert_eq!(error.path, ["import", "file b"]);
    let warn = catcher.last_warn_or_error().unwrap();
    assert_eq!(warn.text, "corrupt");
    let last = catcher.last_line().unwrap();
    assert_eq!(last.text, "done");
    assert_eq!(last.path, ["import"]);

    catcher.clear();
    assert!(catcher.last_error().is_none());
}

#[test]
fn collector_keeps_the_most_recent_entries() {
    let monitor = verbose_monitor();
    let collector = Arc::new(Collector::new(FilterSet::UNDEFINED, 3));
    monitor.register_bound_client(collector.clone()).unwrap();

    for i in 0..5 {
        monitor.info(format!("line {i}")).unwrap();
    }
    assert_eq!(collector.lines(), ["line 2", "line 3", "line 4"]);
    assert_eq!(collector.dropped(), 2);

    collector.clear();
    assert!(collector.is_empty());
    assert_eq!(collector.dropped(), 0);
}

#[test]
fn collector_filter_limits_capture_and_raises_the_monitor_floor() {
    let monitor = MonitorContext::new().create_monitor();
    monitor.set_minimal_filter(FilterSet::RELEASE).unwrap();
    let collector = Arc::new(Collector::new(FilterSet::uniform(LevelFilter::Warn), 10));
    monitor.register_bound_client(collector.clone()).unwrap();

    assert!(monitor.warn("surfaced by the collector").unwrap());
    assert!(!monitor.info("still below everyone").unwrap());

    let other = Arc::new(Collector::new(FilterSet::VERBOSE, 10));
    monitor.register_bound_client(other.clone()).unwrap();
    monitor.trace("fine detail").unwrap();

    assert_eq!(collector.lines(), ["surfaced by the collector"]);
    assert_eq!(other.lines(), ["fine detail"]);
}

#[test]
fn collector_records_depth_of_lines() {
    let monitor = verbose_monitor();
    let collector = Arc::new(Collector::new(FilterSet::UNDEFINED, 10));
    monitor.register_bound_client(collector.clone()).unwrap();

    monitor.info("top").unwrap();
    monitor
        .with_group(Level::Info, "g", |m| m.info("nested").unwrap())
        .unwrap();

    let depths: Vec<(EntryKind, usize)> = collector
        .entries()
        .into_iter()
        .map(|e| (e.kind, e.depth))
        .collect();
    assert_eq!(
        depths,
        [
            (EntryKind::Line, 0),
            (EntryKind::OpenGroup, 1),
            (EntryKind::Line, 1),
            (EntryKind::CloseGroup, 1)
        ]
    );
}
