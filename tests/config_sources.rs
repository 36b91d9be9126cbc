use actmon::config::extract_sources;
use actmon::{Config, Error, FilterSet, LevelFilter};
use std::fs;
use tempfile::TempDir;

#[test]
fn load_with_sources_merges_topics() {
    let tmp_dir = TempDir::new().unwrap();
    let base_path = tmp_dir.path().join("base.conf");
    let child_path = tmp_dir.path().join("child.conf");

    let base_content = format!(
        r#"
source = "{}"

[general]
default_filter = "terse"

[topics.db]
filter = "release"
"#,
        child_path.display()
    );
    fs::write(&base_path, base_content).unwrap();

    fs::write(
        &child_path,
        r#"
[general]
default_filter = "off"

[topics.db]
filter = "verbose"

[topics.net]
filter = "{info,warn}"
"#,
    )
    .unwrap();

    let config = Config::load_from(&base_path).unwrap();
    assert_eq!(config.parse_default_filter(), FilterSet::TERSE);
    assert_eq!(config.topic_filter("db"), Some(FilterSet::RELEASE));
    assert_eq!(
        config.topic_filter("net"),
        Some(FilterSet::new(LevelFilter::Info, LevelFilter::Warn))
    );
    assert_eq!(config.topic_filters().len(), 2);
}

#[test]
fn relative_source_resolves_next_to_the_including_file() {
    let tmp_dir = TempDir::new().unwrap();
    let nested = tmp_dir.path().join("conf.d");
    fs::create_dir(&nested).unwrap();
    fs::write(
        tmp_dir.path().join("actmon.conf"),
        "source = \"conf.d/topics.conf\"\n",
    )
    .unwrap();
    fs::write(nested.join("topics.conf"), "[topics.ui]\nfilter = \"monitor\"\n").unwrap();

    let config = Config::load_from(&tmp_dir.path().join("actmon.conf")).unwrap();
    assert_eq!(config.topic_filter("ui"), Some(FilterSet::MONITOR));
}

#[test]
fn load_with_missing_source_is_ignored() {
    let tmp_dir = TempDir::new().unwrap();
    let base_path = tmp_dir.path().join("base.conf");

    let base_content = format!(
        r#"
source = "{}"

[topics.db]
filter = "terse"
"#,
        tmp_dir.path().join("missing.conf").display()
    );
    fs::write(&base_path, base_content).unwrap();

    let config = Config::load_from(&base_path).unwrap();
    assert_eq!(config.topic_filter("db"), Some(FilterSet::TERSE));
}

#[test]
fn load_with_cyclic_sources_errors() {
    let tmp_dir = TempDir::new().unwrap();
    let a_path = tmp_dir.path().join("a.conf");
    let b_path = tmp_dir.path().join("b.conf");

    let a_content = format!(r#"source = "{}""#, b_path.display());
    let b_content = format!(r#"source = "{}""#, a_path.display());
    fs::write(&a_path, a_content).unwrap();
    fs::write(&b_path, b_content).unwrap();

    let err = Config::load_from(&a_path).unwrap_err();
    assert!(matches!(err, Error::CyclicInclude(_)));
}

#[test]
fn missing_or_empty_file_yields_defaults() {
    let tmp_dir = TempDir::new().unwrap();
    let config = Config::load_from(&tmp_dir.path().join("nope.conf")).unwrap();
    assert_eq!(config.parse_default_filter(), FilterSet::VERBOSE);
    assert!(config.internal.enabled);
    assert_eq!(config.critical_errors.capacity, 128);
    assert!(!config.bridge.apply_target_filter);
    assert!(config.topics.is_empty());

    let empty = tmp_dir.path().join("empty.conf");
    fs::write(&empty, "").unwrap();
    let config = Config::load_from(&empty).unwrap();
    assert_eq!(config.internal.level, "warn");
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let err = Config::parse("[general\ndefault_filter = ").unwrap_err();
    assert!(matches!(err, Error::ConfigParse(_)));
}

#[test]
fn unparsable_filters_fall_back() {
    let config = Config::parse(
        r#"
[general]
default_filter = "chatty"

[topics.db]
filter = "{trace}"

[topics.quiet]
"#,
    )
    .unwrap();
    assert_eq!(config.parse_default_filter(), FilterSet::VERBOSE);
    assert_eq!(config.topic_filter("db"), Some(FilterSet::UNDEFINED));
    assert_eq!(config.topic_filter("quiet"), None);
    assert_eq!(config.topic_filter("unknown"), None);
}

#[test]
fn extract_sources_splits_includes_from_body() {
    let (sources, body) = extract_sources(
        "source = \"~/a.conf\"\n  source='b.conf'\nsourced = true\n[bridge]\nsource = \"\"\n",
    );
    assert_eq!(sources, ["~/a.conf", "b.conf"]);
    assert_eq!(body, "sourced = true\n[bridge]\n");
}

#[test]
fn bridge_and_internal_sections_parse() {
    let config = Config::parse(
        r#"
[internal]
enabled = false
level = "debug"

[critical_errors]
capacity = 4

[bridge]
apply_target_filter = true
push_topic_and_tags = true
"#,
    )
    .unwrap();
    assert!(!config.internal.enabled);
    assert_eq!(config.parse_internal_level(), actmon::internal::Level::Debug);
    assert_eq!(config.critical_errors.capacity, 4);
    assert!(config.bridge.apply_target_filter);
    assert!(!config.bridge.pull_topic_and_tags);
    assert!(config.bridge.push_topic_and_tags);
}
