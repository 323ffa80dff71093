//! Integration tests for the logger hierarchy
//!
//! These tests verify:
//! - Parent links under every creation order
//! - Level inheritance and additivity
//! - Pattern layout padding and truncation
//! - Date-based rollover and retention
//! - Configuration from key/value pairs

use chrono::{DateTime, Duration, Local, TimeZone};
use rust_logger_hierarchy::appenders::{
    DailyRollingFileAppender, FileAppender, ForwardingAppender, ManualClock, RollingPolicy,
    SharedBuffer, WriterAppender,
};
use rust_logger_hierarchy::config::Configurator;
use rust_logger_hierarchy::core::{
    AppenderHandle, AppenderRef, FallbackErrorHandler, Hierarchy, LogEvent, LogLevel, Logger, Mdc,
    Ndc, ROOT_LOGGER_NAME,
};
use rust_logger_hierarchy::layout::{PatternLayout, LINE_SEPARATOR};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(y, mo, d, h, mi, s)
        .earliest()
        .expect("valid local time")
}

fn parent_name(logger: &Logger) -> String {
    logger
        .parent()
        .map(|p| p.name().to_string())
        .unwrap_or_default()
}

fn capture(hierarchy: &Hierarchy, pattern: &str) -> SharedBuffer {
    let (writer, out) = WriterAppender::shared_buffer();
    hierarchy
        .root_logger()
        .add_appender(AppenderHandle::with_layout("capture", writer, PatternLayout::new(pattern)));
    out
}

fn render(pattern: &str, logger_name: &str, message: &str) -> String {
    PatternLayout::new(pattern).format(&LogEvent::new(logger_name, LogLevel::Info, message))
}

fn dated_files(dir: &Path, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(prefix) && name != prefix)
        .collect();
    names.sort();
    names
}

#[test]
fn test_parent_links_for_every_creation_order() {
    let names = ["x", "x.y", "x.y.z"];
    let orders = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for order in orders {
        let hierarchy = Hierarchy::new();
        for index in order {
            hierarchy.get_logger(names[index]);
        }
        let x = hierarchy.get_logger("x");
        let xy = hierarchy.get_logger("x.y");
        let xyz = hierarchy.get_logger("x.y.z");

        assert_eq!(parent_name(&xyz), "x.y", "order {:?}", order);
        assert_eq!(parent_name(&xy), "x", "order {:?}", order);
        assert_eq!(parent_name(&x), ROOT_LOGGER_NAME, "order {:?}", order);
    }
}

#[test]
fn test_late_intermediate_ancestor() {
    let hierarchy = Hierarchy::new();
    let xyz = hierarchy.get_logger("x.y.z");
    assert_eq!(parent_name(&xyz), ROOT_LOGGER_NAME);

    // "x" is the nearest existing ancestor until "x.y" appears
    let x = hierarchy.get_logger("x");
    assert_eq!(parent_name(&xyz), "x");
    assert_eq!(parent_name(&x), ROOT_LOGGER_NAME);

    let xy = hierarchy.get_logger("x.y");
    assert_eq!(parent_name(&xyz), "x.y");
    assert_eq!(parent_name(&xy), "x");
}

#[test]
fn test_sibling_prefix_is_not_an_ancestor() {
    let hierarchy = Hierarchy::new();
    let deep = hierarchy.get_logger("net.server.http");
    hierarchy.get_logger("net.serv");
    assert_eq!(parent_name(&deep), ROOT_LOGGER_NAME);

    hierarchy.get_logger("net");
    assert_eq!(parent_name(&deep), "net");
    assert_eq!(parent_name(&hierarchy.get_logger("net.serv")), "net");
}

#[test]
fn test_effective_level_follows_ancestor_changes() {
    let hierarchy = Hierarchy::new();
    let leaf = hierarchy.get_logger("a.b.c.d");
    let a = hierarchy.get_logger("a");
    let ab = hierarchy.get_logger("a.b");

    assert_eq!(leaf.effective_level(), LogLevel::Debug);

    a.set_level(Some(LogLevel::Error));
    assert_eq!(leaf.effective_level(), LogLevel::Error);

    ab.set_level(Some(LogLevel::Info));
    assert_eq!(leaf.effective_level(), LogLevel::Info);
    assert!(!leaf.is_enabled_for(LogLevel::Debug));

    ab.set_level(None);
    assert_eq!(leaf.effective_level(), LogLevel::Error);

    hierarchy.root_logger().set_level(Some(LogLevel::Trace));
    a.set_level(None);
    assert_eq!(leaf.effective_level(), LogLevel::Trace);
}

#[test]
fn test_events_reach_ancestors_until_additivity_stops() {
    let hierarchy = Hierarchy::new();
    let root_out = capture(&hierarchy, "root:%c:%m;");

    let (writer, mid_out) = WriterAppender::shared_buffer();
    let mid = hierarchy.get_logger("svc.db");
    mid.add_appender(AppenderHandle::with_layout("mid", writer, PatternLayout::new("mid:%m;")));

    let leaf = hierarchy.get_logger("svc.db.pool");
    leaf.info("one");
    mid.set_additivity(false);
    leaf.info("two");

    assert_eq!(mid_out.contents(), "mid:one;mid:two;");
    assert_eq!(root_out.contents(), "root:svc.db.pool:one;");
}

#[test]
fn test_padding_and_truncation_pattern() {
    assert_eq!(
        render("%-10.5c - %m%n", "a.b.verylongname", "hi"),
        format!("gname      - hi{}", LINE_SEPARATOR)
    );
    assert_eq!(render("%10c|", "short", ""), "     short|");
    assert_eq!(render("%-3c|", "abcdef", ""), "abcdef|");
}

#[test]
fn test_logger_name_precision() {
    assert_eq!(render("%c{2}", "a.b.c.d", ""), "c.d");
    assert_eq!(render("%c{2}", "a", ""), "a");
    assert_eq!(render("%c{1}", "a.b.c.d", ""), "d");
}

#[test]
fn test_context_conversions() {
    Mdc::clear();
    Ndc::clear();
    Mdc::put("user", "alice");
    Mdc::put("id", 7i64);
    Ndc::push("req-9");

    assert_eq!(render("%X{user}|%X{missing}|", "c", ""), "alice||");
    assert_eq!(render("%X", "c", ""), "{{id,7}{user,alice}}");
    assert_eq!(render("[%x] %%", "c", ""), "[req-9] %");

    Mdc::clear();
    Ndc::clear();
}

#[test]
fn test_midnight_rollover() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("app.log");
    let clock = ManualClock::new(local(2024, 3, 1, 23, 59, 59));

    let appender =
        DailyRollingFileAppender::with_policy_and_clock(&path, RollingPolicy::default(), clock.clone())
            .expect("Failed to create appender");
    let handle = AppenderHandle::with_layout("daily", appender, PatternLayout::new("%m\n"));

    handle.do_append(&LogEvent::new("r", LogLevel::Info, "before midnight"));
    assert!(dated_files(dir.path(), "app.log").is_empty());

    clock.set(local(2024, 3, 2, 0, 0, 1));
    handle.do_append(&LogEvent::new("r", LogLevel::Info, "after midnight"));
    clock.advance(Duration::seconds(30));
    handle.do_append(&LogEvent::new("r", LogLevel::Info, "still the same day"));
    handle.close();

    assert_eq!(dated_files(dir.path(), "app.log"), vec!["app.log.2024-03-01"]);
    assert_eq!(
        fs::read_to_string(dir.path().join("app.log.2024-03-01")).unwrap(),
        "before midnight\n"
    );
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "after midnight\nstill the same day\n"
    );
}

#[test]
fn test_retention_keeps_newest_and_unparsable() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("app.log");
    fs::write(dir.path().join("app.log.2024-02-28"), "oldest").unwrap();
    fs::write(dir.path().join("app.log.2024-02-29"), "older").unwrap();
    fs::write(dir.path().join("app.log.old"), "not a date").unwrap();
    fs::write(dir.path().join("app.log.2024-13-45"), "not a date either").unwrap();

    let clock = ManualClock::new(local(2024, 3, 1, 12, 0, 0));
    let policy = RollingPolicy::new().with_max_backup_count(2);
    let appender = DailyRollingFileAppender::with_policy_and_clock(&path, policy, clock.clone())
        .expect("Failed to create appender");
    let handle = AppenderHandle::with_layout("daily", appender, PatternLayout::new("%m\n"));

    handle.do_append(&LogEvent::new("r", LogLevel::Info, "march first"));
    clock.set(local(2024, 3, 2, 9, 0, 0));
    handle.do_append(&LogEvent::new("r", LogLevel::Info, "march second"));
    handle.close();

    assert_eq!(
        dated_files(dir.path(), "app.log"),
        vec![
            "app.log.2024-02-29",
            "app.log.2024-03-01",
            "app.log.2024-13-45",
            "app.log.old"
        ]
    );
}

#[test]
fn test_idle_period_rolls_once() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("idle.log");
    let clock = ManualClock::new(local(2024, 3, 1, 8, 0, 0));
    let appender =
        DailyRollingFileAppender::with_policy_and_clock(&path, RollingPolicy::default(), clock.clone())
            .unwrap();
    let handle = AppenderHandle::with_layout("idle", appender, PatternLayout::new("%m\n"));

    handle.do_append(&LogEvent::new("r", LogLevel::Info, "first"));
    clock.set(local(2024, 3, 5, 8, 0, 0));
    handle.do_append(&LogEvent::new("r", LogLevel::Info, "days later"));
    handle.close();

    assert_eq!(dated_files(dir.path(), "idle.log"), vec!["idle.log.2024-03-01"]);
    assert_eq!(fs::read_to_string(&path).unwrap(), "days later\n");
}

#[test]
fn test_rolling_policy_from_json() {
    let json = r#"{
        "date_pattern": "'.'yyyy-MM-dd-HH",
        "max_backup_count": 12,
        "first_day_of_week": "Sun",
        "append": false,
        "immediate_flush": true,
        "buffered_io": false
    }"#;
    let policy: RollingPolicy = serde_json::from_str(json).expect("valid policy");
    assert_eq!(
        policy,
        RollingPolicy::new()
            .with_date_pattern("'.'yyyy-MM-dd-HH")
            .with_max_backup_count(12)
            .with_first_day_of_week(chrono::Weekday::Sun)
            .with_append(false)
    );
}

#[test]
fn test_configured_appender_is_shared() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let file = dir.path().join("shared.log");
    let hierarchy = Hierarchy::new();
    let configurator = Configurator::new(hierarchy.clone());

    configurator.configure([
        ("rootLogger", "INFO, A".to_string()),
        ("logger.app.db", "DEBUG, A".to_string()),
        ("additivity.app.db", "false".to_string()),
        ("appender.A", "FileAppender".to_string()),
        ("appender.A.File", file.display().to_string()),
        ("appender.A.layout", "PatternLayout".to_string()),
        ("appender.A.layout.ConversionPattern", "%p %c - %m%n".to_string()),
    ]);

    let root_appender = hierarchy.root_logger().appender("A").expect("root has A");
    let db = hierarchy.get_logger("app.db");
    let db_appender = db.appender("A").expect("app.db has A");
    assert!(Arc::ptr_eq(&root_appender, &db_appender));
    assert_eq!(db.level(), Some(LogLevel::Debug));
    assert!(!db.additivity());

    db.debug("query");
    hierarchy.get_logger("app").debug("hidden");
    hierarchy.get_logger("app").info("shown");
    hierarchy.shutdown();

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "DEBUG app.db - query\nINFO app - shown\n"
    );
}

#[test]
fn test_reconfiguring_closes_replaced_appenders() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let file = dir.path().join("re.log").display().to_string();
    let hierarchy = Hierarchy::new();
    let configurator = Configurator::new(hierarchy.clone());
    let settings = |loggers: &[(&'static str, &'static str)]| {
        let mut pairs: Vec<(&str, String)> = vec![
            ("appender.F", "FileAppender".to_string()),
            ("appender.F.File", file.clone()),
            ("appender.F.layout", "SimpleLayout".to_string()),
        ];
        pairs.extend(loggers.iter().map(|(k, v)| (*k, v.to_string())));
        pairs
    };

    configurator.configure(settings(&[("rootLogger", "INFO, F"), ("logger.keep", "INFO, F")]));
    let first = hierarchy.root_logger().appender("F").expect("root has F");

    configurator.configure(settings(&[("rootLogger", "INFO, F")]));
    let second = hierarchy.root_logger().appender("F").expect("root has F");
    assert!(!Arc::ptr_eq(&first, &second));
    // "keep" still holds the first appender
    assert!(!first.is_closed());

    configurator.configure(settings(&[("logger.keep", "INFO, F")]));
    assert!(first.is_closed());
    assert!(!second.is_closed());
    hierarchy.shutdown();
}

#[test]
fn test_registered_appender_is_reused() {
    let hierarchy = Hierarchy::new();
    let mut configurator = Configurator::new(hierarchy.clone());
    let (writer, out) = WriterAppender::shared_buffer();
    let first = configurator.register_appender("mem", AppenderHandle::new("mem", writer));
    let (other, _) = WriterAppender::shared_buffer();
    let second = configurator.register_appender("mem", AppenderHandle::new("mem", other));
    assert!(Arc::ptr_eq(&first, &second));

    configurator.register_layout_pattern("mem", "%c:%m;").unwrap();
    configurator.configure_root("WARN", &["mem"]);
    configurator.configure_logger("jobs", "INFO", &["mem"], false);
    configurator.configure_logger("jobs.nightly", "INHERITED", &["mem", "unknown"], true);

    let nightly = hierarchy.get_logger("jobs.nightly");
    assert_eq!(nightly.appenders().len(), 1);
    assert_eq!(nightly.effective_level(), LogLevel::Info);

    nightly.info("ran");
    // additive into "jobs" (same appender again) but not into the root
    assert_eq!(out.contents(), "jobs.nightly:ran;jobs.nightly:ran;");
}

#[test]
fn test_configure_rolling_appender_with_filters_and_fallback() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let base = dir.path().join("roll.log");
    let hierarchy = Hierarchy::new();
    let mut configurator = Configurator::new(hierarchy.clone());

    let (writer, backup_out) = WriterAppender::shared_buffer();
    configurator.register_appender(
        "backup",
        AppenderHandle::with_layout("backup", writer, PatternLayout::new("%m;")),
    );

    std::env::set_var("ROLL_TEST_DIR", dir.path());
    configurator.configure([
        ("logdir", "${ROLL_TEST_DIR}"),
        ("threshold", "ALL"),
        ("rootLogger", "TRACE, R"),
        ("appender.R", "org.example.DailyRollingFileAppender"),
        ("appender.R.file", "${logdir}/roll.log"),
        ("appender.R.datePattern", "'.'yyyy-MM-dd-HH"),
        ("appender.R.maxBackupIndex", "5"),
        ("appender.R.threshold", "DEBUG"),
        ("appender.R.layout", "PatternLayout"),
        ("appender.R.layout.conversionPattern", "%-5p %m%n"),
        ("appender.R.filter.a", "StringMatchFilter"),
        ("appender.R.filter.a.stringToMatch", "secret"),
        ("appender.R.filter.a.acceptOnMatch", "false"),
        ("appender.R.filter.b", "LevelRangeFilter"),
        ("appender.R.filter.b.levelMax", "ERROR"),
        ("appender.R.errorhandler", "FallbackErrorHandler"),
        ("appender.R.errorhandler.appender-ref", "backup"),
    ]);

    let logger = hierarchy.get_logger("roll");
    logger.trace("below appender threshold");
    logger.debug("kept");
    logger.info("contains secret");
    logger.fatal("above range");
    logger.error("kept too");
    hierarchy.shutdown();

    assert_eq!(
        fs::read_to_string(&base).unwrap(),
        "DEBUG kept\nERROR kept too\n"
    );
    assert!(backup_out.is_empty());
}

#[test]
fn test_fallback_receives_events_for_missing_layout() {
    let hierarchy = Hierarchy::new();
    let (primary, primary_out) = WriterAppender::shared_buffer();
    let (backup, backup_out) = WriterAppender::shared_buffer();

    let backup = AppenderHandle::with_layout("backup", backup, PatternLayout::new("backup:%m;"));
    let primary = AppenderHandle::new("primary", primary);
    primary.set_error_handler(Box::new(FallbackErrorHandler::with_backup(backup)));
    hierarchy.root_logger().add_appender(primary);

    hierarchy.get_logger("fb").error("rescued");
    assert!(primary_out.is_empty());
    assert_eq!(backup_out.contents(), "backup:rescued;");
}

#[test]
fn test_shutdown_closes_everything() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let hierarchy = Hierarchy::new();

    let file: AppenderRef = AppenderHandle::with_layout(
        "file",
        FileAppender::new(dir.path().join("a.log")).unwrap(),
        PatternLayout::new("%m\n"),
    );
    let (writer, _) = WriterAppender::shared_buffer();
    let nested = AppenderHandle::with_layout("nested", writer, PatternLayout::new("%m"));
    let forwarding = AppenderHandle::new("fwd", ForwardingAppender::new().with_appender(nested.clone()));

    hierarchy.root_logger().add_appender(file.clone());
    hierarchy.get_logger("a.b").add_appender(forwarding.clone());
    hierarchy.get_logger("a.b").info("written");

    hierarchy.shutdown();

    assert!(file.is_closed());
    assert!(forwarding.is_closed());
    assert!(nested.is_closed());
    assert!(hierarchy.root_logger().appenders().is_empty());
    assert!(hierarchy.get_logger("a.b").appenders().is_empty());
    assert_eq!(fs::read_to_string(dir.path().join("a.log")).unwrap(), "written\n");
}

#[test]
fn test_reset_by_configuration() {
    let hierarchy = Hierarchy::new();
    let configurator = Configurator::new(hierarchy.clone());
    let logger = hierarchy.get_logger("r.s");
    logger.set_level(Some(LogLevel::Fatal));
    hierarchy.set_threshold(LogLevel::Off);

    configurator.configure([("reset", "true")]);

    assert_eq!(logger.level(), None);
    assert_eq!(hierarchy.threshold(), LogLevel::All);
}
