use std::time::Duration;

use tempfile::tempdir;
use typeflow::config::{Config, ConfigStore, FileConfigStore};
use typeflow::history::HistoryDb;
use typeflow::session::{CompletionReason, SessionConfig, TypingSession};

fn finished_session(text: &str, typed_at: &[(usize, u64)], config: SessionConfig) -> TypingSession {
    let mut session = TypingSession::new(text, config);
    for &(len, at) in typed_at {
        session.on_input_change(&text[..len], at);
    }
    session
}

#[test]
fn completed_sessions_persist_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("history.db");

    let session = finished_session("hello", &[(1, 0), (3, 1_000), (5, 2_000)], SessionConfig::default());
    let summary = session.summary("tests", "short").unwrap();
    assert_eq!(summary.elapsed_ms, 2_000);
    assert_eq!(summary.chars_typed, 5);
    assert_eq!(summary.flow, None);

    {
        let db = HistoryDb::open(&path).unwrap();
        db.record(&summary).unwrap();
    }

    let db = HistoryDb::open(&path).unwrap();
    assert_eq!(db.count().unwrap(), 1);
    let best = db.personal_best("tests", "short").unwrap().unwrap();
    assert_eq!(best.wpm, summary.wpm);
    assert_eq!(best.completion, CompletionReason::Matched);
}

#[test]
fn unfinished_session_has_no_summary() {
    let session = finished_session("hello", &[(2, 0)], SessionConfig::default());
    assert!(session.summary("tests", "short").is_none());
}

#[test]
fn timed_out_session_exports_to_csv() {
    let mut session = TypingSession::new(
        "a long sentence that will not be finished",
        SessionConfig {
            time_limit: Some(Duration::from_secs(10)),
            track_flow: true,
            ..SessionConfig::default()
        },
    );
    session.on_input_change("a lo", 0);
    session.on_tick(10_000);

    let db = HistoryDb::open_in_memory().unwrap();
    db.record(&session.summary("tests", "long").unwrap()).unwrap();

    let mut out = Vec::new();
    let rows = db.export_csv(&mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();

    assert_eq!(rows, 1);
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("category,item,wpm,accuracy,flow"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("tests,long,"));
    assert!(row.contains("time_expired"));
}

#[test]
fn preferences_roundtrip_into_session_config() {
    let dir = tempdir().unwrap();
    let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));

    let config = Config {
        time_limit_secs: Some(60),
        track_flow: false,
        category: "rust".into(),
        item: Some("traits".into()),
        ..Config::default()
    };
    store.save(&config).unwrap();

    let loaded = store.load();
    assert_eq!(loaded, config);

    let session_config = SessionConfig::from(&loaded);
    assert_eq!(session_config.time_limit, Some(Duration::from_secs(60)));
    assert!(!session_config.track_flow);
}

#[test]
fn partial_preferences_fill_in_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "category": "python" }"#).unwrap();

    let loaded = FileConfigStore::with_path(&path).load();

    assert_eq!(loaded.category, "python");
    assert!(loaded.track_flow);
    assert!(loaded.save_history);
    assert_eq!(loaded.time_limit_secs, None);
}
