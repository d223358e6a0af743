//! Integration tests for the buffered analytics log

use std::fs;
use std::path::PathBuf;

use chrono::{Duration, TimeZone, Utc};
use mdcms::analytics::{Analytics, AnalyticsConfig, AnalyticsLogFile, FlushOutcome};
use mdcms::types::{AnalyticsLog, Visit};
use tempfile::TempDir;

fn setup_analytics() -> (TempDir, PathBuf, Analytics) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("analytics.json");
    let analytics = Analytics::open(&path, AnalyticsConfig::default()).unwrap();
    (dir, path, analytics)
}

fn human_visit(page: &str) -> Visit {
    Visit::new(page, "hash")
        .with_version("v1")
        .with_user_agent(Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0".to_string()))
}

#[test]
fn test_flush_appends_to_existing_log() {
    let (_dir, path, analytics) = setup_analytics();

    analytics.record(human_visit("/a"));
    analytics.record(human_visit("/b"));
    assert_eq!(
        analytics.flush().unwrap(),
        FlushOutcome::Flushed { written: 2, total: 2 }
    );

    analytics.record(human_visit("/c"));
    assert_eq!(
        analytics.flush().unwrap(),
        FlushOutcome::Flushed { written: 1, total: 3 }
    );

    // A fresh handle sees everything that was flushed
    let reopened = AnalyticsLogFile::new(&path).read();
    let pages: Vec<&str> = reopened.visits.iter().map(|v| v.page.as_str()).collect();
    assert_eq!(pages, vec!["/a", "/b", "/c"]);
    assert_eq!(analytics.pending(), 0);
}

#[test]
fn test_empty_flush_leaves_file_untouched() {
    let (_dir, path, analytics) = setup_analytics();

    analytics.record(human_visit("/a"));
    analytics.flush().unwrap();
    let before = fs::read(&path).unwrap();

    assert_eq!(analytics.flush().unwrap(), FlushOutcome::Skipped);

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_stats_exclude_unflushed_visits() {
    let (_dir, _path, analytics) = setup_analytics();

    analytics.record(human_visit("/a"));
    assert_eq!(analytics.compute_stats().total, 0);

    analytics.flush().unwrap();
    assert_eq!(analytics.compute_stats().total, 1);
}

#[test]
fn test_failed_flush_keeps_queue_in_order() {
    let (_dir, path, analytics) = setup_analytics();

    analytics.record(human_visit("/first"));
    analytics.flush().unwrap();

    analytics.record(human_visit("/second"));
    analytics.record(human_visit("/third"));

    // A directory in place of the temp file makes the write fail
    let temp = PathBuf::from(format!("{}.tmp", path.display()));
    fs::create_dir(&temp).unwrap();

    assert!(analytics.flush().is_err());
    assert_eq!(analytics.pending(), 2);
    assert_eq!(analytics.read_log().visits.len(), 1);

    analytics.record(human_visit("/fourth"));
    fs::remove_dir(&temp).unwrap();

    assert_eq!(
        analytics.flush().unwrap(),
        FlushOutcome::Flushed { written: 3, total: 4 }
    );
    let pages: Vec<String> = analytics
        .read_log()
        .visits
        .into_iter()
        .map(|v| v.page)
        .collect();
    assert_eq!(pages, vec!["/first", "/second", "/third", "/fourth"]);
}

#[test]
fn test_calendar_windows_are_nested() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("analytics.json");
    let now = Utc.with_ymd_and_hms(2026, 3, 20, 15, 30, 0).unwrap();

    // 150 visits spread evenly over the last 40 days
    let visits = (0..150)
        .map(|i| {
            let age = Duration::minutes(i * 40 * 24 * 60 / 150);
            human_visit(&format!("/p{}", i % 7)).stamp(now - age)
        })
        .collect();
    AnalyticsLogFile::new(&path)
        .write(&AnalyticsLog { visits })
        .unwrap();

    let analytics = Analytics::open(&path, AnalyticsConfig::default()).unwrap();
    let stats = analytics.compute_stats_at(&now);

    assert_eq!(stats.total, 150);
    assert!(stats.today > 0);
    assert!(stats.today <= stats.week);
    assert!(stats.week <= stats.month);
    assert!(stats.month < stats.total);
    assert_eq!(stats.audience.humans, 150);
}

#[test]
fn test_traffic_sources_group_by_host() {
    let (_dir, _path, analytics) = setup_analytics();

    analytics.record(human_visit("/a").with_referer(Some("https://a.com/x".to_string())));
    analytics.record(human_visit("/b").with_referer(Some("https://a.com/y?q=1".to_string())));
    analytics.record(human_visit("/c"));
    analytics.flush().unwrap();

    let stats = analytics.compute_stats();

    let sources: Vec<(&str, usize)> = stats
        .traffic_sources
        .iter()
        .map(|s| (s.source.as_str(), s.count))
        .collect();
    assert_eq!(sources, vec![("a.com", 2), ("direct", 1)]);
}

#[test]
fn test_open_recovers_from_interrupted_flush() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("analytics.json");
    let temp = dir.path().join("analytics.json.tmp");
    fs::write(&temp, "{\"visits\": [").unwrap();

    let analytics = Analytics::open(&path, AnalyticsConfig::default()).unwrap();

    assert!(!temp.exists());
    assert!(analytics.read_log().visits.is_empty());
}

#[test]
fn test_corrupt_log_is_preserved_before_overwrite() {
    let (dir, path, analytics) = setup_analytics();
    fs::write(&path, "not json").unwrap();

    assert!(analytics.read_log().visits.is_empty());

    analytics.record(human_visit("/a"));
    analytics.flush().unwrap();

    assert_eq!(analytics.read_log().visits.len(), 1);
    let backups: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(backups[0].path()).unwrap(), "not json");
}

#[tokio::test]
async fn test_shutdown_flushes_pending_visits() {
    let (_dir, _path, analytics) = setup_analytics();
    let analytics = std::sync::Arc::new(analytics);
    analytics.start_flush_task();

    analytics.record(human_visit("/a"));
    analytics.record(human_visit("/b"));

    let outcome = analytics.shutdown().await.unwrap();

    assert_eq!(outcome, FlushOutcome::Flushed { written: 2, total: 2 });
    assert_eq!(analytics.read_log().visits.len(), 2);
}

#[test]
fn test_concurrent_records_survive_flushes() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    const WRITERS: usize = 4;
    const PER_WRITER: usize = 200;

    let (_dir, _path, analytics) = setup_analytics();
    let analytics = Arc::new(analytics);
    let done = Arc::new(AtomicBool::new(false));

    let flusher = {
        let analytics = Arc::clone(&analytics);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                analytics.flush().unwrap();
            }
        })
    };

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let analytics = Arc::clone(&analytics);
            thread::spawn(move || {
                for i in 0..PER_WRITER {
                    analytics.record(human_visit(&format!("/w{}/{}", w, i)));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    flusher.join().unwrap();
    analytics.flush().unwrap();

    let visits = analytics.read_log().visits;
    assert_eq!(visits.len(), WRITERS * PER_WRITER);
    assert_eq!(analytics.pending(), 0);

    // Every writer's visits appear exactly once, in the order recorded
    for w in 0..WRITERS {
        let prefix = format!("/w{}/", w);
        let seen: Vec<usize> = visits
            .iter()
            .filter_map(|v| v.page.strip_prefix(&prefix))
            .map(|i| i.parse().unwrap())
            .collect();
        assert_eq!(seen, (0..PER_WRITER).collect::<Vec<_>>());
    }
}
