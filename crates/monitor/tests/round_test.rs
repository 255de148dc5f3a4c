//! Behaviour of a single monitoring round.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use jobwatch_core::FilterCriteria;
use jobwatch_monitor::MonitorOrchestrator;
use jobwatch_storage::{FileLinkStore, LinkStore, MemoryLinkStore};

fn criteria(excluded: &[&str]) -> FilterCriteria {
    FilterCriteria {
        excluded_titles: excluded.iter().map(|s| s.to_string()).collect(),
        ..FilterCriteria::default()
    }
}

#[tokio::test]
async fn failing_source_does_not_block_the_others() {
    let first = StubSource::new("first", vec![job("a", "Engineer")]);
    let third = StubSource::new("third", vec![job("c", "Analyst")]);
    let notifier = RecordingNotifier::new("recorder");
    let batches = notifier.handle();

    let monitor = MonitorOrchestrator::builder(settings())
        .source(first)
        .source(StubSource::failing("second"))
        .source(third)
        .notifier(notifier)
        .build(Arc::new(MemoryLinkStore::new()))
        .await;

    let report = monitor.check_and_notify().await;
    assert_eq!(report.sources_polled, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "second");

    let mut delivered = links_of(&batches).remove(0);
    delivered.sort();
    assert_eq!(delivered, ["a", "c"]);
}

#[tokio::test]
async fn failing_notifier_does_not_block_the_others() {
    let broken = RecordingNotifier::failing("broken");
    let broken_batches = broken.handle();
    let healthy = RecordingNotifier::new("healthy");
    let healthy_batches = healthy.handle();

    let monitor = MonitorOrchestrator::builder(settings())
        .source(StubSource::fresh("board"))
        .notifier(broken)
        .notifier(healthy)
        .build(Arc::new(MemoryLinkStore::new()))
        .await;

    for _ in 0..2 {
        let report = monitor.check_and_notify().await;
        assert_eq!(report.deliveries.len(), 2);
        assert_eq!(report.failed_deliveries(), 1);
    }

    let expected = vec![vec!["board-1".to_string()], vec!["board-2".to_string()]];
    assert_eq!(links_of(&healthy_batches), expected);
    assert_eq!(links_of(&broken_batches), expected);
    assert_eq!(monitor.known_links().await, 2);
}

#[tokio::test]
async fn link_is_never_notified_twice() {
    let notifier = RecordingNotifier::new("recorder");
    let batches = notifier.handle();

    let monitor = MonitorOrchestrator::builder(settings())
        .source(StubSource::new("one", vec![job("a", "Engineer"), job("b", "Analyst")]))
        .source(StubSource::new("two", vec![job("b", "Analyst")]))
        .notifier(notifier)
        .build(Arc::new(MemoryLinkStore::new()))
        .await;

    let first = monitor.check_and_notify().await;
    assert_eq!(first.recorded, 2);

    let second = monitor.check_and_notify().await;
    assert!(second.new_jobs.is_empty());
    assert!(second.deliveries.is_empty());
    assert_eq!(batches.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn excluded_titles_are_filtered_and_never_recorded() {
    let notifier = RecordingNotifier::new("recorder");
    let batches = notifier.handle();
    let store = Arc::new(MemoryLinkStore::with_links(["a".to_string()]));

    let monitor = MonitorOrchestrator::builder(settings())
        .criteria(criteria(&["senior"]))
        .source(StubSource::new(
            "board",
            vec![
                job("a", "Engineer"),
                job("b", "Engineer"),
                job("c", "Senior Engineer"),
            ],
        ))
        .notifier(notifier)
        .build(store.clone())
        .await;

    let report = monitor.check_and_notify().await;
    assert_eq!(report.fetched, 3);
    assert_eq!(links_of(&batches), vec![vec!["b".to_string()]]);

    let stored = store.snapshot();
    assert!(stored.contains("b"));
    assert!(!stored.contains("c"));
}

#[tokio::test]
async fn empty_batch_skips_notifiers_and_store() {
    let notifier = RecordingNotifier::new("recorder");
    let batches = notifier.handle();
    let store = Arc::new(FlakyStore::default());

    let monitor = MonitorOrchestrator::builder(settings())
        .source(StubSource::new("empty", Vec::new()))
        .notifier(notifier)
        .build(store.clone())
        .await;

    monitor.check_and_notify().await;
    assert!(batches.lock().unwrap().is_empty());
    assert!(store.appends.lock().unwrap().is_empty());
}

#[tokio::test]
async fn only_new_links_are_persisted() {
    let store = Arc::new(FlakyStore::default());
    store.links.lock().unwrap().insert("old".to_string());

    let monitor = MonitorOrchestrator::builder(settings())
        .source(StubSource::new(
            "board",
            vec![job("old", "Engineer"), job("new", "Engineer"), job("new", "Engineer")],
        ))
        .build(store.clone())
        .await;

    monitor.check_and_notify().await;
    assert_eq!(*store.appends.lock().unwrap(), vec![vec!["new".to_string()]]);
}

#[tokio::test]
async fn unreadable_store_starts_empty() {
    let store = Arc::new(FlakyStore {
        fail_reads: true,
        ..FlakyStore::default()
    });
    let notifier = RecordingNotifier::new("recorder");
    let batches = notifier.handle();

    let monitor = MonitorOrchestrator::builder(settings())
        .source(StubSource::new("board", vec![job("a", "Engineer")]))
        .notifier(notifier)
        .build(store)
        .await;

    assert_eq!(monitor.known_links().await, 0);
    monitor.check_and_notify().await;
    assert_eq!(links_of(&batches), vec![vec!["a".to_string()]]);
}

#[tokio::test]
async fn failed_write_still_updates_memory() {
    let store = Arc::new(FlakyStore {
        fail_writes: true,
        ..FlakyStore::default()
    });
    let notifier = RecordingNotifier::new("recorder");
    let batches = notifier.handle();

    let monitor = MonitorOrchestrator::builder(settings())
        .source(StubSource::new("board", vec![job("a", "Engineer")]))
        .notifier(notifier)
        .build(store.clone())
        .await;

    let first = monitor.check_and_notify().await;
    assert!(first.store_error.is_some());
    assert_eq!(monitor.known_links().await, 1);

    monitor.check_and_notify().await;
    assert_eq!(batches.lock().unwrap().len(), 1);
    assert!(store.links.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out_as_a_failure() {
    let mut settings = settings();
    settings.source_timeout = Duration::from_secs(5);
    let notifier = RecordingNotifier::new("recorder");
    let batches = notifier.handle();

    let monitor = MonitorOrchestrator::builder(settings)
        .source(StubSource::new("slow", vec![job("x", "Engineer")]).delayed(Duration::from_secs(60)))
        .source(StubSource::new("fast", vec![job("y", "Engineer")]))
        .notifier(notifier)
        .build(Arc::new(MemoryLinkStore::new()))
        .await;

    let report = monitor.check_and_notify().await;
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "slow");
    assert!(report.failures[0].error.contains("timed out"));
    assert_eq!(links_of(&batches), vec![vec!["y".to_string()]]);
}

#[tokio::test]
async fn senior_exclusion_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.txt");
    std::fs::write(&path, "a\n").unwrap();
    let store = Arc::new(FileLinkStore::new(path.clone()));

    let notifier = RecordingNotifier::new("recorder");
    let batches = notifier.handle();
    let monitor = MonitorOrchestrator::builder(settings())
        .criteria(criteria(&["senior"]))
        .source(StubSource::new(
            "board",
            vec![
                job("a", "Engineer"),
                job("b", "Engineer"),
                job("c", "Senior Engineer"),
            ],
        ))
        .notifier(notifier)
        .build(store.clone())
        .await;

    monitor.check_and_notify().await;
    assert_eq!(links_of(&batches), vec![vec!["b".to_string()]]);

    let persisted = store.load_all().await.unwrap();
    assert_eq!(persisted.len(), 2);
    assert!(persisted.contains("a") && persisted.contains("b"));

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "a\nb\n");
}
