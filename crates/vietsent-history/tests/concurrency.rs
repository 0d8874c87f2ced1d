//! Concurrent access to the history repository

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use vietsent_core::Sentiment;
use vietsent_history::{HistoryConfig, HistoryRepository};

const WRITERS: usize = 8;
const APPENDS_PER_WRITER: usize = 25;

#[test]
fn test_concurrent_appends_respect_retention() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(
        HistoryRepository::open(&HistoryConfig {
            path: dir.path().join("history.sqlite3"),
            retain: 10,
        })
        .unwrap(),
    );

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let repo = repo.clone();
            thread::spawn(move || {
                let mut ids = Vec::with_capacity(APPENDS_PER_WRITER);
                for i in 0..APPENDS_PER_WRITER {
                    let record = repo
                        .append(&format!("writer {writer} #{i}"), Sentiment::Neutral, 0.5)
                        .unwrap();
                    ids.push(record.id);
                }
                ids
            })
        })
        .collect();

    let mut all_ids: Vec<i64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all_ids.sort_unstable();
    all_ids.dedup();
    assert_eq!(all_ids.len(), WRITERS * APPENDS_PER_WRITER, "ids must be unique");

    let records = repo.list_recent(100).unwrap();
    assert_eq!(records.len(), 10);

    // The survivors are exactly the ten highest ids, newest first
    let expected: Vec<i64> = all_ids.iter().rev().take(10).copied().collect();
    let actual: Vec<i64> = records.iter().map(|r| r.id).collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_readers_never_observe_more_than_retain() {
    let repo = Arc::new(HistoryRepository::open_in_memory(5).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let repo = repo.clone();
        let done = done.clone();
        thread::spawn(move || {
            for i in 0..200 {
                repo.append(&format!("{i}"), Sentiment::Positive, 0.9).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let repo = repo.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let records = repo.list_recent(50).unwrap();
                    assert!(records.len() <= 5, "observed {} records", records.len());
                    assert!(records.windows(2).all(|w| w[0].id > w[1].id));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(repo.count().unwrap(), 5);
}
