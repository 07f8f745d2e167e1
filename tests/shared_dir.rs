//! Several stores sharing one base directory, as independent processes would.

use filecache::{CacheConfig, CacheStore, ManualClock};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

fn open(dir: &std::path::Path) -> CacheStore {
    CacheStore::open(CacheConfig::with_dir(dir)).unwrap()
}

#[test]
fn writes_are_visible_to_a_fresh_store() {
    let temp = tempdir().unwrap();
    let mut writer = open(temp.path());
    let mut reader = open(temp.path());

    assert!(writer.set("page:/about", json!({"html": "<p>hi</p>"}), "pages", 0));
    assert_eq!(
        reader.get("page:/about", "pages"),
        Some(json!({"html": "<p>hi</p>"}))
    );
}

#[test]
fn last_writer_wins() {
    let temp = tempdir().unwrap();
    let mut first = open(temp.path());
    let mut second = open(temp.path());

    first.set("k", 1, "g", 0);
    second.set("k", 2, "g", 0);

    let mut third = open(temp.path());
    assert_eq!(third.get("k", "g"), Some(json!(2)));
    // The first store still serves its own hot copy until forced
    assert_eq!(first.get("k", "g"), Some(json!(1)));
    assert_eq!(first.get_with("k", "g", true), Some(json!(2)));
}

#[test]
fn torn_write_is_discarded_as_a_miss() {
    let temp = tempdir().unwrap();
    let mut store = open(temp.path());
    store.set("k", json!({"long": "value"}), "g", 0);

    let path = store.path_for("k", "g");
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let mut other = open(temp.path());
    assert_eq!(other.get("k", "g"), None);
    assert!(!path.exists());
}

#[test]
fn expiry_is_judged_by_the_reader_clock() {
    let temp = tempdir().unwrap();
    let writer_clock = ManualClock::new(10_000);
    let mut writer = open(temp.path()).with_clock(writer_clock);
    writer.set("k", "v", "g", 30);

    let reader_clock = ManualClock::new(10_029);
    let mut reader = open(temp.path()).with_clock(reader_clock.clone());
    assert_eq!(reader.get("k", "g"), Some(json!("v")));

    reader_clock.advance(1);
    assert_eq!(reader.get("k", "g"), None);
    assert!(!writer.path_for("k", "g").exists());
}

#[test]
fn flush_from_one_store_clears_files_for_all() {
    let temp = tempdir().unwrap();
    let mut a = open(temp.path());
    let mut b = open(temp.path());

    a.set("x", 1, "g1", 0);
    b.set("y", 2, "g2", 0);

    assert!(a.flush());
    let mut fresh = open(temp.path());
    assert_eq!(fresh.get("x", "g1"), None);
    assert_eq!(fresh.get("y", "g2"), None);
}
