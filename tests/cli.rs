use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn filecache(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("filecache"));
    cmd.env_remove("FILECACHE_DIR")
        .env_remove("FILECACHE_TENANT")
        .env_remove("FILECACHE_HOST_DIR")
        .env_remove("RUST_LOG")
        .arg("--dir")
        .arg(dir);
    cmd
}

#[test]
fn set_then_get_across_processes() {
    let temp = tempdir().unwrap();

    filecache(temp.path())
        .args(["set", "greeting", "\"hello\"", "--group", "site"])
        .assert()
        .success();

    let assert = filecache(temp.path())
        .args(["get", "greeting", "missing", "--group", "site"])
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["key"], "greeting");
    assert_eq!(items[0]["found"], true);
    assert_eq!(items[0]["value"], "hello");
    assert_eq!(items[1]["key"], "missing");
    assert_eq!(items[1]["found"], false);
}

#[test]
fn raw_format_prints_bare_values() {
    let temp = tempdir().unwrap();

    filecache(temp.path())
        .args(["set", "doc", "{\"a\":1}"])
        .assert()
        .success();

    filecache(temp.path())
        .args(["--format", "raw", "get", "doc"])
        .assert()
        .success()
        .stdout(predicate::eq("{\"a\":1}\n"));
}

#[test]
fn add_on_existing_key_fails_with_exit_code() {
    let temp = tempdir().unwrap();

    filecache(temp.path())
        .args(["add", "k", "1"])
        .assert()
        .success();

    let assert = filecache(temp.path()).args(["add", "k", "2"]).assert().failure();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["op"], "add");
    assert_eq!(items[0]["ok"], false);
}

#[test]
fn counters_clamp_at_zero() {
    let temp = tempdir().unwrap();

    filecache(temp.path())
        .args(["set", "visits", "5", "-g", "stats"])
        .assert()
        .success();

    filecache(temp.path())
        .args(["--format", "raw", "incr", "visits", "-g", "stats"])
        .assert()
        .success()
        .stdout(predicate::eq("6\n"));

    filecache(temp.path())
        .args(["--format", "raw", "decr", "visits", "--by", "10", "-g", "stats"])
        .assert()
        .success()
        .stdout(predicate::eq("0\n"));
}

#[test]
fn incr_missing_key_fails() {
    let temp = tempdir().unwrap();
    filecache(temp.path())
        .args(["incr", "nope"])
        .assert()
        .failure();
}

#[test]
fn flush_empties_cache_dir() {
    let temp = tempdir().unwrap();
    let dir = temp.path().join("cache");

    filecache(&dir).args(["set", "a", "1", "-g", "one"]).assert().success();
    filecache(&dir).args(["set", "b", "2", "-g", "two"]).assert().success();

    filecache(&dir).arg("flush").assert().success();
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

    let assert = filecache(&dir).args(["get", "a", "-g", "one"]).assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["found"], false);
}

#[test]
fn stats_reports_group_census() {
    let temp = tempdir().unwrap();

    filecache(temp.path()).args(["set", "a", "1", "-g", "posts"]).assert().success();
    filecache(temp.path()).args(["set", "b", "2", "-g", "posts"]).assert().success();

    let assert = filecache(temp.path()).arg("stats").assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let groups = items[0]["data"]["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert!(groups[0]["group"].as_str().unwrap().starts_with("posts-"));
    assert_eq!(groups[0]["entries"], 2);
}

#[test]
fn enable_status_disable_roundtrip() {
    let temp = tempdir().unwrap();
    let cache = temp.path().join("cache");
    let host = temp.path().join("host");

    filecache(&cache)
        .arg("--format")
        .arg("raw")
        .arg("status")
        .arg("--host-dir")
        .arg(&host)
        .assert()
        .success()
        .stdout(predicate::eq("inactive\n"));

    filecache(&cache)
        .arg("enable")
        .arg("--host-dir")
        .arg(&host)
        .assert()
        .success();
    assert!(host.join("object-cache.json").exists());

    filecache(&cache)
        .arg("--format")
        .arg("raw")
        .arg("status")
        .arg("--host-dir")
        .arg(&host)
        .assert()
        .success()
        .stdout(predicate::eq("active\n"));

    filecache(&cache)
        .arg("disable")
        .arg("--host-dir")
        .arg(&host)
        .assert()
        .success();
    assert!(!host.join("object-cache.json").exists());
}

#[test]
fn unusable_cache_dir_is_reported() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("occupied");
    fs::write(&file, "x").unwrap();

    filecache(&file.join("cache"))
        .args(["get", "k"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open cache store"));
}

#[test]
fn enable_refuses_foreign_drop_in() {
    let temp = tempdir().unwrap();
    let cache = temp.path().join("cache");
    let host = temp.path().join("host");
    fs::create_dir_all(&host).unwrap();
    fs::write(
        host.join("object-cache.json"),
        r#"{"provider":"redis-cache","version":"2.0","base_dir":"/x","installed_at":"2024-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    let assert = filecache(&cache)
        .arg("enable")
        .arg("--host-dir")
        .arg(&host)
        .assert()
        .failure();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["kind"], "error");
    assert_eq!(items[0]["errors"][0]["code"], "ACTIVATION_FAILED");
    assert!(items[0]["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("redis-cache"));
}
