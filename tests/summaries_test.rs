use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn seed_store(home: &Path, count: usize) {
    fs::create_dir_all(home).expect("mkdir home");
    let records: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "title": format!("Page {i}"),
                "url": format!("https://example.com/{i}"),
                "text": format!("• point {i}"),
                "timestamp": 1_700_000_000_000u64 + i as u64,
            })
        })
        .collect();
    fs::write(
        home.join("sync_storage.json"),
        serde_json::to_string(&json!({"savedSummaries": records})).expect("encode"),
    )
    .expect("write store");
}

fn digest(home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("page-digest");
    cmd.current_dir(home)
        .env("DIGEST_HOME", home)
        .env("DIGEST_CONFIG_PATH", home.join("digest.toml"));
    cmd
}

#[test]
fn summaries_list_shows_most_recent_first() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("digest");
    seed_store(&home, 3);

    digest(&home)
        .args(["summaries", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("count=3"))
        .stdout(predicate::str::contains("[0] Page 0 <https://example.com/0>"));
}

#[test]
fn summaries_delete_removes_only_the_indexed_record() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("digest");
    seed_store(&home, 3);

    digest(&home)
        .args(["summaries", "delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted [1] Page 1"))
        .stdout(predicate::str::contains("remaining=2"));

    let raw = fs::read_to_string(home.join("sync_storage.json")).expect("read store");
    let store: Value = serde_json::from_str(&raw).expect("json");
    let titles: Vec<&str> = store["savedSummaries"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|r| r["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Page 0", "Page 2"]);

    let audit = fs::read_to_string(home.join("logs/audit.log")).expect("audit");
    assert!(audit.contains("removed saved summary 1"));
}

#[test]
fn summaries_delete_out_of_range_fails() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("digest");
    seed_store(&home, 1);

    digest(&home)
        .args(["summaries", "delete", "4"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("no saved summary at index 4"));
}

#[test]
fn summaries_show_prints_export_body() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("digest");
    seed_store(&home, 2);

    digest(&home)
        .args(["summaries", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Source: https://example.com/1"))
        .stdout(predicate::str::contains("• point 1"));
}
