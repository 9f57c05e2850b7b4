//! Integration tests for the `emu` binary against a local fixture
//!
//! These tests verify that JSON output carries the expected envelope and data.

use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/north_atlantic.json")
}

fn emu(args: &[&str]) -> Value {
    let output = Command::new(env!("CARGO_BIN_EXE_emu"))
        .arg("--fixture")
        .arg(fixture())
        .arg("--json")
        .args(args)
        .env_remove("EMU_BUFFER_METERS")
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "emu {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(parsed["status"], "success");
    parsed["data"].clone()
}

#[test]
fn test_locate_returns_nearest_column() {
    let data = emu(&["locate", "--lon", "-40.0", "--lat", "10.0"]);

    let column = &data["column"];
    assert_eq!(column["location"]["lon"], -39.9543);
    assert_eq!(column["depth"], 4500);

    let tops: Vec<i64> = column["observations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["top_depth"].as_i64().unwrap())
        .collect();
    assert_eq!(tops, vec![1000, 200, 0]);
}

#[test]
fn test_locate_with_small_buffer_finds_nothing() {
    let data = emu(&["locate", "--lon", "-40.0", "--lat", "10.0", "--buffer-meters", "1000"]);
    assert!(data["column"].is_null());
    assert_eq!(data["buffer_meters"], 1000.0);
}

#[test]
fn test_stats_reports_global_extrema() {
    let data = emu(&["stats"]);
    assert_eq!(data["clusters"], 3);
    assert_eq!(data["loaded_now"], true);

    let temperature = data["extrema"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["property"] == "TEMPERATURE")
        .unwrap();
    assert_eq!(temperature["min"], -1.2);
    assert_eq!(temperature["max"], 29.8);
}

#[test]
fn test_depth_repeats_are_cache_hits() {
    let data = emu(&["depth", "35", "38", "5"]);

    assert_eq!(data["cache"]["misses"], 1);
    assert_eq!(data["cache"]["hits"], 1);
    assert_eq!(data["requests"][0]["layer"], "Depth = 30");
    assert_eq!(data["requests"][0]["features"], "2");
    assert_eq!(data["requests"][2]["layer"], "surface");
    assert_eq!(data["visibility"]["surface_visible"], true);
}

#[test]
fn test_profile_single_property() {
    let data = emu(&["profile", "--lon", "-39.9543", "--lat", "10.0", "--property", "silicate"]);

    assert_eq!(data["property"]["name"], "SILICATE");
    let values = data["property"]["values"].as_array().unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[2][1], 0.0);
}

#[test]
fn test_search_uses_best_candidate() {
    let data = emu(&["search", "cape", "verde"]);
    assert_eq!(data["candidate"]["label"], "Cape Verde Basin");
    assert_eq!(data["column"]["location"]["lat"], 10.0);
}

#[test]
fn test_config_file_sets_buffer() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "buffer_meters = 1500.0").unwrap();

    let data = emu(&["--config", file.path().to_str().unwrap(), "config"]);
    let row = data.as_array().unwrap().iter().find(|r| r["key"] == "buffer_meters").unwrap();
    assert_eq!(row["value"], "1500");
    assert_eq!(row["source"], "File");
}
