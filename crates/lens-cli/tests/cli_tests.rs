//! Integration tests for the lens CLI
//!
//! These tests invoke the actual lens-cli binary and verify:
//! - Exit codes (0 = success, 1 = strict/address failure, 2 = error)
//! - stdout/stderr output
//! - JSON output format
//! - Config file and flag precedence

use std::path::PathBuf;
use std::process::Command;

// ── Helpers ───────────────────────────────────────────────

fn lens_bin() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_BIN_EXE_lens-cli"));
    if !path.exists() {
        path = PathBuf::from("target/debug/lens-cli");
    }
    path
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(format!("../../tests/fixtures/{}", name))
        .to_string_lossy()
        .into_owned()
}

fn run_lens(args: &[&str]) -> std::process::Output {
    Command::new(lens_bin())
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute lens-cli")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

/// Count composite levels of a normalized JSON tree
fn nesting(value: &serde_json::Value) -> usize {
    match value["kind"].as_str() {
        Some("vec") => 1 + value["items"].as_array().unwrap().iter().map(nesting).max().unwrap_or(0),
        Some("map") => {
            1 + value["entries"]
                .as_array()
                .unwrap()
                .iter()
                .flat_map(|e| [nesting(&e["key"]), nesting(&e["value"])])
                .max()
                .unwrap_or(0)
        }
        _ => 0,
    }
}

// ── Version ───────────────────────────────────────────────

#[test]
fn test_version_command() {
    let output = run_lens(&["version"]);
    assert!(output.status.success(), "version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lens"), "should contain 'lens'");
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "should contain version");
}

#[test]
fn test_version_flag() {
    let output = run_lens(&["--version"]);
    assert!(output.status.success(), "--version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "should contain version");
}

// ── Normalize ─────────────────────────────────────────────

#[test]
fn test_normalize_primitives() {
    let output = run_lens(&["normalize", &fixture("primitives.json")]);
    assert!(output.status.success(), "normalize should exit 0");
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "vec");
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 6);
    assert_eq!(items[0], serde_json::json!({"kind": "primitive", "primitive": "bool", "value": true}));
    assert_eq!(items[1]["primitive"], "void");
    assert_eq!(items[1]["value"], serde_json::Value::Null);
    assert_eq!(items[2]["value"], 4294967295u64);
    assert_eq!(items[3]["value"], -2147483648i64);
    assert_eq!(items[4]["value"], "hello");
    assert_eq!(items[5]["primitive"], "symbol");
}

#[test]
fn test_normalize_compact_is_single_line() {
    let output = run_lens(&["normalize", "--compact", &fixture("primitives.json")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim_end().lines().count(), 1, "compact output should be one line");
    assert_eq!(stdout_json(&output)["kind"], "vec");
}

#[test]
fn test_normalize_map_keeps_order_and_composite_keys() {
    let output = run_lens(&["normalize", &fixture("map.json")]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "map");
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["key"]["value"], "name");
    assert_eq!(entries[1]["key"]["value"], "age");
    assert_eq!(entries[2]["key"]["kind"], "vec");
    assert_eq!(
        entries[2]["value"],
        serde_json::json!({"kind": "error", "type": "contract", "code": 7})
    );
}

#[test]
fn test_normalize_unsupported_variants() {
    let output = run_lens(&["normalize", &fixture("unsupported.json")]);
    assert!(output.status.success(), "unsupported values are not errors");
    let items = stdout_json(&output)["items"].as_array().unwrap().clone();
    assert_eq!(items[0]["variant"], "ScvU64");
    assert_eq!(items[0]["rawData"], "18446744073709551615");
    assert_eq!(items[1]["variant"], "ScvI32");
    assert_eq!(items[1]["rawData"], 2147483648u64);
    assert_eq!(items[2]["kind"], "unsupported");
}

#[test]
fn test_normalize_max_depth_flag() {
    let output = run_lens(&["normalize", "--max-depth", "1", &fixture("nested.json")]);
    assert!(output.status.success());
    let items = stdout_json(&output)["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 2);
    for item in &items {
        assert_eq!(item, &serde_json::json!({"kind": "truncated", "depth": 1}));
    }
}

#[test]
fn test_normalize_deep_input_bounded() {
    let output = run_lens(&["normalize", "--max-depth", "10", &fixture("deep.json")]);
    assert!(output.status.success());
    assert_eq!(nesting(&stdout_json(&output)), 10);

    let output = run_lens(&["normalize", "--unbounded", &fixture("deep.json")]);
    assert!(output.status.success());
    assert_eq!(nesting(&stdout_json(&output)), 30);
}

#[test]
fn test_normalize_very_deep_document() {
    let output = run_lens(&["normalize", "--max-depth", "20", &fixture("very-deep.json")]);
    assert!(output.status.success(), "deep input should not hit a parser limit");
    let json = stdout_json(&output);
    assert_eq!(nesting(&json), 20);

    let output = run_lens(&["summary", "--json", &fixture("very-deep.json")]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["census"]["vec"], 64);
    assert_eq!(json["census"]["truncated"], 1);
}

#[test]
fn test_normalize_depth_flags_conflict() {
    let output = run_lens(&["normalize", "--max-depth", "3", "--unbounded", &fixture("nested.json")]);
    assert_eq!(output.status.code(), Some(2), "conflicting flags should exit 2");
}

#[test]
fn test_normalize_address_flag() {
    let output = run_lens(&["normalize", &fixture("address.json")]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "unsupported");
    assert_eq!(json["variant"], "ScvAddress");

    let output = run_lens(&["normalize", "--decode-addresses", &fixture("address.json")]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "address");
    assert_eq!(json["addressType"], "contract");
}

#[test]
fn test_normalize_nonexistent_file() {
    let output = run_lens(&["normalize", "nonexistent.json"]);
    assert_eq!(output.status.code(), Some(2), "missing file should exit 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "should mention error");
}

#[test]
fn test_normalize_malformed_json() {
    let output = run_lens(&["normalize", &fixture("invalid.json")]);
    assert_eq!(output.status.code(), Some(2), "malformed JSON should exit 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("JSON"), "should name the JSON error");
}

#[test]
fn test_verbose_logs_to_stderr() {
    let output = run_lens(&["-v", "normalize", &fixture("primitives.json")]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("normalized source value"), "debug log expected on stderr");
    assert_eq!(stdout_json(&output)["kind"], "vec");
}

// ── Address ───────────────────────────────────────────────

#[test]
fn test_address_text_output() {
    let output = run_lens(&["address", &fixture("address.json")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("contract"));
    assert!(stdout.contains("CA3D5KRYM6CB7OWQ6TWYRR3Z4T7GNZLKERYNZGGA5SOAOPIFY6YQGAXE"));
}

#[test]
fn test_address_json_output() {
    let output = run_lens(&["address", "--json", &fixture("address.json")]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["addressType"], "contract");
    assert_eq!(json["value"], "CA3D5KRYM6CB7OWQ6TWYRR3Z4T7GNZLKERYNZGGA5SOAOPIFY6YQGAXE");
}

#[test]
fn test_address_rejects_other_variants() {
    let output = run_lens(&["address", &fixture("not-address.json")]);
    assert_eq!(output.status.code(), Some(1), "non-address should exit 1");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not an ScvAddress"));
}

// ── Summary ───────────────────────────────────────────────

#[test]
fn test_summary_text_output() {
    let output = run_lens(&["summary", &fixture("primitives.json")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("nodes:"));
    assert!(stdout.contains("hash:"));
}

#[test]
fn test_summary_json_output() {
    let output = run_lens(&["summary", "--json", &fixture("primitives.json")]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "vec");
    assert_eq!(json["nodes"], 7);
    assert_eq!(json["fallbacks"], 0);
    assert_eq!(json["census"]["primitive"], 6);
    assert_eq!(json["hash"].as_str().unwrap().len(), 64);
}

#[test]
fn test_summary_hash_deterministic() {
    let first = stdout_json(&run_lens(&["summary", "--json", &fixture("map.json")]));
    for _ in 0..5 {
        let again = stdout_json(&run_lens(&["summary", "--json", &fixture("map.json")]));
        assert_eq!(first["hash"], again["hash"]);
    }
}

#[test]
fn test_summary_strict_passes_clean_value() {
    let output = run_lens(&["summary", "--strict", &fixture("primitives.json")]);
    assert!(output.status.success(), "clean value should pass --strict");
}

#[test]
fn test_summary_strict_fails_on_fallbacks() {
    let output = run_lens(&["summary", "--strict", &fixture("unsupported.json")]);
    assert_eq!(output.status.code(), Some(1), "fallbacks should fail --strict");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fallback"));
}

#[test]
fn test_summary_max_depth_flag() {
    let output = run_lens(&["summary", "--json", "--max-depth", "1", &fixture("nested.json")]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["census"]["truncated"], 2);
    assert_eq!(json["census"]["vec"], 1);

    let output = run_lens(&["summary", "--json", "--unbounded", &fixture("deep.json")]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["census"]["truncated"], 0);
}

#[test]
fn test_summary_decode_addresses_flag() {
    let output = run_lens(&["summary", "--json", &fixture("address.json")]);
    let json = stdout_json(&output);
    assert_eq!(json["census"]["unsupported"], 1);
    assert_eq!(json["census"]["address"], 0);

    let output = run_lens(&["summary", "--json", "--decode-addresses", &fixture("address.json")]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "address");
    assert_eq!(json["census"]["address"], 1);
    assert_eq!(json["fallbacks"], 0);
}

#[test]
fn test_summary_depth_flags_conflict() {
    let output = run_lens(&["summary", "--max-depth", "3", "--unbounded", &fixture("nested.json")]);
    assert_eq!(output.status.code(), Some(2), "conflicting flags should exit 2");
}

// ── Config ────────────────────────────────────────────────

#[test]
fn test_config_file_sets_depth() {
    let output = run_lens(&[
        "--config",
        &fixture("shallow.toml"),
        "summary",
        "--json",
        &fixture("nested.json"),
    ]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["census"]["truncated"], 2);
    assert_eq!(json["census"]["vec"], 1);
}

#[test]
fn test_flag_overrides_config_file() {
    let output = run_lens(&[
        "normalize",
        "--config",
        &fixture("shallow.toml"),
        "--max-depth",
        "8",
        &fixture("nested.json"),
    ]);
    assert!(output.status.success());
    assert_eq!(nesting(&stdout_json(&output)), 3);
}

#[test]
fn test_conflicting_config_file() {
    let output = run_lens(&["--config", &fixture("conflicting.toml"), "normalize", &fixture("nested.json")]);
    assert_eq!(output.status.code(), Some(2), "bad config should exit 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"));
}
