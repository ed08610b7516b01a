use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE: &str = "【菜鸟驿站】您的取件码为AB-1234，请到沃尔玛超市东门取件";

const RULE_BOOK: &str = r#"{
    "version": "2024-05-01 10:00:00",
    "rules": [
        {"name": "hive", "tagPrefix": "【", "tagSuffix": "】", "codePrefix": "码为", "codeSuffix": "，"},
        {"name": "lockers", "kind": "regex", "codePattern": "柜号(\\d+)", "enabled": false}
    ],
    "keywords": [
        {"keyword": "丰巢", "type": "sender"}
    ]
}"#;

fn pickup() -> Command {
    Command::cargo_bin("pickup").unwrap()
}

fn write_book(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("rules_data.json");
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn test_parse_builtin_json() {
    pickup()
        .args(["parse", SAMPLE])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""code": "AB-1234""#))
        .stdout(predicate::str::contains(r#""station": "菜鸟驿站""#))
        .stdout(predicate::str::contains(r#""source": "builtin""#));
}

#[test]
fn test_parse_from_stdin_as_text() {
    pickup()
        .args(["parse", "--format", "text"])
        .write_stdin("取件码 8-2-1031")
        .assert()
        .success()
        .stdout(predicate::str::contains("Code:    8-2-1031"));
}

#[test]
fn test_parse_csv() {
    pickup()
        .args(["parse", "--format", "csv", SAMPLE])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("code,station,address,source"))
        .stdout(predicate::str::contains("AB-1234,菜鸟驿站,沃尔玛超市东门,builtin"));
}

#[test]
fn test_parse_explain_lists_patterns() {
    pickup()
        .args(["parse", "--explain", "取件码：123456，凭 AB12 到店取件"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pickup_code_label"))
        .stdout(predicate::str::contains("present_code_phrase"));
}

#[test]
fn test_parse_with_rules() {
    let dir = TempDir::new().unwrap();
    let book = write_book(&dir, RULE_BOOK);

    pickup()
        .args(["parse", "--rules", &book, SAMPLE])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""rule": "hive""#))
        .stdout(predicate::str::contains(r#""code": "AB-1234""#));
}

#[test]
fn test_parse_rules_only_without_match() {
    let dir = TempDir::new().unwrap();
    let book = write_book(&dir, RULE_BOOK);

    pickup()
        .args(["parse", "--rules", &book, "--rules-only", "取件码 A123"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""source": "none""#));
}

#[test]
fn test_parse_missing_input_file() {
    pickup()
        .args(["parse", "--input", "/nonexistent/message.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_rules_check_reports_bad_rules() {
    let dir = TempDir::new().unwrap();
    let book = write_book(
        &dir,
        r#"{"rules": [{"name": "ok"}, {"name": "bad", "kind": "regex", "codePattern": "(("}]}"#,
    );

    pickup()
        .args(["rules", "check", "--rules", &book])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rule `bad`"));
}

#[test]
fn test_rules_check_valid_book() {
    let dir = TempDir::new().unwrap();
    let book = write_book(&dir, RULE_BOOK);

    pickup()
        .args(["rules", "check", "--rules", &book])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rules"));
}

#[test]
fn test_rules_list() {
    let dir = TempDir::new().unwrap();
    let book = write_book(&dir, RULE_BOOK);

    pickup()
        .args(["rules", "list", "--rules", &book])
        .assert()
        .success()
        .stdout(predicate::str::contains("hive"))
        .stdout(predicate::str::contains("regex /柜号(\\d+)/"))
        .stdout(predicate::str::contains("(whole text)"));
}

#[test]
fn test_rules_test_named_rule() {
    let dir = TempDir::new().unwrap();
    let book = write_book(&dir, RULE_BOOK);

    pickup()
        .args(["rules", "test", "--rules", &book, "--name", "lockers", "请到柜号42取件"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""extracted": "42""#))
        .stdout(predicate::str::contains(r#""enabled": false"#));

    pickup()
        .args(["rules", "test", "--rules", &book, "--name", "nope", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Rule not found"));
}

#[test]
fn test_keywords_match_with_sender() {
    let dir = TempDir::new().unwrap();
    let book = write_book(&dir, RULE_BOOK);

    pickup()
        .args(["keywords", "match", "--rules", &book, "--sender", "丰巢智能柜", "您的退款已完成"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom_sender"))
        .stdout(predicate::str::contains("completed_status"));
}

#[test]
fn test_keywords_list_unknown_category() {
    pickup()
        .args(["keywords", "list", "--category", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown keyword category"));
}

#[test]
fn test_batch_writes_json_lines_and_summary() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), format!("{}\n\n取件码 A123\n", SAMPLE)).unwrap();
    fs::write(dir.path().join("b.txt"), "明天见\n").unwrap();
    let summary = dir.path().join("summary.csv");
    let pattern = dir.path().join("*.txt").display().to_string();

    let output = pickup()
        .args(["batch", &pattern, "--summary"])
        .arg(&summary)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains(r#""code":"AB-1234""#));
    assert!(lines[1].contains(r#""line":3"#));

    let summary = fs::read_to_string(summary).unwrap();
    assert!(summary.contains("a.txt,success,2,2,1,1"));
    assert!(summary.contains("b.txt,success,1,0,0,0"));
}

#[test]
fn test_batch_no_matching_files() {
    let dir = TempDir::new().unwrap();
    let pattern = dir.path().join("*.txt").display().to_string();

    pickup()
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn test_config_init_set_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json").display().to_string();

    pickup()
        .args(["--config", &config, "config", "init"])
        .assert()
        .success();

    pickup()
        .args(["--config", &config, "config", "set", "extraction.min_address_chars", "4"])
        .assert()
        .success();

    pickup()
        .args(["--config", &config, "config", "get", "extraction.min_address_chars"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4"));

    pickup()
        .args(["--config", &config, "config", "set", "extraction.min_address_chars", "1"])
        .assert()
        .failure();

    pickup()
        .args(["--config", &config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_drives_parse() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    fs::write(
        &config,
        r#"{"extraction": {"unknown_address": "unknown"}, "output": {"pretty_json": false}}"#,
    )
    .unwrap();

    pickup()
        .args(["--config", &config.display().to_string(), "parse", "取件码 A123 地址：请您及时取件"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""address":"unknown""#));
}
