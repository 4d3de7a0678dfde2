use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("m3850"))
}

fn repo_root() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn sample_dump() -> std::path::PathBuf {
    repo_root().join("tests").join("golden").join("com_dump.bin")
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("read").and(contains("decode")).and(contains("ports")));
}

#[test]
fn read_and_decode_help_work() {
    cmd().arg("read").arg("--help").assert().success();
    cmd().arg("decode").arg("--help").assert().success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.bin");

    cmd()
        .arg("decode")
        .arg(missing)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn decode_emits_text_readings_and_diagnostics() {
    cmd()
        .arg("decode")
        .arg(sample_dump())
        .assert()
        .success()
        .stdout(
            contains("DC 1.05 V")
                .and(contains("OH inf MOhm"))
                .and(contains("TM 25.4 C"))
                .and(contains("LO nan")),
        )
        .stderr(contains("synchronized after 7 bytes").and(contains("warning:")));
}

#[test]
fn decode_quiet_suppresses_diagnostics() {
    cmd()
        .arg("decode")
        .arg(sample_dump())
        .arg("--quiet")
        .assert()
        .success()
        .stderr(predicates::str::is_empty());
}

#[test]
fn decode_jsonl_distinguishes_special_values() {
    let assert = cmd()
        .arg("decode")
        .arg(sample_dump())
        .arg("--jsonl")
        .arg("--quiet")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("jsonl line"))
        .collect();
    assert_eq!(lines.len(), 4);

    assert_eq!(lines[0]["measurement"]["value"]["finite"], 1.05);
    assert_eq!(lines[1]["measurement"]["value"], "over_range");
    assert_eq!(lines[2]["issues"][0]["kind"], "missing_terminator");
    assert_eq!(lines[3]["measurement"]["value"], "unreadable");
}

#[test]
fn decode_writes_output_file() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("readings.jsonl");

    cmd()
        .arg("decode")
        .arg(sample_dump())
        .arg("--jsonl")
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(contains("OK: 4 readings written"));

    let body = std::fs::read_to_string(&output).expect("output file");
    assert_eq!(body.lines().count(), 4);
}

#[test]
fn read_rejects_nonexistent_port() {
    cmd()
        .arg("read")
        .arg("/dev/does-not-exist-m3850")
        .assert()
        .failure()
        .stderr(contains("error:"));
}
