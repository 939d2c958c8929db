//! Runs the `quill` binary on script files.

use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

fn script(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".qs").expect("Failed to create temp file");
    file.write_all(source.as_bytes())
        .expect("Failed to write script");
    file
}

fn quill(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_quill"))
        .args(args)
        .env_remove("QUILL_LOG")
        .output()
        .expect("Failed to execute quill")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_check_success() {
    let file = script("using Supremacy.Game;\ncolony.GrowthRate() > 1.5");
    let path = file.path().to_str().unwrap();
    let output = quill(&["check", path, "--param", "colony:Supremacy.Game.Colony"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output).trim(), "ok: System.Boolean");
}

#[test]
fn test_check_reports_diagnostics() {
    let file = script("using Supremacy.Game;\nusing Supremacy.Universe;\nSector");
    let path = file.path().to_str().unwrap();
    let output = quill(&["check", path]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output).trim(), "failed: 1 diagnostic(s)");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("QS0104"), "{stderr}");
}

#[test]
fn test_check_json_with_options_file() {
    let mut options = NamedTempFile::with_suffix(".json").expect("Failed to create temp file");
    options
        .write_all(br#"{"parameters": [{"name": "colony", "type": "Colony"}], "imports": ["Supremacy.Game"]}"#)
        .expect("Failed to write options");
    let file = script("colony.Tag.Size + 1");
    let output = quill(&[
        "check",
        file.path().to_str().unwrap(),
        "--options",
        options.path().to_str().unwrap(),
        "--format",
        "json",
        "--show-dispatch",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["type"], "System.Object");
    assert_eq!(json["diagnostics"].as_array().unwrap().len(), 0);
    let descriptors: Vec<&str> = json["dispatch"]
        .as_array()
        .unwrap()
        .iter()
        .map(|site| site["descriptor"].as_str().unwrap())
        .collect();
    assert_eq!(descriptors, vec!["binary(+)", "get-member(Size)"]);
}

#[test]
fn test_check_json_diagnostic_fields() {
    let file = script("1 +");
    let output = quill(&["check", file.path().to_str().unwrap(), "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let diagnostic = &json["diagnostics"][0];
    assert_eq!(diagnostic["code"], 1001);
    assert_eq!(diagnostic["severity"], "Error");
    assert_eq!(diagnostic["phase"], "Parsing");
    assert_eq!(diagnostic["span"]["start"], 3);
    assert!(json["type"].is_null());
}

#[test]
fn test_missing_file_exit_code() {
    let output = quill(&["check", "/nonexistent/script.qs"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_extensions_command() {
    let output = quill(&["extensions", "Supremacy.Game.Colony", "--import", "Supremacy.Game"]);
    assert!(output.status.success());
    assert!(
        stdout(&output).contains("Supremacy.Game.ColonyExtensions.GrowthRate(Supremacy.Game.IPopulated)"),
        "{}",
        stdout(&output)
    );

    let output = quill(&["extensions", "Supremacy.Game.Nowhere"]);
    assert_eq!(output.status.code(), Some(2));
}
