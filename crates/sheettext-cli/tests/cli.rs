//! Runs the built `sheettext` binary and checks stdout and exit codes.

use std::process::{Command, Output};

fn sheettext(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sheettext"))
        .args(args)
        .output()
        .expect("failed to run sheettext")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn csv_file_prints_single_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv");
    std::fs::write(&path, "a,b\n1,2\n").unwrap();

    let output = sheettext(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout_of(&output),
        "{\"sheets\": [{\"name\": \"people.csv\", \"text\": \"a,b\\n1,2\\n\"}]}\n"
    );
}

#[test]
fn nonexistent_path_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.xlsx");
    let path_str = path.to_str().unwrap();

    let output = sheettext(&[path_str]);
    assert_eq!(output.status.code(), Some(1));
    let expected = serde_json::json!({
        "error": format!("File does not exist: {path_str}"),
        "sheets": [],
    });
    let actual: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(actual, expected);
    assert!(stdout_of(&output).starts_with("{\"error\": \"File does not exist: "));
}

#[test]
fn missing_argument_exits_one() {
    let output = sheettext(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout_of(&output),
        "{\"error\": \"No workbook path provided.\", \"sheets\": []}\n"
    );
}

#[test]
fn non_ascii_is_not_escaped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("städte.csv");
    std::fs::write(&path, "Zürich,München\n").unwrap();

    let output = sheettext(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("\"name\": \"städte.csv\""));
    assert!(stdout.contains("Zürich,München"));
}

#[test]
fn unreadable_workbook_reports_error_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake.xls");
    std::fs::write(&path, b"plain text, not a workbook").unwrap();

    let output = sheettext(&[path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert!(value["error"].is_string());
    assert_eq!(value["sheets"], serde_json::json!([]));
}

#[test]
fn pretty_output_is_indented() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("p.csv");
    std::fs::write(&path, "x\n").unwrap();

    let output = sheettext(&["--pretty", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("\n  \"sheets\": ["));
}
