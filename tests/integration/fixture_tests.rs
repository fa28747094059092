use clap::Parser;
use dynadupe::cli::Cli;
use dynadupe::error::ExitCode;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_fixture(dir: &Path, json: &str) -> String {
    let path = dir.join("table.json");
    fs::write(&path, json).unwrap();
    path.to_str().unwrap().to_string()
}

fn cli_for(fixture: &str, attribute: &str, extra: &[&str]) -> Cli {
    let mut args = vec![
        "dynadupe",
        "local",
        "users",
        attribute,
        "--fixture",
        fixture,
        "--no-progress",
        "-q",
    ];
    args.extend_from_slice(extra);
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_fixture_run_with_duplicates_succeeds() {
    let dir = tempdir().unwrap();
    let fixture = write_fixture(
        dir.path(),
        r#"[
            {"id": "1", "email": "a@x.io"},
            {"id": "2", "email": "b@x.io"},
            {"id": "3", "email": "a@x.io"}
        ]"#,
    );

    let code = dynadupe::run_app(cli_for(&fixture, "email", &[])).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_fixture_run_without_duplicates_succeeds() {
    let dir = tempdir().unwrap();
    let fixture = write_fixture(dir.path(), r#"[{"email": "a"}, {"email": "b"}]"#);

    let code = dynadupe::run_app(cli_for(&fixture, "email", &["--output", "json"])).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_empty_fixture_succeeds() {
    let dir = tempdir().unwrap();
    let fixture = write_fixture(dir.path(), "[]");

    let code = dynadupe::run_app(cli_for(&fixture, "email", &[])).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_numeric_index_is_general_error() {
    let dir = tempdir().unwrap();
    let fixture = write_fixture(dir.path(), r#"[{"age": 3}, {"age": 3}]"#);

    let err = dynadupe::run_app(cli_for(&fixture, "age", &[])).unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("age"));
}

#[test]
fn test_missing_fixture_is_general_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.json");

    let err = dynadupe::run_app(cli_for(missing.to_str().unwrap(), "email", &[])).unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("Failed to load fixture"));
}

#[test]
fn test_malformed_fixture_is_general_error() {
    let dir = tempdir().unwrap();
    let fixture = write_fixture(dir.path(), r#"{"not": "an array"}"#);

    let err = dynadupe::run_app(cli_for(&fixture, "email", &[])).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_missing_config_file_is_general_error() {
    let dir = tempdir().unwrap();
    let fixture = write_fixture(dir.path(), "[]");
    let config = dir.path().join("absent.toml");

    let err = dynadupe::run_app(cli_for(
        &fixture,
        "email",
        &["--config", config.to_str().unwrap()],
    ))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("Failed to load configuration"));
}

fn run_to_string(cli: Cli) -> String {
    let mut out = Vec::new();
    let code = dynadupe::run_app_with_output(cli, &mut out).unwrap();
    assert_eq!(code, ExitCode::Success);
    String::from_utf8(out).unwrap()
}

const REPEATED_SCAN: &str = r#"[
    {"id": "1", "email": "x"},
    {"id": "2", "email": "y"},
    {"id": "3", "email": "x"}
]"#;

#[test]
fn test_text_run_prints_summary_line() {
    let dir = tempdir().unwrap();
    let fixture = write_fixture(dir.path(), REPEATED_SCAN);

    let stdout = run_to_string(cli_for(&fixture, "email", &[]));

    assert_eq!(stdout, "Summary: Duplicated items - 1, Total - 2\n");
}

#[test]
fn test_text_run_without_duplicates_prints_zero_summary() {
    let dir = tempdir().unwrap();
    let fixture = write_fixture(dir.path(), r#"[{"email": "a"}, {"email": "b"}]"#);

    let stdout = run_to_string(cli_for(&fixture, "email", &[]));

    assert_eq!(stdout, "Summary: Duplicated items - 0, Total - 0\n");
}

#[test]
fn test_json_run_prints_report() {
    let dir = tempdir().unwrap();
    let fixture = write_fixture(dir.path(), REPEATED_SCAN);

    let stdout = run_to_string(cli_for(&fixture, "email", &["--output", "json"]));
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(report["target"]["region"], "local");
    assert_eq!(report["target"]["table"], fixture.as_str());
    assert_eq!(report["target"]["index_attribute"], "email");
    assert_eq!(report["summary"]["duplicated_items"], 1);
    assert_eq!(report["summary"]["total"], 2);
    assert_eq!(report["summary"]["distinct_values"], 2);
    assert_eq!(report["summary"]["rows_scanned"], 3);
    assert_eq!(report["summary"]["singleton_groups"], 1);
    assert_eq!(report["summary"]["exit_code"], 0);
    assert_eq!(report["summary"]["exit_code_name"], "DD000");
}

#[test]
fn test_failed_run_prints_nothing() {
    let dir = tempdir().unwrap();
    let fixture = write_fixture(dir.path(), r#"[{"age": 3}, {"age": 3}]"#);

    let mut out = Vec::new();
    let result = dynadupe::run_app_with_output(cli_for(&fixture, "age", &[]), &mut out);

    assert!(result.is_err());
    assert!(out.is_empty());
}
