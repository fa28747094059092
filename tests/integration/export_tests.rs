use clap::Parser;
use dynadupe::accessor::MemoryTable;
use dynadupe::cli::Cli;
use dynadupe::duplicates::DuplicateFinder;
use dynadupe::error::ExitCode;
use dynadupe::output::CsvExport;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_export_sink_writes_one_row_per_duplicate_record() {
    let table = MemoryTable::from_values("email", &["A", "A", "B", "B", "B", "C"]);
    let mut export = CsvExport::from_writer(Vec::new());

    let summary = DuplicateFinder::with_defaults(&table)
        .find_duplicates_with_sink("email", &mut export)
        .unwrap();
    assert_eq!(export.groups_written(), 2);

    let csv = String::from_utf8(export.into_inner().unwrap()).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).collect();

    assert_eq!(rows.len() as u64, summary.statistic.total());
    assert!(rows.iter().all(|r| !r.contains(",C,")));
}

#[test]
fn test_run_app_writes_export_file() {
    let dir = tempdir().unwrap();
    let fixture = dir.path().join("orders.json");
    fs::write(
        &fixture,
        r#"[
            {"id": "o-1", "sku": "red"},
            {"id": "o-2", "sku": "blue"},
            {"id": "o-3", "sku": "red"},
            {"id": "o-4"}
        ]"#,
    )
    .unwrap();
    let export = dir.path().join("dupes.csv");

    let cli = Cli::try_parse_from([
        "dynadupe",
        "local",
        "orders",
        "sku",
        "--fixture",
        fixture.to_str().unwrap(),
        "--export",
        export.to_str().unwrap(),
        "--no-progress",
        "-q",
    ])
    .unwrap();
    let code = dynadupe::run_app(cli).unwrap();
    assert_eq!(code, ExitCode::Success);

    let mut reader = csv::Reader::from_path(&export).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["group_id", "index_value", "position", "record"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    for (idx, row) in rows.iter().enumerate() {
        assert_eq!(&row[0], "1");
        assert_eq!(&row[1], "red");
        assert_eq!(row[2].parse::<usize>().unwrap(), idx + 1);
        let record: serde_json::Value = serde_json::from_str(&row[3]).unwrap();
        assert_eq!(record["sku"], "red");
    }
}

#[test]
fn test_run_app_export_into_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let fixture = dir.path().join("t.json");
    fs::write(&fixture, "[]").unwrap();
    let export = dir.path().join("no-such-dir").join("out.csv");

    let cli = Cli::try_parse_from([
        "dynadupe",
        "local",
        "t",
        "k",
        "--fixture",
        fixture.to_str().unwrap(),
        "--export",
        export.to_str().unwrap(),
        "--no-progress",
        "-q",
    ])
    .unwrap();

    let err = dynadupe::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("Failed to create export file"));
}
