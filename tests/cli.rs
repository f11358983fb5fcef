use std::process::Command;

#[test]
fn annotate_dry_run_reports_inputs() {
    let output = Command::new(env!("CARGO_BIN_EXE_sqlkb-annotate"))
        .args([
            "--catalog",
            "tests/fixtures/catalog.json",
            "--sql",
            "tests/fixtures/queries.sql",
            "--dry-run",
        ])
        .output()
        .expect("run sqlkb-annotate");

    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("catalog: 2 tables, 5 columns; corpus: 3 statements"),
        "unexpected stdout: {stdout}"
    );
}

#[test]
fn annotate_fails_on_missing_catalog() {
    let output = Command::new(env!("CARGO_BIN_EXE_sqlkb-annotate"))
        .args(["--catalog", "tests/fixtures/absent.json", "--dry-run"])
        .output()
        .expect("run sqlkb-annotate");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read catalog"));
}

#[test]
fn bulk_dry_run_validates_pairs() {
    let output = Command::new(env!("CARGO_BIN_EXE_sqlkb-bulk"))
        .args(["--dry-run", "tests/fixtures/example_queries.ndjson"])
        .output()
        .expect("run sqlkb-bulk");

    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("2 action/document pairs"));
}

#[test]
fn bulk_without_store_url_is_an_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_sqlkb-bulk"))
        .env_remove("SQLKB_STORE_URL")
        .arg("tests/fixtures/example_queries.ndjson")
        .output()
        .expect("run sqlkb-bulk");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--store-url"));
}
