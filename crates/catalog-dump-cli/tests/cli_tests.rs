//! CLI integration tests for catalog-dump.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes for configuration errors, and offline TOC inspection.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the catalog-dump binary.
fn cmd() -> Command {
    Command::cargo_bin("catalog-dump").unwrap()
}

const VALID_CONFIG: &str = r#"
connection:
  host: localhost
  database: warehouse
  user: gpadmin
filter:
  include_schemas: [public]
"#;

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dump"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("toc"));
}

#[test]
fn test_dump_subcommand_help() {
    cmd()
        .args(["dump", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--include-schema"))
        .stdout(predicate::str::contains("--exclude-table"))
        .stdout(predicate::str::contains("--leaf-partition-data"))
        .stdout(predicate::str::contains("--toc-file"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("catalog-dump"));
}

#[test]
fn test_global_flags_exist() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("--verbosity"));
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// =============================================================================
// Configuration Error Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_4() {
    // Missing file is an IO error, not a config error
    cmd()
        .args(["-c", "/nonexistent/config.yaml", "validate"])
        .assert()
        .code(4);
}

#[test]
fn test_invalid_yaml_exits_with_code_2() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "connection: [not, a, mapping").unwrap();

    cmd()
        .args(["-c", file.path().to_str().unwrap(), "validate"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_required_fields_exits_with_code_2() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "connection:\n  host: localhost").unwrap();

    cmd()
        .args(["-c", file.path().to_str().unwrap(), "validate"])
        .assert()
        .code(2);
}

#[test]
fn test_conflicting_filters_exit_with_code_2() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{}  exclude_schemas: [public]\n",
        VALID_CONFIG
    )
    .unwrap();

    cmd()
        .args(["-c", file.path().to_str().unwrap(), "validate"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("both included and excluded"));
}

#[test]
fn test_validate_accepts_valid_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", VALID_CONFIG).unwrap();

    cmd()
        .args(["-c", file.path().to_str().unwrap(), "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

// =============================================================================
// TOC Inspection Tests
// =============================================================================

const METADATA: &str = "CREATE TABLE public.t (\n\tid integer\n) DISTRIBUTED RANDOMLY;\n\nCREATE INDEX t_idx ON public.t USING btree(id);";

fn write_toc(dir: &tempfile::TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let metadata_path = dir.path().join("metadata.sql");
    std::fs::write(&metadata_path, METADATA).unwrap();

    let table_end = METADATA.find("\n\n").unwrap();
    let index_start = table_end + 2;
    let toc = format!(
        r#"header:
  engine_version: 6.20.0
  config_hash: abc
  metadata_file: {}
  created_at: 2024-01-01T00:00:00Z
predata_entries:
  - schema: public
    name: t
    object_type: TABLE
    start_byte: 0
    end_byte: {}
postdata_entries:
  - schema: public
    name: t_idx
    object_type: INDEX
    reference_object: public.t
    start_byte: {}
    end_byte: {}
"#,
        metadata_path.display(),
        table_end,
        index_start,
        METADATA.len()
    );
    let toc_path = dir.path().join("toc.yaml");
    std::fs::write(&toc_path, toc).unwrap();
    (toc_path, metadata_path)
}

#[test]
fn test_toc_lists_entries_in_section_order() {
    let dir = tempfile::tempdir().unwrap();
    let (toc_path, _) = write_toc(&dir);

    cmd()
        .args(["toc", "--toc-file", toc_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("predata\tTABLE\tpublic.t\t0-"))
        .stdout(predicate::str::contains("postdata\tINDEX\tpublic.t_idx\t"))
        .stdout(predicate::str::contains("\tpublic.t\n"));
}

#[test]
fn test_toc_extracts_single_object() {
    let dir = tempfile::tempdir().unwrap();
    let (toc_path, _) = write_toc(&dir);

    cmd()
        .args([
            "toc",
            "--toc-file",
            toc_path.to_str().unwrap(),
            "--object",
            "public.t_idx",
            "--object-type",
            "index",
        ])
        .assert()
        .success()
        .stdout("CREATE INDEX t_idx ON public.t USING btree(id);\n");
}

#[test]
fn test_toc_unknown_object_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (toc_path, metadata_path) = write_toc(&dir);

    cmd()
        .args([
            "toc",
            "--toc-file",
            toc_path.to_str().unwrap(),
            "--metadata-file",
            metadata_path.to_str().unwrap(),
            "--object",
            "public.missing",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found in TOC"));
}
