use std::fs;
use std::path::Path;

use tempfile::tempdir;

use dump::DumpError;

use super::helpers::{assert_sorted, read_store};
use crate::DumpLoader;

/// Writes `contents` as a dump fixture and returns a command that streams
/// it, standing in for `pg_restore`.
fn fixture_command(dir: &Path, contents: &str) -> String {
    let path = dir.join("dump.out");
    fs::write(&path, contents).unwrap();
    format!("cat '{}'", path.display())
}

#[test]
fn loads_a_table_end_to_end() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("planet_nodes");
    let command = fixture_command(
        dir.path(),
        "-- preamble\n\
         COPY planet_nodes (id, lat, lon) FROM stdin;\n\
         3\t48.1\t11.5\n\
         1\t52.5\t13.4\n\
         2\t40.7\t-74.0\n\
         \\.\n",
    );

    let mut loader = DumpLoader::open_with_command(&command, "planet_nodes", &store).unwrap();
    assert_eq!(loader.column_names(), ["id", "lat", "lon"]);

    // Bridge rows to pairs: first tab-separated column is the key, the
    // whole row is the value.
    let mut row = Vec::new();
    let mut rows = 0;
    while loader.read_row(&mut row).unwrap() {
        let key_end = row.iter().position(|&b| b == b'\t').unwrap();
        let key = row[..key_end].to_vec();
        loader.put(key, row.clone()).unwrap();
        rows += 1;
    }
    assert_eq!(rows, 3);
    loader.finish().unwrap();

    let pairs = read_store(&store);
    assert_sorted(&pairs);
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[0], (b"1".to_vec(), b"1\t52.5\t13.4".to_vec()));
    assert_eq!(pairs[1], (b"2".to_vec(), b"2\t40.7\t-74.0".to_vec()));
    assert_eq!(pairs[2], (b"3".to_vec(), b"3\t48.1\t11.5".to_vec()));
}

#[test]
fn malformed_header_fails_construction_with_the_line() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("foo");
    let command = fixture_command(dir.path(), "COPY foo FROM stdin;\n");

    let err = DumpLoader::open_with_command(&command, "foo", &store).unwrap_err();
    match err.downcast_ref::<DumpError>() {
        Some(DumpError::HeaderMalformed(line)) => assert_eq!(line, "COPY foo FROM stdin;"),
        other => panic!("expected HeaderMalformed, got {other:?}"),
    }
}

#[test]
fn missing_header_fails_construction() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("t");
    let command = fixture_command(dir.path(), "-- no COPY section here\n");

    let err = DumpLoader::open_with_command(&command, "t", &store).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DumpError>(),
        Some(DumpError::HeaderMissing)
    ));
}

#[test]
fn missing_terminator_yields_rows_then_clean_end() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("t");
    let command = fixture_command(
        dir.path(),
        "COPY t (a) FROM stdin;\nrow1\nrow2\nrow3\n",
    );

    let mut loader = DumpLoader::open_with_command(&command, "t", &store).unwrap();
    let mut row = Vec::new();
    let mut rows = Vec::new();
    while loader.read_row(&mut row).unwrap() {
        rows.push(row.clone());
    }
    assert_eq!(rows, [b"row1".to_vec(), b"row2".to_vec(), b"row3".to_vec()]);
    loader.finish().unwrap();
}

#[test]
fn command_with_no_output_is_header_missing() {
    // A failing restore command surfaces as an empty stream: the shell
    // itself spawns fine, so the error is the missing header, not the pipe.
    let dir = tempdir().unwrap();
    let store = dir.path().join("t");
    let err = DumpLoader::open_with_command("true", "t", &store).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DumpError>(),
        Some(DumpError::HeaderMissing)
    ));
}
