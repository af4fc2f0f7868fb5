/// End-to-end tests for the pgsift binary.
///
/// `pg_restore` is not assumed to exist on the test machine, so the restore
/// subprocess is replaced through `PGSIFT_RESTORE_CMD` with a `cat` of a
/// fixture file. The store lands in a tempdir via the child's working
/// directory.
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

use spill::BlockReader;

/// Runs `pgsift <table>` in `workdir` with the fixture stream as its
/// restore command.
fn run_pgsift(workdir: &Path, table: &str, fixture: &str, env: &[(&str, &str)]) -> Output {
    let fixture_path = workdir.join("dump.fixture");
    fs::write(&fixture_path, fixture).unwrap();

    // The child runs inside the tempdir (the store lands in its working
    // directory), so point cargo back at this workspace explicitly.
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");

    let mut cmd = Command::new("cargo");
    cmd.arg("run")
        .arg("--manifest-path")
        .arg(&manifest)
        .args(["-p", "cli", "--quiet", "--", table])
        .current_dir(workdir)
        .env("PGSIFT_RESTORE_CMD", format!("cat '{}'", fixture_path.display()));
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to run pgsift")
}

fn read_final(dir: &Path, table: &str) -> Vec<(Vec<u8>, Vec<u8>)> {
    let path = dir.join(table).join("final_00000000.data");
    let mut reader = BlockReader::open(&path).unwrap();
    let mut pairs = Vec::new();
    while !reader.at_end() {
        let (key, value) = reader.current();
        pairs.push((key.to_vec(), value.to_vec()));
        reader.advance().unwrap();
    }
    pairs
}

#[test]
fn sorts_a_small_table_by_its_first_column() {
    let dir = tempdir().unwrap();
    let fixture = "--\n\
                   COPY fruit (name, count) FROM stdin;\n\
                   banana\t2\n\
                   apple\t1\n\
                   cherry\t3\n\
                   \\.\n";

    let output = run_pgsift(dir.path(), "fruit", fixture, &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("3 rows"));

    let pairs = read_final(dir.path(), "fruit");
    assert_eq!(
        pairs,
        vec![
            (b"apple".to_vec(), b"apple\t1".to_vec()),
            (b"banana".to_vec(), b"banana\t2".to_vec()),
            (b"cherry".to_vec(), b"cherry\t3".to_vec()),
        ]
    );
}

#[test]
fn key_column_is_selectable_by_name() {
    let dir = tempdir().unwrap();
    let fixture = "COPY fruit (name, code) FROM stdin;\n\
                   banana\t20\n\
                   apple\t30\n\
                   cherry\t10\n\
                   \\.\n";

    let output = run_pgsift(
        dir.path(),
        "fruit",
        fixture,
        &[("PGSIFT_KEY_COLUMN", "code")],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let keys: Vec<_> = read_final(dir.path(), "fruit")
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, [b"10".to_vec(), b"20".to_vec(), b"30".to_vec()]);
}

#[test]
fn unknown_key_column_fails() {
    let dir = tempdir().unwrap();
    let fixture = "COPY t (a) FROM stdin;\nx\n\\.\n";

    let output = run_pgsift(dir.path(), "t", fixture, &[("PGSIFT_KEY_COLUMN", "nope")]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no column named"));
}

#[test]
fn malformed_header_fails_with_the_offending_line() {
    let dir = tempdir().unwrap();
    let fixture = "COPY t FROM stdin;\n";

    let output = run_pgsift(dir.path(), "t", fixture, &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed COPY header"));
}

#[test]
fn empty_table_produces_an_empty_store() {
    let dir = tempdir().unwrap();
    let fixture = "COPY empty (a, b) FROM stdin;\n\\.\n";

    let output = run_pgsift(dir.path(), "empty", fixture, &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(read_final(dir.path(), "empty").is_empty());
}
