use std::fs;
use std::path::Path;

use spill::{block_path, BlockReader, Stage};

/// Reads every pair out of the store's final block, in file order.
pub(crate) fn read_store(dir: &Path) -> Vec<(Vec<u8>, Vec<u8>)> {
    let path = block_path(dir, Stage::Final, 0);
    let mut reader = BlockReader::open(&path).unwrap();
    let mut pairs = Vec::new();
    while !reader.at_end() {
        let (key, value) = reader.current();
        pairs.push((key.to_vec(), value.to_vec()));
        reader.advance().unwrap();
    }
    pairs
}

/// Names of the `.data` files currently in `dir`, sorted.
pub(crate) fn data_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".data"))
        .collect();
    names.sort();
    names
}

/// Asserts `pairs` is sorted by key (unsigned lexicographic, nondecreasing).
pub(crate) fn assert_sorted(pairs: &[(Vec<u8>, Vec<u8>)]) {
    for window in pairs.windows(2) {
        assert!(
            window[0].0 <= window[1].0,
            "keys out of order: {:?} then {:?}",
            window[0].0,
            window[1].0
        );
    }
}
