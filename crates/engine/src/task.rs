//! Worker threads of the merge tree.
//!
//! A [`Worker`] is one unit of work on its own OS thread: either *sort and
//! write* an owned in-memory batch to a stage-1 block, or *merge* the
//! outputs of a set of predecessor workers into one block. Predecessors are
//! moved into the merging thread, which joins them before opening any of
//! their files — a failed predecessor short-circuits the merge before any
//! I/O happens on its behalf.
//!
//! Failures are carried as the thread's `Result` and observed at
//! [`join`](Worker::join); a worker never brings down its own thread.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};

use spill::{block_path, BlockReader, BlockWriter, MergeIter, Stage};

/// The coordinator's in-memory buffer: pairs in `put` order.
pub(crate) type Batch = Vec<(Vec<u8>, Vec<u8>)>;

/// A spawned sort or merge task and the block file it will produce.
#[derive(Debug)]
pub(crate) struct Worker {
    path: PathBuf,
    handle: JoinHandle<Result<()>>,
}

impl Worker {
    /// Spawns a stage-1 worker that sorts `batch` and writes it to the
    /// block `(stage, block)` under `dir`.
    pub fn spawn_sort(dir: &Path, stage: Stage, block: u32, batch: Batch) -> Self {
        let path = block_path(dir, stage, block);
        tracing::debug!(%stage, block, pairs = batch.len(), "spawning sort worker");

        let out = path.clone();
        let handle = thread::spawn(move || run_sort(&out, batch));
        Self { path, handle }
    }

    /// Spawns a worker that waits for `inputs` and merges their block files
    /// into the block `(stage, block)` under `dir`.
    pub fn spawn_merge(dir: &Path, stage: Stage, block: u32, inputs: Vec<Worker>) -> Self {
        let path = block_path(dir, stage, block);
        tracing::debug!(%stage, block, inputs = inputs.len(), "spawning merge worker");

        let out = path.clone();
        let handle = thread::spawn(move || run_merge(&out, inputs));
        Self { path, handle }
    }

    /// The block file this worker produces.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits for the worker and rethrows its captured failure, if any.
    pub fn join(self) -> Result<()> {
        match self.handle.join() {
            Ok(result) => {
                result.with_context(|| format!("worker for {} failed", self.path.display()))
            }
            Err(_) => Err(anyhow!("worker thread for {} panicked", self.path.display())),
        }
    }
}

/// Stable-sorts the batch by key and streams it through a block writer.
/// Stability preserves `put` order across equal keys within the batch.
fn run_sort(out: &Path, mut batch: Batch) -> Result<()> {
    batch.sort_by(|a, b| a.0.cmp(&b.0));

    let mut writer = BlockWriter::create(out)?;
    for (key, value) in &batch {
        writer.write(key, value)?;
    }
    writer.finish()?;
    Ok(())
}

/// Joins every predecessor, then combines their files into `out`.
///
/// A single predecessor is renamed into place — no re-read, no
/// recompression. Zero predecessors produce a valid empty block (the final
/// merge of a store that never saw a `put`). Otherwise the inputs are
/// k-way merged; [`MergeIter`] deletes each input file as it is consumed.
fn run_merge(out: &Path, inputs: Vec<Worker>) -> Result<()> {
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        let file = input.path().to_path_buf();
        input.join()?;
        files.push(file);
    }

    if files.len() == 1 {
        fs::rename(&files[0], out)
            .with_context(|| format!("renaming {} to {}", files[0].display(), out.display()))?;
        return Ok(());
    }

    let mut readers = Vec::with_capacity(files.len());
    for file in &files {
        readers.push(BlockReader::open(file)?);
    }

    let mut merge = MergeIter::new(readers)?;
    let mut writer = BlockWriter::create(out)?;
    while let Some((key, value)) = merge.next_pair()? {
        writer.write(key, value)?;
    }
    writer.finish()?;
    Ok(())
}
