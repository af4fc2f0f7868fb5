use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Result};
use tracing::{debug, info, warn};

use spill::{Stage, MAX_FIELD_BYTES, RECORD_HEADER_BYTES};

use crate::task::{Batch, Worker};
use crate::{MAX_BLOCK_BYTES, STAGE_FAN_IN};

/// Write-only coordinator of the staged external merge sort.
///
/// Pairs accumulate in one in-memory batch until its byte budget is hit,
/// then the batch moves onto a sort worker as a stage-1 block. Every 16
/// stage-1 workers are handed to a stage-2 merge worker, every 16 stage-2
/// workers to a stage-3 one; [`finish`](StoreWriter::finish) merges whatever
/// remains into the single `final_00000000.data`.
///
/// One block counter is shared by all stages and bumped once per spill, so
/// block numbers are unique within a stage but not dense.
///
/// # Failure semantics
///
/// Any worker failure is fatal to the whole output and surfaces from the
/// first join that observes it — at the latest, from `finish`. Intermediate
/// files of an aborted run are left on disk; only a successful `finish`
/// means the store is valid.
#[derive(Debug)]
pub struct StoreWriter {
    dir: PathBuf,
    batch: Batch,
    batch_bytes: usize,
    max_block_bytes: usize,
    block_counter: u32,
    stage1: Vec<Worker>,
    stage2: Vec<Worker>,
    stage3: Vec<Worker>,
}

impl StoreWriter {
    /// Creates a writer producing blocks under `dir` (created if missing).
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            batch: Batch::new(),
            batch_bytes: 0,
            max_block_bytes: MAX_BLOCK_BYTES,
            block_counter: 0,
            stage1: Vec::new(),
            stage2: Vec::new(),
            stage3: Vec::new(),
        })
    }

    /// Current batch byte budget.
    #[must_use]
    pub fn block_bytes(&self) -> usize {
        self.max_block_bytes
    }

    /// Overrides the batch byte budget. Useful for testing or tuning.
    pub fn set_block_bytes(&mut self, bytes: usize) {
        self.max_block_bytes = bytes;
    }

    /// Adds one pair. Keys and values are limited to 65 535 bytes each;
    /// each pair costs `key_len + val_len + 4` bytes of the batch budget,
    /// and a pair that would overflow the budget spills the batch first.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        ensure!(
            key.len() <= MAX_FIELD_BYTES,
            "key too large: {} bytes (max {})",
            key.len(),
            MAX_FIELD_BYTES
        );
        ensure!(
            value.len() <= MAX_FIELD_BYTES,
            "value too large: {} bytes (max {})",
            value.len(),
            MAX_FIELD_BYTES
        );

        let bytes = key.len() + value.len() + RECORD_HEADER_BYTES;
        if self.batch_bytes + bytes > self.max_block_bytes {
            self.flush_block();
        }

        self.batch.push((key, value));
        self.batch_bytes += bytes;
        Ok(())
    }

    /// Moves the batch onto a stage-1 sort worker and rolls the merge tree
    /// forward: a full set of stage-1 workers becomes one stage-2 merge,
    /// a full set of stage-2 workers one stage-3 merge.
    fn flush_block(&mut self) {
        let batch = mem::take(&mut self.batch);
        debug!(
            block = self.block_counter,
            pairs = batch.len(),
            bytes = self.batch_bytes,
            "spilling batch"
        );
        self.stage1
            .push(Worker::spawn_sort(&self.dir, Stage::Part, self.block_counter, batch));

        if self.stage1.len() >= STAGE_FAN_IN {
            let inputs = mem::take(&mut self.stage1);
            self.stage2
                .push(Worker::spawn_merge(&self.dir, Stage::Part2, self.block_counter, inputs));

            if self.stage2.len() >= STAGE_FAN_IN {
                let inputs = mem::take(&mut self.stage2);
                self.stage3
                    .push(Worker::spawn_merge(&self.dir, Stage::Part3, self.block_counter, inputs));
            }
        }

        self.batch_bytes = 0;
        self.block_counter += 1;
    }

    /// Spills any buffered pairs, merges everything still outstanding into
    /// `final_00000000.data`, and rethrows the first worker failure.
    pub fn finish(mut self) -> Result<()> {
        if !self.batch.is_empty() {
            self.flush_block();
        }

        let mut inputs = mem::take(&mut self.stage1);
        inputs.append(&mut self.stage2);
        inputs.append(&mut self.stage3);

        info!(
            dir = %self.dir.display(),
            blocks = self.block_counter,
            inputs = inputs.len(),
            "running final merge"
        );
        Worker::spawn_merge(&self.dir, Stage::Final, 0, inputs).join()
    }
}

/// Best-effort teardown: joins outstanding workers so no thread outlives
/// the writer, but swallows their failures — an abandoned writer has no
/// caller left to report to. `finish` consumes the writer and empties the
/// stage lists first, so this only runs work on abort paths.
impl Drop for StoreWriter {
    fn drop(&mut self) {
        let leftover = self
            .stage1
            .drain(..)
            .chain(self.stage2.drain(..))
            .chain(self.stage3.drain(..));
        for worker in leftover {
            let path = worker.path().to_path_buf();
            if let Err(err) = worker.join() {
                warn!(block = %path.display(), "worker failed during teardown: {err:#}");
            }
        }
    }
}
