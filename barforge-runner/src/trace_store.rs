//! Batched trace persistence boundary.
//!
//! The engine hands over a flat, ordered list of atoms; this module
//! chunks it and commits one batch at a time. Semantics are
//! at-least-once: a failed batch aborts the write and reports how many
//! batches were already committed — committed batches are never rolled
//! back, and the simulation result stays valid regardless of the
//! outcome here.

use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use barforge_core::trace::{TraceAtom, TraceReport};

/// Errors from a single batch write.
#[derive(Debug, Error)]
pub enum TraceStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A batch write failure, with the progress made before it.
#[derive(Debug, Error)]
#[error("trace persistence failed after {committed_batches} committed batch(es): {source}")]
pub struct PersistError {
    pub committed_batches: usize,
    #[source]
    pub source: TraceStoreError,
}

/// Destination for trace batches. Each `write_batch` call is expected to
/// be atomic: either the whole batch lands or none of it does.
pub trait TraceStore {
    fn write_batch(&mut self, batch: &[TraceAtom]) -> Result<(), TraceStoreError>;
}

/// Chunk a trace report into `batch_size` batches and commit them in
/// order. Returns the number of batches written.
pub fn persist_trace(
    store: &mut dyn TraceStore,
    report: &TraceReport,
    batch_size: usize,
) -> Result<usize, PersistError> {
    let batch_size = batch_size.max(1);
    let mut committed = 0usize;
    for batch in report.atoms.chunks(batch_size) {
        store.write_batch(batch).map_err(|source| PersistError {
            committed_batches: committed,
            source,
        })?;
        committed += 1;
    }
    info!(
        atoms = report.atoms.len(),
        batches = committed,
        truncated = report.truncated,
        "trace persisted"
    );
    Ok(committed)
}

/// JSON-lines file store: one atom per line, flushed per batch.
pub struct JsonLinesTraceStore {
    writer: std::io::BufWriter<std::fs::File>,
}

impl JsonLinesTraceStore {
    pub fn create(path: &Path) -> Result<Self, TraceStoreError> {
        let file = std::fs::File::create(path)?;
        Ok(Self {
            writer: std::io::BufWriter::new(file),
        })
    }
}

impl TraceStore for JsonLinesTraceStore {
    fn write_batch(&mut self, batch: &[TraceAtom]) -> Result<(), TraceStoreError> {
        for atom in batch {
            serde_json::to_writer(&mut self.writer, atom)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryTraceStore {
    pub batches: Vec<Vec<TraceAtom>>,
}

impl TraceStore for MemoryTraceStore {
    fn write_batch(&mut self, batch: &[TraceAtom]) -> Result<(), TraceStoreError> {
        self.batches.push(batch.to_vec());
        Ok(())
    }
}
