//! Narrow contract between the batch loader and the document store.
//!
//! The loader needs exactly one operation: an unordered bulk insert that
//! reports how many documents landed and how many were rejected as
//! duplicates of already-stored ids. Transient failures are distinguished
//! from everything else so the loader can retry them; nothing else about
//! the store leaks through this seam.

mod mongo;

pub use mongo::MongoMeasurementStore;

use thiserror::Error;

use crate::document::Measurement;

/// Result of one unordered bulk insert.
///
/// A bulk write in which some documents are rejected as duplicates is a
/// successful partial outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkInsertOutcome {
    /// Documents submitted.
    pub attempted: usize,
    /// Documents newly inserted.
    pub inserted: usize,
    /// Documents rejected because their id already exists.
    pub duplicates: usize,
}

/// Store failures as the loader sees them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Expected to be retry-recoverable (lost connection, timeout).
    #[error("transient store failure: {0}")]
    Transient(String),

    /// Anything unclassified; the affected chunk is abandoned, not retried.
    #[error("store failure: {0}")]
    Other(String),
}

/// Insert-only measurement sink.
pub trait MeasurementStore {
    /// Submit one chunk's documents as a single unordered bulk insert.
    ///
    /// Unordered semantics are required: one rejected document must not
    /// abort the rest of the batch. Implementations fold duplicate-key
    /// rejections into the returned outcome.
    fn insert_unordered(&mut self, docs: &[Measurement]) -> Result<BulkInsertOutcome, StoreError>;
}
