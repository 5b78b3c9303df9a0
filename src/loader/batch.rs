//! Per-chunk normalize-then-insert state machine.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use tracing::warn;

use super::chunks::RawChunk;
use super::observability::{LoadObserver, RunReport};
use crate::coerce::EpochUnit;
use crate::document::Measurement;
use crate::normalize::{RawRow, REQUIRED_COLUMNS, normalize_row};
use crate::store::{MeasurementStore, StoreError};

/// Default ceiling on bulk-insert attempts per chunk.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default pause between attempts.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Options controlling a batch-load run.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct LoadOptions {
    /// Unit of the epoch timestamp column.
    pub epoch_unit: EpochUnit,
    /// Preserve unmapped, non-empty columns in a `raw` sub-document.
    pub keep_raw: bool,
    /// Bulk-insert attempts per chunk before its rows are given up as
    /// lost.
    pub max_retries: u32,
    /// Fixed pause between attempts. Blocks the whole pipeline, which is
    /// acceptable with a single producer.
    pub retry_backoff: Duration,
    /// Optional reporting sink for per-chunk and end-of-run events.
    pub observer: Option<Arc<dyn LoadObserver>>,
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("epoch_unit", &self.epoch_unit)
            .field("keep_raw", &self.keep_raw)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            epoch_unit: EpochUnit::Auto,
            keep_raw: false,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            observer: None,
        }
    }
}

/// Terminal outcome of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Every submitted document was newly inserted (or nothing survived
    /// normalization and there was nothing to submit).
    Success { rows: usize, inserted: usize },
    /// Some documents were rejected as duplicates of already-stored ids.
    /// Terminal: retrying a duplicate can never succeed.
    Partial {
        rows: usize,
        inserted: usize,
        duplicates: usize,
    },
    /// A required column is missing; no row of this chunk was processed.
    Skipped { rows: usize, missing: Vec<String> },
    /// Transient failures exhausted the attempt ceiling; the submitted
    /// documents are lost and will not be retried.
    Exhausted {
        rows: usize,
        lost: usize,
        attempts: u32,
    },
    /// The store reported an unclassified failure; the chunk was
    /// abandoned.
    Aborted {
        rows: usize,
        lost: usize,
        message: String,
    },
}

impl ChunkOutcome {
    /// Source rows this outcome covers.
    pub fn rows(&self) -> usize {
        match self {
            Self::Success { rows, .. }
            | Self::Partial { rows, .. }
            | Self::Skipped { rows, .. }
            | Self::Exhausted { rows, .. }
            | Self::Aborted { rows, .. } => *rows,
        }
    }
}

/// Drives chunks through normalize-then-insert against a store.
pub struct BatchLoader<S> {
    store: S,
    options: LoadOptions,
}

impl<S: MeasurementStore> BatchLoader<S> {
    pub fn new(store: S, options: LoadOptions) -> Self {
        Self { store, options }
    }

    /// Process every chunk strictly in order and return the run totals.
    ///
    /// The worst a chunk can do is add its own rows to the lost count:
    /// skipped, exhausted and aborted chunks are reported and the run
    /// moves on to the next chunk.
    pub fn run(&mut self, chunks: impl IntoIterator<Item = RawChunk>) -> RunReport {
        let started = Instant::now();
        let mut rows_seen = 0u64;
        let mut inserted = 0u64;
        let mut duplicates = 0u64;
        let mut rows_lost = 0u64;

        for chunk in chunks {
            let outcome = self.process_chunk(&chunk);
            rows_seen += outcome.rows() as u64;
            match &outcome {
                ChunkOutcome::Success { inserted: n, .. } => inserted += *n as u64,
                ChunkOutcome::Partial {
                    inserted: n,
                    duplicates: d,
                    ..
                } => {
                    inserted += *n as u64;
                    duplicates += *d as u64;
                }
                ChunkOutcome::Skipped { .. } => {}
                ChunkOutcome::Exhausted { lost, .. } | ChunkOutcome::Aborted { lost, .. } => {
                    rows_lost += *lost as u64;
                }
            }
            if let Some(observer) = &self.options.observer {
                observer.on_chunk(chunk.index, &outcome);
            }
        }

        let duration_sec = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        let report = RunReport {
            rows_seen,
            inserted,
            duplicates,
            rows_lost,
            duration_sec,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        if let Some(observer) = &self.options.observer {
            observer.on_run_complete(&report);
        }
        report
    }

    /// Run one chunk through READ → NORMALIZE → INSERT.
    pub fn process_chunk(&mut self, chunk: &RawChunk) -> ChunkOutcome {
        let rows = chunk.row_count();

        // Without both required columns no row of the chunk can acquire an
        // identity, so the chunk is skipped wholesale, never partially.
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !chunk.columns.iter().any(|c| c == *required))
            .map(|required| (*required).to_owned())
            .collect();
        if !missing.is_empty() {
            return ChunkOutcome::Skipped { rows, missing };
        }

        // Rows without a computable id are dropped here; they are not
        // retried and not counted as errors.
        let docs: Vec<Measurement> = chunk
            .rows
            .iter()
            .filter_map(|record| {
                let row = RawRow::new(&chunk.columns, record);
                normalize_row(&row, self.options.epoch_unit, self.options.keep_raw)
            })
            .collect();

        if docs.is_empty() {
            warn!(chunk = chunk.index, "no valid documents to insert");
            return ChunkOutcome::Success { rows, inserted: 0 };
        }

        self.submit_with_retry(chunk.index, rows, &docs)
    }

    fn submit_with_retry(&mut self, chunk: usize, rows: usize, docs: &[Measurement]) -> ChunkOutcome {
        let attempts = self.options.max_retries.max(1);
        for attempt in 1..=attempts {
            match self.store.insert_unordered(docs) {
                Ok(outcome) if outcome.duplicates == 0 => {
                    return ChunkOutcome::Success {
                        rows,
                        inserted: outcome.inserted,
                    };
                }
                Ok(outcome) => {
                    return ChunkOutcome::Partial {
                        rows,
                        inserted: outcome.inserted,
                        duplicates: outcome.duplicates,
                    };
                }
                Err(StoreError::Transient(message)) => {
                    warn!(chunk, attempt, %message, "transient store failure");
                    if attempt < attempts {
                        thread::sleep(self.options.retry_backoff);
                    }
                }
                Err(StoreError::Other(message)) => {
                    return ChunkOutcome::Aborted {
                        rows,
                        lost: docs.len(),
                        message,
                    };
                }
            }
        }
        ChunkOutcome::Exhausted {
            rows,
            lost: docs.len(),
            attempts,
        }
    }
}
