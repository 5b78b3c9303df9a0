//! Run-level reporting: an injected sink for per-chunk outcomes and the
//! end-of-run summary.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::batch::ChunkOutcome;

/// Aggregated result of one batch-load run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub rows_seen: u64,
    pub inserted: u64,
    pub duplicates: u64,
    /// Rows whose chunk exhausted its retry budget or was abandoned.
    pub rows_lost: u64,
    /// Wall-clock duration, rounded to centiseconds.
    pub duration_sec: f64,
    /// RFC 3339 completion instant.
    pub timestamp: String,
}

/// Reporting sink for a batch-load run.
///
/// Implementors receive one call per chunk, in order, and a final call
/// with the aggregated report. The sink is injected via
/// [`super::LoadOptions`]; there is no ambient global reporting state.
pub trait LoadObserver: Send + Sync {
    fn on_chunk(&self, _index: usize, _outcome: &ChunkOutcome) {}

    fn on_run_complete(&self, _report: &RunReport) {}
}

/// Fans callbacks out to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn LoadObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn LoadObserver>>) -> Self {
        Self { observers }
    }
}

impl LoadObserver for CompositeObserver {
    fn on_chunk(&self, index: usize, outcome: &ChunkOutcome) {
        for observer in &self.observers {
            observer.on_chunk(index, outcome);
        }
    }

    fn on_run_complete(&self, report: &RunReport) {
        for observer in &self.observers {
            observer.on_run_complete(report);
        }
    }
}

/// Logs chunk outcomes and the final summary through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn on_chunk(&self, index: usize, outcome: &ChunkOutcome) {
        match outcome {
            ChunkOutcome::Success { rows, inserted } => {
                info!(chunk = index, rows, inserted, "chunk loaded");
            }
            ChunkOutcome::Partial {
                rows,
                inserted,
                duplicates,
            } => {
                info!(
                    chunk = index,
                    rows, inserted, duplicates, "chunk loaded, duplicates skipped"
                );
            }
            ChunkOutcome::Skipped { rows, missing } => {
                error!(
                    chunk = index,
                    rows,
                    missing = ?missing,
                    "chunk skipped: required columns missing"
                );
            }
            ChunkOutcome::Exhausted {
                rows,
                lost,
                attempts,
            } => {
                error!(
                    chunk = index,
                    rows, lost, attempts, "chunk lost: retry budget exhausted"
                );
            }
            ChunkOutcome::Aborted { rows, lost, message } => {
                error!(
                    chunk = index,
                    rows,
                    lost,
                    %message,
                    "chunk abandoned on unexpected store failure"
                );
            }
        }
    }

    fn on_run_complete(&self, report: &RunReport) {
        info!(
            rows_seen = report.rows_seen,
            inserted = report.inserted,
            duplicates = report.duplicates,
            rows_lost = report.rows_lost,
            duration_sec = report.duration_sec,
            "run complete"
        );
    }
}

/// Writes the final [`RunReport`] as pretty JSON to a file.
///
/// Writes are best-effort: a reporting failure is logged and never fails
/// the run it is reporting on.
#[derive(Debug)]
pub struct JsonFileReporter {
    path: PathBuf,
}

impl JsonFileReporter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl LoadObserver for JsonFileReporter {
    fn on_run_complete(&self, report: &RunReport) {
        let json = match serde_json::to_string_pretty(report) {
            Ok(json) => json,
            Err(err) => {
                error!(%err, "could not serialize run report");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, json) {
            error!(path = %self.path.display(), %err, "could not write run report");
        }
    }
}
