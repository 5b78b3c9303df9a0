use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Error type for startup and source-reading failures.
///
/// Row- and chunk-level defects never surface here: uncoercible cells are
/// dropped during normalization, and per-chunk failures are reported as
/// tagged [`crate::loader::ChunkOutcome`] values instead of errors.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Underlying I/O error (e.g. source file not found).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// MongoDB client/connection error.
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// The configured text encoding is not a known WHATWG label.
    #[error("unknown text encoding label '{label}'")]
    UnknownEncoding { label: String },
}
