//! The batch-load pipeline: bounded chunks of raw rows, normalized and
//! submitted as unordered bulk inserts, with per-chunk fault isolation.
//!
//! Most callers construct a [`ChunkReader`] over the source file and feed
//! it to [`BatchLoader::run`], which:
//!
//! - skips (and reports) chunks missing a required column
//! - drops rows whose identity cannot be computed
//! - counts duplicate-key rejections instead of failing on them
//! - retries transient store failures with a fixed back-off, up to a
//!   bounded attempt ceiling, and gives a chunk up as lost afterwards
//! - returns a [`RunReport`] of the run totals
//!
//! Chunks are processed strictly sequentially; one chunk's failure never
//! aborts the run.

pub mod batch;
pub mod chunks;
pub mod observability;

pub use batch::{BatchLoader, ChunkOutcome, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BACKOFF, LoadOptions};
pub use chunks::{ChunkReader, DEFAULT_CHUNK_SIZE, RawChunk};
pub use observability::{
    CompositeObserver, JsonFileReporter, LoadObserver, RunReport, TracingObserver,
};
