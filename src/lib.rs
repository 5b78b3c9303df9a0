//! `iot-batch-ingest` loads semi-structured IoT sensor readings from CSV
//! files into a MongoDB-compatible document store: one normalized,
//! deduplicated document per (device, timestamp) pair.
//!
//! The pipeline is built for dirty input and repeated runs:
//!
//! - **Coercion, not validation** ([`coerce`]): uncoercible cells are
//!   omitted from the stored document; absence encodes unknown, never null.
//! - **Content-based identity** ([`identity`]): a document's `_id` is the
//!   SHA-1 digest of its (device, integer-second timestamp) pair, so
//!   re-ingesting the same file converges on the same keys and the store's
//!   unique index rejects the duplicates. Repeated loads are no-ops.
//! - **Chunked, fault-isolated loading** ([`loader`]): the source is
//!   processed in bounded chunks submitted as unordered bulk inserts;
//!   duplicates are counted and skipped, transient store failures are
//!   retried with a fixed back-off, and no chunk's failure aborts the run.
//!
//! ## Quick example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use iot_batch_ingest::loader::{
//!     BatchLoader, ChunkReader, DEFAULT_CHUNK_SIZE, LoadOptions, TracingObserver,
//! };
//! use iot_batch_ingest::store::MongoMeasurementStore;
//!
//! # fn main() -> Result<(), iot_batch_ingest::IngestError> {
//! let store = MongoMeasurementStore::connect("mongodb://localhost:27017", "iot", "measurements")?;
//! let chunks = ChunkReader::from_path("cleaned_IoT_data.csv", b',', "utf-8", DEFAULT_CHUNK_SIZE)?;
//!
//! let mut loader = BatchLoader::new(
//!     store,
//!     LoadOptions {
//!         observer: Some(Arc::new(TracingObserver)),
//!         ..Default::default()
//!     },
//! );
//! let report = loader.run(chunks);
//! println!("inserted={} duplicates={}", report.inserted, report.duplicates);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`coerce`]: cell-level type coercion and epoch-timestamp parsing
//! - [`identity`]: deterministic content-digest document keys
//! - [`document`]: the persisted measurement model
//! - [`normalize`]: raw row → document normalization
//! - [`store`]: the narrow store contract and its MongoDB implementation
//! - [`loader`]: chunked reading, batch submission, run reporting
//! - [`error`]: error types shared across the pipeline

pub mod coerce;
pub mod document;
pub mod error;
pub mod identity;
pub mod loader;
pub mod normalize;
pub mod store;

pub use error::{IngestError, IngestResult};
