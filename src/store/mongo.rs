//! MongoDB-backed measurement store.

use mongodb::bson::doc;
use mongodb::error::ErrorKind;
use mongodb::options::InsertManyOptions;
use mongodb::sync::{Client, Collection};

use super::{BulkInsertOutcome, MeasurementStore, StoreError};
use crate::document::Measurement;
use crate::error::IngestResult;

/// Server error code for a unique-index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Insert-only measurement collection in a MongoDB(-compatible) store.
///
/// One long-lived connection, acquired once at startup and used for every
/// chunk. Each bulk insert is its own atomicity unit at the store's
/// discretion; no transactional scope spans chunks.
pub struct MongoMeasurementStore {
    collection: Collection<Measurement>,
}

impl MongoMeasurementStore {
    /// Connect and verify the server is reachable.
    ///
    /// The driver connects lazily, so an explicit ping here turns an
    /// unreachable store into a startup failure instead of a mid-run one.
    pub fn connect(uri: &str, database: &str, collection: &str) -> IngestResult<Self> {
        let client = Client::with_uri_str(uri)?;
        let database = client.database(database);
        database.run_command(doc! { "ping": 1 }, None)?;
        Ok(Self {
            collection: database.collection(collection),
        })
    }
}

impl MeasurementStore for MongoMeasurementStore {
    fn insert_unordered(&mut self, docs: &[Measurement]) -> Result<BulkInsertOutcome, StoreError> {
        let options = InsertManyOptions::builder().ordered(false).build();
        match self.collection.insert_many(docs, options) {
            Ok(result) => Ok(BulkInsertOutcome {
                attempted: docs.len(),
                inserted: result.inserted_ids.len(),
                duplicates: 0,
            }),
            Err(err) => classify_bulk_error(err, docs.len()),
        }
    }
}

/// Map a driver error onto the loader's taxonomy.
///
/// A bulk-write failure carrying per-document write errors is a partial
/// outcome: documents with [`DUPLICATE_KEY_CODE`] count as duplicates, the
/// remainder as inserted. Network-shaped failures are retryable; everything
/// else aborts the chunk.
fn classify_bulk_error(
    err: mongodb::error::Error,
    attempted: usize,
) -> Result<BulkInsertOutcome, StoreError> {
    match err.kind.as_ref() {
        ErrorKind::BulkWrite(failure) => {
            let write_errors = failure.write_errors.as_deref().unwrap_or_default();
            let duplicates = write_errors
                .iter()
                .filter(|e| e.code == DUPLICATE_KEY_CODE)
                .count();
            Ok(BulkInsertOutcome {
                attempted,
                inserted: attempted.saturating_sub(write_errors.len()),
                duplicates,
            })
        }
        ErrorKind::Io(_)
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => Err(StoreError::Transient(err.to_string())),
        _ => Err(StoreError::Other(err.to_string())),
    }
}
