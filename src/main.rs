use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use iot_batch_ingest::coerce::EpochUnit;
use iot_batch_ingest::loader::{
    BatchLoader, ChunkReader, CompositeObserver, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES,
    JsonFileReporter, LoadOptions, TracingObserver,
};
use iot_batch_ingest::store::MongoMeasurementStore;

#[derive(Parser, Debug)]
#[command(name = "iot-batch-ingest")]
#[command(about = "Batch-load cleaned IoT sensor readings into MongoDB", long_about = None)]
struct Args {
    /// Path to the source CSV file (e.g. data/cleaned_IoT_data.csv)
    #[arg(long)]
    file: PathBuf,

    /// MongoDB connection string
    #[arg(
        long,
        env = "MONGODB_URI",
        default_value = "mongodb://localhost:27017/?authSource=admin"
    )]
    mongodb_uri: String,

    /// Target database name
    #[arg(long, env = "MONGODB_DB", default_value = "iot")]
    db: String,

    /// Target collection name
    #[arg(long, env = "MONGODB_COLLECTION", default_value = "measurements")]
    collection: String,

    /// Rows per chunk
    #[arg(long, env = "CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// CSV field separator
    #[arg(long, env = "CSV_SEP", default_value_t = ',')]
    sep: char,

    /// Text encoding of the source file (any WHATWG label)
    #[arg(long, env = "CSV_ENCODING", default_value = "utf-8")]
    encoding: String,

    /// Unit of the epoch timestamp column: s, ms or auto
    #[arg(long, env = "EPOCH_UNIT", default_value = "auto")]
    epoch_unit: String,

    /// Preserve unmapped columns in a 'raw' sub-document
    #[arg(long)]
    keep_raw: bool,

    /// Bulk-insert attempts per chunk before its rows are given up
    #[arg(long, env = "MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Where to write the end-of-run metrics JSON
    #[arg(long, default_value = "metrics.json")]
    metrics_out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("iot_batch_ingest=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let epoch_unit: EpochUnit = args.epoch_unit.parse().map_err(anyhow::Error::msg)?;
    let delimiter =
        u8::try_from(args.sep).context("CSV separator must be a single-byte character")?;

    info!(
        file = %args.file.display(),
        db = %args.db,
        collection = %args.collection,
        "starting batch ingestion"
    );

    // Startup failures (unreachable store, unreadable file) abort with a
    // nonzero status; after this point the run always completes.
    let store = MongoMeasurementStore::connect(&args.mongodb_uri, &args.db, &args.collection)
        .with_context(|| format!("connecting to MongoDB at {} failed", args.mongodb_uri))?;
    let chunks = ChunkReader::from_path(&args.file, delimiter, &args.encoding, args.chunk_size)
        .with_context(|| format!("opening source file {:?} failed", args.file))?;

    let observer = CompositeObserver::new(vec![
        Arc::new(TracingObserver),
        Arc::new(JsonFileReporter::new(&args.metrics_out)),
    ]);

    let mut loader = BatchLoader::new(
        store,
        LoadOptions {
            epoch_unit,
            keep_raw: args.keep_raw,
            max_retries: args.max_retries,
            observer: Some(Arc::new(observer)),
            ..Default::default()
        },
    );
    let report = loader.run(chunks);

    // Partial loss within a run is reported, not fatal: the exit status
    // reflects only unrecoverable startup failures.
    info!(
        rows_seen = report.rows_seen,
        inserted = report.inserted,
        duplicates = report.duplicates,
        rows_lost = report.rows_lost,
        duration_sec = report.duration_sec,
        metrics = %args.metrics_out.display(),
        "ingestion finished"
    );
    Ok(())
}
