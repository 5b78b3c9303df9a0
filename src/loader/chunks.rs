//! Chunked CSV reading.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::Encoding;
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};
use tracing::warn;

use crate::error::{IngestError, IngestResult};
use crate::normalize::normalize_column;

/// Default rows per chunk: large enough to amortize bulk-insert overhead,
/// small enough to keep peak memory independent of file size.
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// One bounded batch of raw rows.
///
/// A chunk is self-contained: it carries the normalized column names its
/// records were read under, so it can be validated and normalized without
/// reference to the reader that produced it.
#[derive(Debug, Clone)]
pub struct RawChunk {
    /// 1-based position of this chunk in the source.
    pub index: usize,
    /// Column names, normalized (trimmed, lowercased, spaces to
    /// underscores).
    pub columns: Vec<String>,
    /// Raw records; field count may differ from `columns` for ragged rows.
    pub rows: Vec<csv::StringRecord>,
}

impl RawChunk {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Streams a delimited file as [`RawChunk`]s of at most `chunk_size` rows.
pub struct ChunkReader<R: Read> {
    reader: csv::Reader<R>,
    columns: Vec<String>,
    chunk_size: usize,
    next_index: usize,
    done: bool,
}

impl<R: Read> fmt::Debug for ChunkReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkReader")
            .field("columns", &self.columns)
            .field("chunk_size", &self.chunk_size)
            .field("next_index", &self.next_index)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl ChunkReader<DecodeReaderBytes<File, Vec<u8>>> {
    /// Open `path`, decoding it from `encoding_label` (any WHATWG label,
    /// e.g. `utf-8`, `latin1`, `windows-1252`).
    pub fn from_path(
        path: impl AsRef<Path>,
        delimiter: u8,
        encoding_label: &str,
        chunk_size: usize,
    ) -> IngestResult<Self> {
        let encoding =
            Encoding::for_label(encoding_label.as_bytes()).ok_or_else(|| {
                IngestError::UnknownEncoding {
                    label: encoding_label.to_owned(),
                }
            })?;
        let file = File::open(path)?;
        let decoder = DecodeReaderBytesBuilder::new()
            .encoding(Some(encoding))
            .build(file);
        Self::from_reader(decoder, delimiter, chunk_size)
    }
}

impl<R: Read> ChunkReader<R> {
    /// Wrap an existing reader.
    ///
    /// The header row is consumed and normalized here; reading it is the
    /// only way this constructor fails.
    pub fn from_reader(input: R, delimiter: u8, chunk_size: usize) -> IngestResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(input);
        let columns = reader.headers()?.iter().map(normalize_column).collect();
        Ok(Self {
            reader,
            columns,
            chunk_size: chunk_size.max(1),
            next_index: 1,
            done: false,
        })
    }

    /// Normalized header columns of the source.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = RawChunk;

    fn next(&mut self) -> Option<RawChunk> {
        if self.done {
            return None;
        }
        let mut rows = Vec::new();
        let mut record = csv::StringRecord::new();
        while rows.len() < self.chunk_size {
            match self.reader.read_record(&mut record) {
                Ok(true) => rows.push(record.clone()),
                Ok(false) => {
                    self.done = true;
                    break;
                }
                // A malformed record is skipped with a warning; a bad line
                // never aborts the run. I/O failures will not clear on
                // their own, so those end the read instead.
                Err(err) => {
                    if matches!(err.kind(), csv::ErrorKind::Io(_)) {
                        warn!(%err, "stopping read on i/o error");
                        self.done = true;
                        break;
                    }
                    warn!(%err, "skipping unreadable record");
                }
            }
        }
        if rows.is_empty() {
            return None;
        }
        let chunk = RawChunk {
            index: self.next_index,
            columns: self.columns.clone(),
            rows,
        };
        self.next_index += 1;
        Some(chunk)
    }
}
