use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::engine_info;
use harvester_core::FeedItemRecord;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("sink rejected batch: {0}")]
    Rejected(String),
}

/// Where flushed batches go.
///
/// A call either persists the whole batch or returns an error; the session
/// keeps the records pending on error and retries on the next flush.
pub trait BatchSink {
    fn write_batch(&mut self, batch_index: u64, records: &[FeedItemRecord])
        -> Result<(), SinkError>;
}

/// One pretty-printed JSON array per batch: `{prefix}_{index:04}.json`.
#[derive(Debug, Clone)]
pub struct JsonBatchSink {
    writer: AtomicFileWriter,
    prefix: String,
    written: Vec<PathBuf>,
}

impl JsonBatchSink {
    pub fn new(dir: PathBuf, prefix: impl Into<String>) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
            prefix: prefix.into(),
            written: Vec::new(),
        }
    }

    pub fn filename(&self, batch_index: u64) -> String {
        format!("{}_{batch_index:04}.json", self.prefix)
    }

    /// Paths written so far, in flush order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl BatchSink for JsonBatchSink {
    fn write_batch(
        &mut self,
        batch_index: u64,
        records: &[FeedItemRecord],
    ) -> Result<(), SinkError> {
        let body = serde_json::to_vec_pretty(records)?;
        let path = self.writer.write(&self.filename(batch_index), &body)?;
        engine_info!(
            "Wrote batch {} ({} records) to {:?}",
            batch_index,
            records.len(),
            path
        );
        self.written.push(path);
        Ok(())
    }
}

/// Keeps flushed batches in memory; handy for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub batches: Vec<(u64, Vec<FeedItemRecord>)>,
    /// While set, every write fails with this reason.
    pub fail_with: Option<String>,
}

impl BatchSink for MemorySink {
    fn write_batch(
        &mut self,
        batch_index: u64,
        records: &[FeedItemRecord],
    ) -> Result<(), SinkError> {
        if let Some(reason) = &self.fail_with {
            return Err(SinkError::Rejected(reason.clone()));
        }
        self.batches.push((batch_index, records.to_vec()));
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    #[error("io error reading {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("batch file {path:?} is not a record array: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Ids already present in batch files a previous session left in `dir`.
///
/// Only `{prefix}*.json` files are read. A missing directory means a fresh
/// start and yields an empty set.
pub fn load_known_ids(dir: &Path, prefix: &str) -> Result<BTreeSet<String>, ResumeError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| ResumeError::Io { path, source }
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(err) => return Err(io_err(dir)(err)),
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            name.starts_with(prefix) && name.ends_with(".json")
        })
        .collect();
    paths.sort();

    let mut ids = BTreeSet::new();
    for path in paths {
        let content = fs::read(&path).map_err(io_err(&path))?;
        let records: Vec<FeedItemRecord> =
            serde_json::from_slice(&content).map_err(|source| ResumeError::Parse {
                path: path.clone(),
                source,
            })?;
        ids.extend(records.into_iter().map(|record| record.id));
    }
    Ok(ids)
}
