use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use tokio::sync::Mutex;

use crate::aggregate::SharedResults;
use crate::persist::{AtomicFileWriter, PersistError};

/// Serializes the shared results to one output file.
///
/// Writes are serialized by an internal lock, and the results are copied while
/// that lock is held, so a later write never carries fewer entries than an
/// earlier one.
#[derive(Debug)]
pub struct SnapshotWriter {
    file: Mutex<AtomicFileWriter>,
    filename: String,
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: PathBuf, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let path = dir.join(&filename);
        Self {
            file: Mutex::new(AtomicFileWriter::new(dir)),
            filename,
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the output file with the current ranking; returns the entry count.
    pub async fn write(&self, results: &SharedResults) -> Result<usize, PersistError> {
        let file = self.file.lock().await;
        let (content, entries) = results.render_snapshot()?;
        let path = file.write(&self.filename, &content)?;
        engine_debug!("Wrote {} entries to {}", entries, path.display());
        Ok(entries)
    }
}
