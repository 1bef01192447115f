//! Durable binlog file access.
//!
//! Opening creates parent directories and an empty file when absent, so a
//! node taking ownership of a brand-new session starts from a valid empty
//! log. Every save is a full overwrite flushed to the device.

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use tracing::debug;

/// Errors from binlog storage operations.
#[derive(Debug, Error)]
pub enum BinlogError {
    #[error("binlog I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BinlogError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        BinlogError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The session's durable log file, held open for read+write.
///
/// Exists once per session; mutated only by the node currently holding the
/// engine handle.
pub struct BinlogFile {
    path: PathBuf,
    handle: fs::File,
    bytes: Vec<u8>,
    last_modified_epoch_ms: u64,
}

impl BinlogFile {
    /// Open the binlog at `path`, creating parent directories and an empty
    /// file if absent. Idempotent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BinlogError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BinlogError::io(path, e))?;
        }
        let mut handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| BinlogError::io(path, e))?;

        let mut bytes = Vec::new();
        handle
            .read_to_end(&mut bytes)
            .map_err(|e| BinlogError::io(path, e))?;
        let last_modified_epoch_ms = modified_epoch_ms(path)?;

        debug!(
            path = %path.display(),
            size = %crate::human_readable_size(bytes.len() as u64),
            "Opened session binlog"
        );

        Ok(Self {
            path: path.to_path_buf(),
            handle,
            bytes,
            last_modified_epoch_ms,
        })
    }

    /// Atomically overwrite the full contents and flush to the device.
    ///
    /// On failure the caller must not assume partial writes are visible.
    pub fn save(&mut self, bytes: &[u8]) -> Result<(), BinlogError> {
        self.handle
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.handle.set_len(0))
            .and_then(|_| self.handle.write_all(bytes))
            .and_then(|_| self.handle.sync_all())
            .map_err(|e| BinlogError::io(&self.path, e))?;
        self.bytes = bytes.to_vec();
        self.last_modified_epoch_ms = modified_epoch_ms(&self.path)?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Last-modified wall-clock timestamp, milliseconds since the epoch.
    #[must_use]
    pub fn last_modified_epoch_ms(&self) -> u64 {
        self.last_modified_epoch_ms
    }
}

fn modified_epoch_ms(path: &Path) -> Result<u64, BinlogError> {
    let metadata = fs::metadata(path).map_err(|e| BinlogError::io(path, e))?;
    let modified = metadata.modified().map_err(|e| BinlogError::io(path, e))?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0))
}
