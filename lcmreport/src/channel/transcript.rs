//! Per-device session transcript.
//!
//! Everything read from the device is appended to the transcript file and
//! flushed immediately, so the log survives a crash mid-session.

use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{ChannelError, Result};

/// Append-only transcript of one device session.
#[derive(Debug)]
pub struct Transcript {
    path: PathBuf,
    file: File,
}

impl Transcript {
    /// Open (or create) the transcript file for appending.
    ///
    /// Missing parent directories are created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| transcript_error(&path, source))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| transcript_error(&path, source))?;

        Ok(Self { path, file })
    }

    /// Append bytes and flush.
    pub async fn record(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.file
            .write_all(data)
            .await
            .map_err(|source| transcript_error(&self.path, source))?;
        self.file
            .flush()
            .await
            .map_err(|source| transcript_error(&self.path, source))?;
        Ok(())
    }
}

/// Delete the transcript at `path` if it exists and is empty.
///
/// Returns `true` when a file was removed.
pub async fn remove_if_empty(path: &Path) -> io::Result<bool> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() == 0 => {
            fs::remove_file(path).await?;
            debug!("removed empty transcript {}", path.display());
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn transcript_error(path: &Path, source: io::Error) -> ChannelError {
    ChannelError::Transcript {
        path: path.to_path_buf(),
        source,
    }
}
