//! Scoped temporary output for a transfer.
//!
//! The temp file lives next to its target so the final rename stays on one
//! filesystem and is atomic. Dropping the guard without calling
//! [`TempFileGuard::persist`] removes the temp file and leaves the target as
//! it was.

use std::fs::Permissions;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, SyncError};

pub struct TempFileGuard {
    temp: NamedTempFile,
    writer: File,
    bytes_written: u64,
}

impl TempFileGuard {
    /// Create an empty temp file in the directory that holds `target`.
    pub fn create_beside(target: &Path) -> io::Result<Self> {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(".farsync-")
            .suffix(".tmp")
            .tempfile_in(&dir)?;
        let writer = File::from_std(temp.as_file().try_clone()?);
        Ok(Self {
            temp,
            writer,
            bytes_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Append bytes at the end of the output.
    pub async fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Flush to disk and rename over `target`. Runs once, at the end of a
    /// successful transfer.
    pub async fn persist(mut self, target: &Path, permissions: Option<Permissions>) -> Result<()> {
        self.writer.flush().await?;
        self.writer.sync_all().await?;
        drop(self.writer);

        if let Some(perms) = permissions {
            if let Err(e) = tokio::fs::set_permissions(self.temp.path(), perms).await {
                tracing::warn!(
                    "Failed to set permissions on {}: {}",
                    self.temp.path().display(),
                    e
                );
            }
        }

        self.temp.persist(target).map_err(|e| SyncError::Persist {
            path: target.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }
}
