//! Transfer configuration.
//!
//! File: `$XDG_CONFIG_HOME/farsync/config.toml` (or the platform config dir),
//! or an explicit `--config` path.
//! Env overrides: `FARSYNC_CHUNK_SIZE`, `FARSYNC_SCAN_WINDOW_CHUNKS`.
//!
//! Chunk size is never negotiated on the wire. Both endpoints must be
//! configured with the same value or no digest will ever match.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SyncError};
use crate::streaming::channel::{DEFAULT_CHUNK_SIZE, DEFAULT_SCAN_WINDOW_CHUNKS};
use crate::streaming::protocol::MAX_PAYLOAD_SIZE;

pub const ENV_CHUNK_SIZE: &str = "FARSYNC_CHUNK_SIZE";
pub const ENV_SCAN_WINDOW_CHUNKS: &str = "FARSYNC_SCAN_WINDOW_CHUNKS";

/// Upper bound on `chunk_size * scan_window_chunks` (1 GiB).
pub const MAX_WINDOW_BYTES: usize = 16 * MAX_PAYLOAD_SIZE as usize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Chunk size in bytes (default 4096).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Scan-ahead window in chunks (default 100).
    #[serde(default = "default_scan_window_chunks")]
    pub scan_window_chunks: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_scan_window_chunks() -> usize {
    DEFAULT_SCAN_WINDOW_CHUNKS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            scan_window_chunks: default_scan_window_chunks(),
        }
    }
}

impl Config {
    /// Defaults, then the config file, then environment overrides.
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_CHUNK_SIZE) {
            self.chunk_size = parse_usize(ENV_CHUNK_SIZE, &v)?;
        }
        if let Some(v) = lookup(ENV_SCAN_WINDOW_CHUNKS) {
            self.scan_window_chunks = parse_usize(ENV_SCAN_WINDOW_CHUNKS, &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_PAYLOAD_SIZE as usize {
            return Err(SyncError::Config(format!(
                "chunk_size must be between 1 and {} bytes, got {}",
                MAX_PAYLOAD_SIZE, self.chunk_size
            )));
        }
        if self.scan_window_chunks == 0 {
            return Err(SyncError::Config(
                "scan_window_chunks must be at least 1".to_string(),
            ));
        }
        match self.chunk_size.checked_mul(self.scan_window_chunks) {
            Some(bytes) if bytes <= MAX_WINDOW_BYTES => {}
            _ => {
                return Err(SyncError::Config(format!(
                    "scan window (chunk_size * scan_window_chunks) must not exceed {} bytes",
                    MAX_WINDOW_BYTES
                )))
            }
        }
        Ok(())
    }

    /// Scan-ahead window in bytes.
    pub fn window_bytes(&self) -> usize {
        self.chunk_size.saturating_mul(self.scan_window_chunks)
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| SyncError::Config(format!("{} must be a positive integer, got {:?}", key, value)))
}

/// `$XDG_CONFIG_HOME/farsync/config.toml`, else the platform config dir.
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)?;
    Some(base.join("farsync").join("config.toml"))
}
