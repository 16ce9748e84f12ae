//! Server mode - runs when invoked as `farsync --server <dir>`
//!
//! Receives one file over stdin/stdout. Nothing but protocol bytes may be
//! written to stdout in this mode; logs go to stderr.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io;

use crate::config::Config;
use crate::streaming::{ReceivedFile, StreamingSync};

/// Expand tilde (~) in paths to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if path_str == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    } else if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            home.join(rest)
        } else {
            path.to_path_buf()
        }
    } else {
        path.to_path_buf()
    }
}

/// Main server entry point
pub async fn run_server(raw_root: &Path, config: Config) -> Result<ReceivedFile> {
    let root = expand_tilde(raw_root);

    if !root.exists() {
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create {}", root.display()))?;
    }

    tracing::debug!(root = %root.display(), chunk_size = config.chunk_size, "server ready");

    let mut stdin = io::stdin();
    let mut stdout = io::stdout();

    StreamingSync::new(config)
        .serve(&root, &mut stdin, &mut stdout)
        .await
}
