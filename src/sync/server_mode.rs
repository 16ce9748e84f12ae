//! Server mode sync - uses subprocess protocol for remote operations.
//!
//! Supports both SSH (remote) and local subprocess.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::config::Config;
use crate::path::SyncPath;
use crate::streaming::{StreamingSync, TransferStats};
use crate::transport::server::{ServerSession, SshConfig};

/// Push one local file to a destination directory (push)
pub async fn sync_push(source: &Path, dest: &SyncPath, config: &Config) -> Result<TransferStats> {
    let session = match dest {
        SyncPath::Remote { host, user, path } => {
            let ssh = SshConfig {
                hostname: host.clone(),
                user: user.clone().unwrap_or_default(),
                ..Default::default()
            };
            ServerSession::connect_ssh(&ssh, path, config).await?
        }
        SyncPath::Local { path } => ServerSession::connect_local(path, config).await?,
    };

    push_over(session, source, config).await
}

/// Run the sender against an already spawned receiver and reap it.
pub async fn push_over(session: ServerSession, source: &Path, config: &Config) -> Result<TransferStats> {
    let (mut stdin, mut stdout, mut child) = session.split();

    let sync = StreamingSync::new(config.clone());
    let result = sync.push(source, &mut stdout, &mut stdin).await;

    // Close our end so a receiver stuck mid-read sees end of stream
    if let Err(e) = stdin.shutdown().await {
        tracing::debug!(error = %e, "closing receiver stdin failed");
    }
    drop(stdin);

    let status = child.wait().await.context("Failed to wait for receiver")?;
    let stats = result?;
    if !status.success() {
        anyhow::bail!("Receiver exited with {}", status);
    }
    Ok(stats)
}
