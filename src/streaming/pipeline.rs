//! Streaming sync pipeline.
//!
//! Wires a Sender or Receiver to a reader/writer pair for one file transfer.

use crate::config::Config;
use crate::streaming::{
    channel::{PacketStream, TransferStats},
    receiver::ReceivedFile,
    Receiver, ReceiverConfig, Sender, SenderConfig,
};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Orchestrator for one file transfer
pub struct StreamingSync {
    pub config: Config,
}

impl StreamingSync {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Send `source` to the receiver on the other end of `reader`/`writer`.
    pub async fn push<R, W>(&self, source: &Path, reader: &mut R, writer: &mut W) -> Result<TransferStats>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let display_name = source
            .file_name()
            .with_context(|| format!("Source has no file name: {}", source.display()))?
            .to_string_lossy()
            .into_owned();

        let file = File::open(source)
            .await
            .with_context(|| format!("Failed to open {}", source.display()))?;
        let mut data = BufReader::new(file);

        let sender = Sender::new(SenderConfig {
            display_name,
            chunk_size: self.config.chunk_size,
        });
        let mut stream = PacketStream::new(reader, writer);
        let stats = sender
            .run(&mut data, &mut stream)
            .await
            .with_context(|| format!("Failed to send {}", source.display()))?;
        Ok(stats)
    }

    /// Receive one file into `root`.
    pub async fn serve<R, W>(&self, root: &Path, reader: &mut R, writer: &mut W) -> Result<ReceivedFile>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let receiver = Receiver::new(ReceiverConfig {
            root: root.to_path_buf(),
            chunk_size: self.config.chunk_size,
            window_chunks: self.config.scan_window_chunks,
        });
        let mut stream = PacketStream::new(reader, writer);
        let received = receiver
            .run(&mut stream)
            .await
            .with_context(|| format!("Failed to receive into {}", root.display()))?;
        Ok(received)
    }
}
