//! Receiver side of a transfer.
//!
//! Receives the filename, then answers each digest by searching its original
//! copy of the file (see [`crate::streaming::scan`]) and either reusing the
//! matched bytes or requesting the content. Output goes to a temp file that
//! replaces the original only after the sender's done packet.

use crate::digest::ChunkDigest;
use crate::error::{Result, SyncError};
use crate::streaming::channel::{PacketStream, TransferStats};
use crate::streaming::protocol::{PacketType, ProtocolError};
use crate::streaming::scan::ScanCursor;
use crate::streaming::state::Step;
use crate::temp_file::TempFileGuard;
use bytes::Bytes;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite};

/// Map an announced filename to a path under `root`.
///
/// Only the final path component is used, so a peer cannot direct the write
/// outside `root`.
pub fn resolve_target(root: &Path, announced: &str) -> Result<PathBuf> {
    if announced.is_empty() {
        return Err(SyncError::InvalidPath {
            path: announced.to_string(),
            reason: "empty filename".to_string(),
        });
    }

    match Path::new(announced).components().next_back() {
        Some(Component::Normal(name)) => Ok(root.join(name)),
        _ => Err(SyncError::InvalidPath {
            path: announced.to_string(),
            reason: "no file name component".to_string(),
        }),
    }
}

/// The announced filename, which must be UTF-8.
fn decode_filename(payload: Bytes) -> Result<String> {
    String::from_utf8(payload.to_vec()).map_err(|e| SyncError::InvalidPath {
        path: String::from_utf8_lossy(e.as_bytes()).into_owned(),
        reason: "filename is not valid UTF-8".to_string(),
    })
}

/// Mode for a file that did not exist before the transfer. The temp file is
/// created 0600, which is too strict for a regular file.
#[cfg(unix)]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    None
}

/// Receiver configuration
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Directory the announced file lives in
    pub root: PathBuf,
    /// Chunk size; must match the sender's
    pub chunk_size: usize,
    /// Scan-ahead window, in chunks
    pub window_chunks: usize,
}

/// Outcome of a completed transfer.
#[derive(Debug, Clone)]
pub struct ReceivedFile {
    /// The file that was replaced (or created)
    pub path: PathBuf,
    pub stats: TransferStats,
}

/// Receiver state
pub struct Receiver {
    config: ReceiverConfig,
}

impl Receiver {
    pub fn new(config: ReceiverConfig) -> Self {
        Self { config }
    }

    /// Run the whole exchange and replace the target file.
    ///
    /// On any error the temp output is discarded and the original file is
    /// left byte-for-byte unchanged.
    pub async fn run<R, W>(&self, stream: &mut PacketStream<R, W>) -> Result<ReceivedFile>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let header = stream.receive_step(Step::AwaitFilename).await?;
        let announced = decode_filename(header.into_payload())?;
        let target = resolve_target(&self.config.root, &announced)?;

        let (original, permissions) = match File::open(&target).await {
            Ok(f) => {
                let perms = f.metadata().await?.permissions();
                (Some(f), Some(perms))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => (None, new_file_permissions()),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(
            file = %target.display(),
            existing = original.is_some(),
            "receiving"
        );

        let mut cursor = ScanCursor::new(original, self.config.chunk_size, self.config.window_chunks);
        let mut output = TempFileGuard::create_beside(&target)?;
        let mut stats = TransferStats::new();

        loop {
            let packet = stream.receive_step(Step::AwaitDigestOrDone).await?;
            if packet.packet_type() == PacketType::Done {
                break;
            }

            let digest = ChunkDigest::from_slice(packet.payload()).ok_or(
                ProtocolError::MalformedDigest {
                    len: packet.payload().len(),
                },
            )?;

            match cursor.scan_ahead(digest).await? {
                Some(chunk) => {
                    stream.send(PacketType::HaveChunk, Bytes::new()).await?;
                    output.write_chunk(&chunk).await?;
                    tracing::debug!(
                        chunk = stats.chunks,
                        %digest,
                        cursor = cursor.position(),
                        "reused local chunk"
                    );
                    stats.record_reused(chunk.len());
                }
                None => {
                    stream.send(PacketType::NeedChunk, Bytes::new()).await?;
                    let content = stream
                        .receive_step(Step::AwaitChunkContent)
                        .await?
                        .into_payload();
                    output.write_chunk(&content).await?;
                    tracing::debug!(
                        chunk = stats.chunks,
                        %digest,
                        len = content.len(),
                        "fetched chunk"
                    );
                    stats.record_fetched(content.len());
                }
            }
        }

        // Release the read handle before the rename
        drop(cursor);
        output.persist(&target, permissions).await?;

        tracing::info!(
            file = %target.display(),
            chunks = stats.chunks,
            reused = stats.chunks_reused,
            fetched = stats.chunks_fetched,
            bytes_saved = stats.bytes_reused,
            "receive complete"
        );

        Ok(ReceivedFile {
            path: target,
            stats,
        })
    }
}
