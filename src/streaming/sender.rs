//! Sender side of a transfer.
//!
//! Announces the filename, then offers each chunk of the source by digest and
//! ships its content only when the receiver asks for it. The sender never
//! looks at the receiver's file.

use crate::digest::ChunkDigest;
use crate::error::Result;
use crate::streaming::channel::{PacketStream, TransferStats};
use crate::streaming::protocol::{read_full, PacketType, ProtocolError};
use crate::streaming::state::Step;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

/// Sender configuration
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Name announced in the filename packet
    pub display_name: String,
    /// Chunk size; must match the receiver's
    pub chunk_size: usize,
}

/// Sender state
pub struct Sender {
    config: SenderConfig,
}

impl Sender {
    pub fn new(config: SenderConfig) -> Self {
        Self { config }
    }

    /// Run the whole exchange for `data`, ending with a done packet.
    ///
    /// Any stream failure or out-of-order reply aborts immediately.
    pub async fn run<D, R, W>(
        &self,
        data: &mut D,
        stream: &mut PacketStream<R, W>,
    ) -> Result<TransferStats>
    where
        D: AsyncRead + Unpin,
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut stats = TransferStats::new();

        stream
            .send(
                PacketType::Filename,
                Bytes::copy_from_slice(self.config.display_name.as_bytes()),
            )
            .await?;

        let mut buf = vec![0u8; self.config.chunk_size];
        loop {
            // Only the final chunk may come up short
            let n = read_full(data, &mut buf).await?;
            if n == 0 {
                break;
            }
            let chunk = &buf[..n];

            let digest = ChunkDigest::of(chunk);
            stream
                .send(
                    PacketType::NextChunkDigest,
                    Bytes::copy_from_slice(digest.as_bytes()),
                )
                .await?;

            let reply = stream.receive_step(Step::AwaitChunkReply).await?;
            match reply.packet_type() {
                PacketType::HaveChunk => {
                    tracing::debug!(chunk = stats.chunks, %digest, len = n, "receiver has chunk");
                    stats.record_reused(n);
                }
                PacketType::NeedChunk => {
                    tracing::debug!(chunk = stats.chunks, %digest, len = n, "sending chunk content");
                    stream
                        .send(PacketType::NextChunkContent, Bytes::copy_from_slice(chunk))
                        .await?;
                    stats.record_fetched(n);
                }
                other => {
                    return Err(ProtocolError::UnexpectedPacketType {
                        received: other,
                        expected: Step::AwaitChunkReply.accepts().to_vec(),
                    }
                    .into())
                }
            }
        }

        stream.send(PacketType::Done, Bytes::new()).await?;

        tracing::info!(
            file = %self.config.display_name,
            chunks = stats.chunks,
            reused = stats.chunks_reused,
            sent = stats.chunks_fetched,
            bytes_sent = stats.bytes_fetched,
            "send complete"
        );

        Ok(stats)
    }
}
