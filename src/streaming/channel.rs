//! Packet channel between the two endpoints of a transfer.
//!
//! Each call reads or writes exactly one whole packet; nothing is buffered
//! across protocol turns.

use crate::streaming::protocol::{Packet, PacketType, ProtocolError, MAX_PAYLOAD_SIZE};
use crate::streaming::state::{check_expected, Step};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Default chunk size (4KB). Must match on both endpoints.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Scan-ahead window, in chunks, searched past the receiver's cursor.
pub const DEFAULT_SCAN_WINDOW_CHUNKS: usize = 100;

// =============================================================================
// PacketStream
// =============================================================================

/// Typed send/receive over a reader and a writer owned for one transfer.
pub struct PacketStream<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> PacketStream<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Encode, write and flush one packet.
    ///
    /// The flush is required: the peer is blocked on exactly these bytes.
    pub async fn send(
        &mut self,
        packet_type: PacketType,
        payload: impl Into<Bytes>,
    ) -> Result<(), ProtocolError> {
        self.send_packet(&Packet::new(packet_type, payload)).await
    }

    pub async fn send_packet(&mut self, packet: &Packet) -> Result<(), ProtocolError> {
        let len = packet.payload().len();
        if len > MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                len: len as u64,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        self.writer.write_all(&packet.encode()).await?;
        self.writer.flush().await?;
        tracing::trace!(packet = %packet.packet_type(), len, "sent");
        Ok(())
    }

    /// Read one packet, failing unless its type is in `expected`.
    pub async fn receive(&mut self, expected: &[PacketType]) -> Result<Packet, ProtocolError> {
        let packet = Packet::decode_from(&mut self.reader).await?;
        tracing::trace!(
            packet = %packet.packet_type(),
            len = packet.payload().len(),
            "received"
        );
        check_expected(expected, &packet)?;
        Ok(packet)
    }

    /// Read one packet legal in `step`.
    pub async fn receive_step(&mut self, step: Step) -> Result<Packet, ProtocolError> {
        self.receive(step.accepts()).await
    }
}

// =============================================================================
// Transfer statistics
// =============================================================================

/// Per-transfer chunk accounting, identical on both endpoints.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransferStats {
    /// Chunks negotiated
    pub chunks: u64,

    /// Chunks the receiver already held
    pub chunks_reused: u64,

    /// Chunks sent as content
    pub chunks_fetched: u64,

    /// Bytes satisfied from the receiver's original file
    pub bytes_reused: u64,

    /// Bytes carried in next_chunk_content payloads
    pub bytes_fetched: u64,
}

impl TransferStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_reused(&mut self, len: usize) {
        self.chunks += 1;
        self.chunks_reused += 1;
        self.bytes_reused += len as u64;
    }

    pub fn record_fetched(&mut self, len: usize) {
        self.chunks += 1;
        self.chunks_fetched += 1;
        self.bytes_fetched += len as u64;
    }

    /// Total size of the reconstructed file.
    pub fn total_bytes(&self) -> u64 {
        self.bytes_reused + self.bytes_fetched
    }
}

// =============================================================================
// Tests
// =============================================================================
