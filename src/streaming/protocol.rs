//! Packet framing for the chunk-negotiation protocol.
//!
//! Wire format: all multi-byte integers are big-endian
//! Frame format: type:u8 | len:u32 | payload
//!
//! The type code is part of the wire contract. Codes are assigned in
//! declaration order and must never be reordered.

use std::fmt;
use std::io;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Header size: 1 byte type code + 4 byte payload length.
pub const HEADER_LEN: usize = 5;

/// Maximum payload size (64MB) - prevents OOM from malicious/corrupted headers
pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

// =============================================================================
// Packet Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Filename = 0,
    NextChunkDigest = 1,
    NextChunkContent = 2,
    HaveChunk = 3,
    NeedChunk = 4,
    Done = 5,
}

impl PacketType {
    pub const ALL: [PacketType; 6] = [
        Self::Filename,
        Self::NextChunkDigest,
        Self::NextChunkContent,
        Self::HaveChunk,
        Self::NeedChunk,
        Self::Done,
    ];

    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Filename),
            1 => Some(Self::NextChunkDigest),
            2 => Some(Self::NextChunkContent),
            3 => Some(Self::HaveChunk),
            4 => Some(Self::NeedChunk),
            5 => Some(Self::Done),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::NextChunkDigest => "next_chunk_digest",
            Self::NextChunkContent => "next_chunk_content",
            Self::HaveChunk => "have_chunk",
            Self::NeedChunk => "need_chunk",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Packet types are sometimes named dynamically (logs, debugging tools);
/// an unrecognized name is a contract violation.
impl FromStr for PacketType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ProtocolError::InvalidType(s.to_string()))
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Stream ended early: expected {expected} bytes, got {received}")]
    TruncatedStream { expected: usize, received: usize },

    #[error("Unknown packet code {0}")]
    UnknownPacketCode(u8),

    #[error("Unexpected packet type: {received} (expected {})", type_list(.expected))]
    UnexpectedPacketType {
        received: PacketType,
        expected: Vec<PacketType>,
    },

    #[error("Invalid packet type {0:?}")]
    InvalidType(String),

    #[error("Payload size {len} exceeds maximum allowed size {max}")]
    PayloadTooLarge { len: u64, max: u32 },

    #[error("Malformed chunk digest: expected 16 bytes, got {len}")]
    MalformedDigest { len: usize },

    #[error("Stream I/O error: {0}")]
    Io(#[from] io::Error),
}

fn type_list(types: &[PacketType]) -> String {
    types
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(" or ")
}

// =============================================================================
// Packet
// =============================================================================

/// One typed protocol message. Equality is by type and payload content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    packet_type: PacketType,
    payload: Bytes,
}

impl Packet {
    pub fn new(packet_type: PacketType, payload: impl Into<Bytes>) -> Self {
        Self {
            packet_type,
            payload: payload.into(),
        }
    }

    /// A packet with an empty payload (have_chunk, need_chunk, done).
    pub fn empty(packet_type: PacketType) -> Self {
        Self::new(packet_type, Bytes::new())
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Size of the encoded frame.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Serialize to exactly `5 + payload.len()` bytes.
    ///
    /// Callers sending over a stream go through `PacketStream::send`, which
    /// rejects payloads over [`MAX_PAYLOAD_SIZE`] before they get here.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(self.packet_type.code());
        buf.put_u32(self.payload.len() as u32);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Read exactly one packet from the stream.
    pub async fn decode_from<R: AsyncRead + Unpin>(r: &mut R) -> Result<Self, ProtocolError> {
        let mut header = [0u8; HEADER_LEN];
        let got = read_full(r, &mut header).await?;
        if got < HEADER_LEN {
            return Err(ProtocolError::TruncatedStream {
                expected: HEADER_LEN,
                received: got,
            });
        }

        let code = header[0];
        let packet_type = PacketType::from_u8(code).ok_or(ProtocolError::UnknownPacketCode(code))?;

        let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
        // Validate payload size before allocation
        if len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                len: len as u64,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let len = len as usize;
        let mut payload = vec![0u8; len];
        let got = read_full(r, &mut payload).await?;
        if got < len {
            return Err(ProtocolError::TruncatedStream {
                expected: len,
                received: got,
            });
        }

        Ok(Self {
            packet_type,
            payload: Bytes::from(payload),
        })
    }
}

/// Fill `buf` from the reader, stopping early only at end of stream.
/// Returns the number of bytes read.
pub(crate) async fn read_full<R: AsyncRead + Unpin>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// =============================================================================
// Tests
// =============================================================================
