//! Protocol steps and the packets each one accepts.
//!
//! There is no state machine object at runtime: every `receive` names the step
//! it is in, and the step's accepted set is checked against the incoming
//! packet. This table is the whole ordering contract.
//!
//! ```text
//! Sender:   AnnounceFilename -> (Digest -> AwaitChunkReply [-> Content])* -> Done
//! Receiver: AwaitFilename -> (AwaitDigestOrDone [-> AwaitChunkContent])* -> Finalize
//! ```

use crate::streaming::protocol::{Packet, PacketType, ProtocolError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Receiver, first packet of a transfer.
    AwaitFilename,
    /// Receiver, top of the per-chunk loop.
    AwaitDigestOrDone,
    /// Receiver, after answering need_chunk.
    AwaitChunkContent,
    /// Sender, after announcing a digest.
    AwaitChunkReply,
}

impl Step {
    /// Packet types legal in this step.
    pub fn accepts(self) -> &'static [PacketType] {
        match self {
            Step::AwaitFilename => &[PacketType::Filename],
            Step::AwaitDigestOrDone => &[PacketType::NextChunkDigest, PacketType::Done],
            Step::AwaitChunkContent => &[PacketType::NextChunkContent],
            Step::AwaitChunkReply => &[PacketType::HaveChunk, PacketType::NeedChunk],
        }
    }

    /// Reject a packet this step does not accept.
    pub fn check(self, packet: &Packet) -> Result<(), ProtocolError> {
        check_expected(self.accepts(), packet)
    }
}

/// Fail with `UnexpectedPacketType` unless the packet's type is in `expected`.
pub fn check_expected(expected: &[PacketType], packet: &Packet) -> Result<(), ProtocolError> {
    if expected.contains(&packet.packet_type()) {
        Ok(())
    } else {
        Err(ProtocolError::UnexpectedPacketType {
            received: packet.packet_type(),
            expected: expected.to_vec(),
        })
    }
}
