//! Chunk-negotiation protocol for one file.
//!
//! Lock-step request/response between a Sender holding the new content and a
//! Receiver holding a possibly stale copy.
//!
//! # Architecture
//!
//! ```text
//! Sender                                   Receiver
//!   filename(name)            ------>
//!   next_chunk_digest(md5)    ------>      scan-ahead in original file
//!                             <------      have_chunk | need_chunk
//!   next_chunk_content(bytes) ------>      (only after need_chunk)
//!   ...one exchange per chunk...
//!   done                      ------>      rename temp over original
//! ```
//!
//! # Wire format
//!
//! Every packet is `type:u8 | len:u32 (big-endian) | payload`. There is no
//! version or chunk-size negotiation; both sides are configured out of band.

pub mod channel;
pub mod pipeline;
pub mod protocol;
pub mod receiver;
pub mod scan;
pub mod sender;
pub mod state;

pub use channel::{PacketStream, TransferStats, DEFAULT_CHUNK_SIZE, DEFAULT_SCAN_WINDOW_CHUNKS};

pub use pipeline::StreamingSync;
pub use receiver::{ReceivedFile, Receiver, ReceiverConfig};
pub use sender::{Sender, SenderConfig};

pub use protocol::{Packet, PacketType, ProtocolError, HEADER_LEN, MAX_PAYLOAD_SIZE};
pub use scan::{find_chunk, ScanCursor};
pub use state::Step;
