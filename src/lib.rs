//! farsync - single-file delta transfer over a byte stream.
//!
//! A sender offers its file chunk by chunk as MD5 digests; the receiver
//! answers from its own stale copy where it can (searching ahead of its
//! cursor, so shifted or reordered content is still found) and asks for the
//! rest. The receiver builds the result in a temp file and renames it over the
//! original only when the sender says it is done.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use farsync::{Config, StreamingSync};
//! use std::path::Path;
//!
//! let (a, b) = tokio::io::duplex(64 * 1024);
//! let (mut ar, mut aw) = tokio::io::split(a);
//! let (mut br, mut bw) = tokio::io::split(b);
//!
//! let sync = StreamingSync::new(Config::default());
//! let (sent, received) = tokio::join!(
//!     sync.push(Path::new("report.csv"), &mut ar, &mut aw),
//!     sync.serve(Path::new("backup/"), &mut br, &mut bw),
//! );
//! println!("{:?} {:?}", sent?, received?.stats);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod digest;
pub mod error;
pub mod path;
pub mod server;
pub mod streaming;
pub mod sync;
pub mod temp_file;
pub mod transport;

pub use config::Config;
pub use digest::ChunkDigest;
pub use error::{Result, SyncError};
pub use path::SyncPath;
pub use streaming::{
    Packet, PacketStream, PacketType, ProtocolError, ReceivedFile, Receiver, ReceiverConfig,
    Sender, SenderConfig, StreamingSync, TransferStats,
};
