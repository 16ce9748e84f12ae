//! Byte-stream transports to the receiving side.

pub mod server;

pub use server::{ServerSession, SshConfig};
