//! Crate error type.
//!
//! Wire-level failures live in [`ProtocolError`]; everything a transfer can
//! fail with is folded into [`SyncError`].

use std::io;
use std::path::PathBuf;

use crate::streaming::protocol::ProtocolError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// The underlying protocol error, if this failure came off the wire.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            SyncError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}
