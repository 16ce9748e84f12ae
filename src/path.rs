//! Destination parsing: a local directory or `[user@]host:dir`.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPath {
    Local {
        path: PathBuf,
    },
    Remote {
        host: String,
        user: Option<String>,
        path: PathBuf,
    },
}

impl SyncPath {
    /// Parse a destination argument.
    ///
    /// `host:dir` is remote when the part before the first `:` is non-empty
    /// and contains no `/`. A single letter before the colon is taken as a
    /// Windows drive (`C:\dir`), not a host.
    pub fn parse(s: &str) -> Self {
        if let Some((head, tail)) = s.split_once(':') {
            let is_drive = head.len() == 1 && head.chars().all(|c| c.is_ascii_alphabetic());
            if !head.is_empty() && !head.contains('/') && !is_drive {
                let (user, host) = match head.split_once('@') {
                    Some((u, h)) if !u.is_empty() => (Some(u.to_string()), h.to_string()),
                    Some((_, h)) => (None, h.to_string()),
                    None => (None, head.to_string()),
                };
                let path = if tail.is_empty() { "." } else { tail };
                return SyncPath::Remote {
                    host,
                    user,
                    path: PathBuf::from(path),
                };
            }
        }
        SyncPath::Local {
            path: PathBuf::from(s),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SyncPath::Local { path } | SyncPath::Remote { path, .. } => path,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SyncPath::Remote { .. })
    }
}

impl fmt::Display for SyncPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPath::Local { path } => write!(f, "{}", path.display()),
            SyncPath::Remote {
                host,
                user: Some(user),
                path,
            } => write!(f, "{}@{}:{}", user, host, path.display()),
            SyncPath::Remote {
                host,
                user: None,
                path,
            } => write!(f, "{}:{}", host, path.display()),
        }
    }
}
