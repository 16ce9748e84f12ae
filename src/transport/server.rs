//! Server session - spawns the receiving `farsync --server <dir>`
//!
//! Provides raw stdin/stdout streams. Protocol handling is done by StreamingSync.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::config::Config;

/// How to reach a remote host over ssh.
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub hostname: String,
    pub user: String,
    pub port: u16,
    pub identity_file: Vec<PathBuf>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            user: String::new(),
            port: 22,
            identity_file: Vec::new(),
        }
    }
}

/// Arguments for the remote side. Chunk settings are forwarded so both ends
/// agree without negotiating on the wire.
fn server_args(remote_path: &Path, config: &Config) -> Vec<OsString> {
    vec![
        "--server".into(),
        remote_path.as_os_str().to_owned(),
        "--chunk-size".into(),
        config.chunk_size.to_string().into(),
        "--scan-window-chunks".into(),
        config.scan_window_chunks.to_string().into(),
    ]
}

/// A running receiver process
pub struct ServerSession {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
}

impl ServerSession {
    /// Connect to remote server via SSH
    pub async fn connect_ssh(ssh: &SshConfig, remote_path: &Path, config: &Config) -> Result<Self> {
        let mut cmd = Command::new("ssh");

        cmd.arg(&ssh.hostname);

        if !ssh.user.is_empty() {
            cmd.arg("-l").arg(&ssh.user);
        }

        if ssh.port != 22 {
            cmd.arg("-p").arg(ssh.port.to_string());
        }

        for key in &ssh.identity_file {
            cmd.arg("-i").arg(key);
        }

        // Remote command: farsync --server <remote_path> ...
        cmd.arg("farsync");
        cmd.args(server_args(remote_path, config));

        Self::spawn(cmd).context("Failed to spawn SSH process")
    }

    /// Connect to a local server (same executable)
    pub async fn connect_local(remote_path: &Path, config: &Config) -> Result<Self> {
        let exe = std::env::current_exe().context("Cannot locate farsync executable")?;
        Self::connect_program(&exe, remote_path, config).await
    }

    /// Run `program --server ...` as the receiver
    pub async fn connect_program(program: &Path, remote_path: &Path, config: &Config) -> Result<Self> {
        let mut cmd = Command::new(program);
        cmd.args(server_args(remote_path, config));
        Self::spawn(cmd).with_context(|| format!("Failed to spawn {}", program.display()))
    }

    fn spawn(mut cmd: Command) -> Result<Self> {
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());

        let mut child = cmd.spawn()?;

        let stdin = child.stdin.take().context("Failed to open stdin")?;
        let stdout = child.stdout.take().context("Failed to open stdout")?;

        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }

    /// Split into stdin/stdout for protocol handling, plus the process to
    /// reap once the exchange is over
    pub fn split(self) -> (ChildStdin, ChildStdout, Child) {
        (self.stdin, self.stdout, self.child)
    }
}
