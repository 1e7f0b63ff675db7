//! Transport layer for the RPC client.
//!
//! Abstracts how a request reaches the worker so the client (and the
//! pipeline above it) never cares whether the worker is an SSH
//! forced-command on a build machine or an in-process stand-in in tests.

use std::io;

use gplay_protocol::{RpcRequest, RpcResponse};

/// Transport for RPC communication.
pub trait Transport: Send + Sync {
    /// Execute one RPC request and return the response.
    fn execute(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError>;
}

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("SSH error: {0}")]
    Ssh(String),
}

/// SSH transport configuration.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Remote host.
    pub host: String,
    /// SSH user.
    pub user: String,
    /// SSH port (default 22).
    pub port: u16,
    /// Path to SSH private key.
    pub key_path: Option<String>,
    /// Workspace root the remote worker should serve files from.
    pub workspace_root: Option<String>,
    /// Connection timeout in seconds.
    pub connect_timeout_seconds: u32,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: "gplay".to_string(),
            port: 22,
            key_path: None,
            workspace_root: None,
            connect_timeout_seconds: 30,
        }
    }
}

/// SSH transport for production use.
///
/// Executes RPC requests over SSH using forced-command execution:
/// a single JSON request on stdin, a single JSON response on stdout.
pub struct SshTransport {
    config: SshConfig,
}

impl SshTransport {
    /// Create a new SSH transport with the given configuration.
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn build_ssh_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_seconds),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-p".to_string(),
            self.config.port.to_string(),
        ];

        if let Some(ref key_path) = self.config.key_path {
            args.push("-i".to_string());
            args.push(key_path.clone());
        }

        args.push(format!("{}@{}", self.config.user, self.config.host));
        args.push("gplay-worker".to_string());
        args.push("play".to_string());
        args.push("rpc".to_string());

        if let Some(ref root) = self.config.workspace_root {
            args.push("--workspace".to_string());
            args.push(root.clone());
        }

        args
    }
}

impl Transport for SshTransport {
    fn execute(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let args = self.build_ssh_args();
        let request_json = serde_json::to_string(request)?;

        let mut child = Command::new("ssh")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TransportError::Ssh(format!("failed to spawn ssh: {}", e)))?;

        if let Some(ref mut stdin) = child.stdin {
            writeln!(stdin, "{}", request_json)?;
        }
        drop(child.stdin.take());

        let output = child
            .wait_with_output()
            .map_err(|e| TransportError::Ssh(format!("ssh process error: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::Ssh(format!(
                "ssh exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| TransportError::Protocol(format!("invalid response JSON: {}", e)))
    }
}
