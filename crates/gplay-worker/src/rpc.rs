//! Worker RPC handler.
//!
//! Reads a single JSON request from stdin, dispatches it, and writes a
//! single JSON response to stdout. Designed to be invoked via SSH
//! forced-command:
//!
//!   gplay-worker play rpc

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use gplay_protocol::{RpcError, RpcRequest, RpcResponse, PROTOCOL_MAX, PROTOCOL_MIN};

use crate::dispatcher;
use crate::publisher::PublishService;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Minimum supported protocol version.
    pub protocol_min: i32,
    /// Maximum supported protocol version.
    pub protocol_max: i32,
    /// Root of the workspace the worker serves files from.
    pub workspace_root: PathBuf,
    /// Supported features.
    pub features: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            protocol_min: PROTOCOL_MIN,
            protocol_max: PROTOCOL_MAX,
            workspace_root: PathBuf::from("."),
            features: vec![
                "probe".to_string(),
                "find_files".to_string(),
                "inspect".to_string(),
                "publish".to_string(),
            ],
        }
    }
}

/// Main RPC handler for the worker.
pub struct RpcHandler {
    config: WorkerConfig,
    publisher: Arc<dyn PublishService>,
}

impl RpcHandler {
    /// Create a new RPC handler.
    pub fn new(config: WorkerConfig, publisher: Arc<dyn PublishService>) -> Self {
        Self { config, publisher }
    }

    /// Run the RPC handler, reading from stdin and writing to stdout.
    pub fn run(&self) -> io::Result<()> {
        self.run_with_io(&mut io::stdin().lock(), &mut io::stdout().lock())
    }

    /// Run the RPC handler with custom I/O (for testing).
    pub fn run_with_io<R: BufRead, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
    ) -> io::Result<()> {
        let request = match self.read_request(reader) {
            Ok(req) => req,
            Err(e) => {
                // Parse errors respond with protocol_version 0 because no
                // version was negotiated.
                let response = RpcResponse::error(0, String::new(), e);
                return self.write_response(writer, &response);
            }
        };

        let response = dispatcher::dispatch(&self.config, self.publisher.as_ref(), &request);
        self.write_response(writer, &response)
    }

    fn read_request<R: BufRead>(&self, reader: &mut R) -> Result<RpcRequest, RpcError> {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| RpcError::invalid_request(format!("failed to read request: {}", e)))?;

        serde_json::from_str(&line)
            .map_err(|e| RpcError::invalid_request(format!("invalid JSON: {}", e)))
    }

    fn write_response<W: Write>(&self, writer: &mut W, response: &RpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response)
            .unwrap_or_else(|_| "{\"ok\":false}".to_string());
        writeln!(writer, "{}", json)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::SimulatedPublisher;
    use std::io::Cursor;

    fn run(handler: &RpcHandler, input: &str) -> RpcResponse {
        let mut reader = Cursor::new(input.to_string());
        let mut output = Vec::new();
        handler.run_with_io(&mut reader, &mut output).unwrap();
        serde_json::from_slice(&output).unwrap()
    }

    fn handler() -> RpcHandler {
        RpcHandler::new(WorkerConfig::default(), Arc::new(SimulatedPublisher::new()))
    }

    #[test]
    fn test_probe_round_trip() {
        let input = r#"{"protocol_version":0,"op":"probe","request_id":"r1","payload":{}}"#;
        let response = run(&handler(), input);
        assert!(response.ok);
        assert_eq!(response.request_id, "r1");
        let payload = response.payload.unwrap();
        assert_eq!(payload["protocol_min"], PROTOCOL_MIN);
        assert_eq!(payload["protocol_max"], PROTOCOL_MAX);
    }

    #[test]
    fn test_invalid_json_yields_invalid_request() {
        let response = run(&handler(), "this is not json\n");
        assert!(!response.ok);
        assert_eq!(response.protocol_version, 0);
        assert_eq!(
            response.error.unwrap().code,
            gplay_protocol::ErrorCode::InvalidRequest
        );
    }
}
