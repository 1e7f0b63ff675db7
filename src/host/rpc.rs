//! Host RPC client.
//!
//! Wraps a [`Transport`] with protocol negotiation and typed operations.
//! `probe()` must run first; it selects the protocol version every later
//! call is issued under.

use std::sync::Arc;

use gplay_protocol::ops::{
    names, FindFilesRequest, FindFilesResponse, InspectRequest, InspectResponse, ProbeResponse,
    PublishReceipt, PublishRequest,
};
use gplay_protocol::{
    ErrorCode, RpcRequest, PROTOCOL_MAX, PROTOCOL_MIN, PROTOCOL_VERSION_PROBE,
};

use super::transport::{Transport, TransportError};

/// RPC client errors.
#[derive(Debug, thiserror::Error)]
pub enum RpcClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("worker incompatible: {0}")]
    WorkerIncompatible(String),

    #[error("version negotiation failed: host [{host_min},{host_max}] vs worker [{worker_min},{worker_max}]")]
    VersionNegotiationFailed {
        host_min: i32,
        host_max: i32,
        worker_min: i32,
        worker_max: i32,
    },

    #[error("{code}: {message}")]
    Remote { code: ErrorCode, message: String },
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcClientError>;

/// Host RPC client.
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    /// Negotiated protocol version (set after probe).
    negotiated_version: Option<i32>,
    host_protocol_min: i32,
    host_protocol_max: i32,
}

impl RpcClient {
    /// Create a new RPC client with the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            negotiated_version: None,
            host_protocol_min: PROTOCOL_MIN,
            host_protocol_max: PROTOCOL_MAX,
        }
    }

    fn next_request_id(&self) -> String {
        format!("req-{}", uuid::Uuid::new_v4())
    }

    fn negotiated(&self) -> RpcResult<i32> {
        self.negotiated_version.ok_or_else(|| {
            RpcClientError::Protocol("protocol version not negotiated - call probe() first".to_string())
        })
    }

    fn call(&self, op: &str, protocol_version: i32, payload: serde_json::Value) -> RpcResult<serde_json::Value> {
        let request = RpcRequest {
            protocol_version,
            op: op.to_string(),
            request_id: self.next_request_id(),
            payload,
        };

        let response = self.transport.execute(&request)?;

        if response.request_id != request.request_id {
            return Err(RpcClientError::Protocol(format!(
                "response correlates to '{}', expected '{}'",
                response.request_id, request.request_id
            )));
        }

        if response.ok {
            response
                .payload
                .ok_or_else(|| RpcClientError::Protocol("success response without payload".to_string()))
        } else {
            let error = response
                .error
                .ok_or_else(|| RpcClientError::Protocol("error response without error".to_string()))?;
            match error.code {
                ErrorCode::UnsupportedProtocol | ErrorCode::FeatureMissing => {
                    Err(RpcClientError::WorkerIncompatible(error.message))
                }
                code => Err(RpcClientError::Remote {
                    code,
                    message: error.message,
                }),
            }
        }
    }

    /// Probe the worker and negotiate the protocol version.
    pub fn probe(&mut self) -> RpcResult<ProbeResponse> {
        let payload = self.call(names::PROBE, PROTOCOL_VERSION_PROBE, serde_json::json!({}))?;
        let probe: ProbeResponse = serde_json::from_value(payload)
            .map_err(|e| RpcClientError::Protocol(format!("bad probe payload: {}", e)))?;

        let version = self.host_protocol_max.min(probe.protocol_max);
        if version < self.host_protocol_min || version < probe.protocol_min {
            return Err(RpcClientError::VersionNegotiationFailed {
                host_min: self.host_protocol_min,
                host_max: self.host_protocol_max,
                worker_min: probe.protocol_min,
                worker_max: probe.protocol_max,
            });
        }

        self.negotiated_version = Some(version);
        Ok(probe)
    }

    /// Find files matching the comma-separated patterns.
    pub fn find_files(&self, patterns: &str) -> RpcResult<Vec<String>> {
        let payload = serde_json::to_value(FindFilesRequest {
            patterns: patterns.to_string(),
        })
        .map_err(|e| RpcClientError::Protocol(e.to_string()))?;

        let value = self.call(names::FIND_FILES, self.negotiated()?, payload)?;
        let response: FindFilesResponse = serde_json::from_value(value)
            .map_err(|e| RpcClientError::Protocol(format!("bad find_files payload: {}", e)))?;
        Ok(response.paths)
    }

    /// Inspect one package.
    pub fn inspect(&self, path: &str) -> RpcResult<InspectResponse> {
        let payload = serde_json::to_value(InspectRequest {
            path: path.to_string(),
        })
        .map_err(|e| RpcClientError::Protocol(e.to_string()))?;

        let value = self.call(names::INSPECT, self.negotiated()?, payload)?;
        serde_json::from_value(value)
            .map_err(|e| RpcClientError::Protocol(format!("bad inspect payload: {}", e)))
    }

    /// Publish the release manifest. Called exactly once per upload.
    pub fn publish(&self, request: &PublishRequest) -> RpcResult<PublishReceipt> {
        let payload = serde_json::to_value(request)
            .map_err(|e| RpcClientError::Protocol(e.to_string()))?;

        let value = self.call(names::PUBLISH, self.negotiated()?, payload)?;
        serde_json::from_value(value)
            .map_err(|e| RpcClientError::Protocol(format!("bad publish payload: {}", e)))
    }
}
