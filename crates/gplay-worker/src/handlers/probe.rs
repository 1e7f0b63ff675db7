//! probe handler.

use chrono::Utc;
use gplay_protocol::ops::ProbeResponse;
use gplay_protocol::{RpcError, LANE_VERSION};

use crate::rpc::WorkerConfig;

/// Handle a probe request, describing this worker.
pub fn handle(config: &WorkerConfig) -> Result<serde_json::Value, RpcError> {
    let response = ProbeResponse {
        schema_version: 1,
        created_at: Utc::now(),
        lane_version: LANE_VERSION.to_string(),
        protocol_min: config.protocol_min,
        protocol_max: config.protocol_max,
        features: config.features.clone(),
        workspace_root: config.workspace_root.display().to_string(),
    };

    serde_json::to_value(response).map_err(|e| RpcError::invalid_request(e.to_string()))
}
