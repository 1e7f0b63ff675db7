//! inspect handler.
//!
//! Opens one matched package under the workspace root and returns its
//! identity metadata plus a content digest. Malformed packages are fatal;
//! there is no partial metadata.

use std::path::{Component, Path};

use sha2::{Digest, Sha256};

use gplay_protocol::ops::{InspectRequest, InspectResponse};
use gplay_protocol::RpcError;

use crate::rpc::WorkerConfig;

/// Handle an inspect request.
pub fn handle(config: &WorkerConfig, payload: serde_json::Value) -> Result<serde_json::Value, RpcError> {
    let request: InspectRequest = serde_json::from_value(payload)
        .map_err(|e| RpcError::invalid_request(format!("bad inspect payload: {}", e)))?;

    if !is_workspace_relative(Path::new(&request.path)) {
        return Err(RpcError::path_outside_workspace(&request.path));
    }

    let full = config.workspace_root.join(&request.path);
    if !full.is_file() {
        return Err(RpcError::path_not_found(&request.path));
    }

    let metadata = gplay_apk::read_metadata(&full)
        .map_err(|e| RpcError::bad_package(&request.path, &e.to_string()))?;

    let bytes = std::fs::read(&full)
        .map_err(|e| RpcError::bad_package(&request.path, &e.to_string()))?;
    let sha256 = hex::encode(Sha256::digest(&bytes));

    let response = InspectResponse {
        application_id: metadata.application_id,
        version_code: metadata.version_code,
        sha256,
    };
    serde_json::to_value(response).map_err(|e| RpcError::invalid_request(e.to_string()))
}

/// A request path must stay inside the workspace: relative, no `..`.
fn is_workspace_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
