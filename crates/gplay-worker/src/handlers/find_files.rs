//! find_files handler.
//!
//! Resolves comma-separated glob patterns against the worker workspace and
//! returns the matching relative paths in sorted order.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use gplay_protocol::ops::{FindFilesRequest, FindFilesResponse};
use gplay_protocol::RpcError;

use crate::rpc::WorkerConfig;

/// Handle a find_files request.
pub fn handle(config: &WorkerConfig, payload: serde_json::Value) -> Result<serde_json::Value, RpcError> {
    let request: FindFilesRequest = serde_json::from_value(payload)
        .map_err(|e| RpcError::invalid_request(format!("bad find_files payload: {}", e)))?;

    let glob_set = build_glob_set(&request.patterns)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(&config.workspace_root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(&config.workspace_root) {
            Ok(p) => p,
            Err(_) => continue,
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if glob_set.is_match(&relative) {
            paths.push(relative);
        }
    }
    paths.sort();

    serde_json::to_value(FindFilesResponse { paths })
        .map_err(|e| RpcError::invalid_request(e.to_string()))
}

fn build_glob_set(patterns: &str) -> Result<GlobSet, RpcError> {
    let mut builder = GlobSetBuilder::new();
    let mut added = 0;
    for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        // `*` stays within one path component, `**` crosses directories.
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| RpcError::invalid_request(format!("bad pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
        added += 1;
    }
    if added == 0 {
        return Err(RpcError::invalid_request("no patterns specified"));
    }
    builder
        .build()
        .map_err(|e| RpcError::invalid_request(format!("bad pattern set: {}", e)))
}
