//! find_files operation types.

use serde::{Deserialize, Serialize};

/// find_files request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindFilesRequest {
    /// Comma-separated glob patterns, relative to the workspace root.
    pub patterns: String,
}

/// find_files response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindFilesResponse {
    /// Matching relative paths, sorted, using `/` separators.
    pub paths: Vec<String>,
}
