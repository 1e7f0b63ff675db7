//! inspect operation types.

use serde::{Deserialize, Serialize};

/// inspect request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectRequest {
    /// Relative path of the package to inspect.
    pub path: String,
}

/// inspect response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectResponse {
    /// Application id declared by the package manifest.
    pub application_id: String,
    /// Version code declared by the package manifest.
    pub version_code: u64,
    /// SHA-256 hex digest of the package bytes.
    pub sha256: String,
}
