//! Probe operation types.
//!
//! Probe negotiates the protocol version and describes the worker's
//! workspace before any other operation is issued.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Probe request payload (typically empty).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeRequest {}

/// Probe response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResponse {
    /// Schema version for this payload.
    pub schema_version: i32,
    /// When this snapshot was created.
    pub created_at: DateTime<Utc>,
    /// Lane version running on the worker.
    pub lane_version: String,
    /// Minimum protocol version supported.
    pub protocol_min: i32,
    /// Maximum protocol version supported.
    pub protocol_max: i32,
    /// Feature flags supported by this worker.
    pub features: Vec<String>,
    /// Absolute path of the workspace root the worker serves files from.
    pub workspace_root: String,
}
