//! Upload summary.
//!
//! One JSON document per upload invocation recording what happened: the
//! outcome, the application and versions involved, and the error report
//! when the upload did not go through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version for [`UploadSummary`].
pub const SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Terminal status of an upload invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// The manifest was accepted by the publishing service.
    Succeeded,
    /// Validation or the publish call failed; nothing was uploaded.
    Failed,
    /// The upload was skipped because the build was not successful.
    Skipped,
}

impl Status {
    /// Process exit code for this status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Status::Succeeded | Status::Skipped => 0,
            Status::Failed => 1,
        }
    }
}

/// Summary of one upload invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    /// Schema version.
    pub schema_version: u32,
    /// Run identifier (ULID).
    pub run_id: String,
    /// When the invocation finished.
    pub created_at: DateTime<Utc>,
    /// Terminal status.
    pub status: Status,
    /// Application id, when discovery got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    /// Resolved track, when configuration was valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    /// Version codes covered by the upload.
    #[serde(default)]
    pub version_codes: Vec<u64>,
    /// Error report lines, in the order they were found.
    #[serde(default)]
    pub report: Vec<String>,
}

impl UploadSummary {
    /// A successful upload.
    pub fn succeeded(
        run_id: String,
        application_id: String,
        track: String,
        version_codes: Vec<u64>,
    ) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            run_id,
            created_at: Utc::now(),
            status: Status::Succeeded,
            application_id: Some(application_id),
            track: Some(track),
            version_codes,
            report: Vec::new(),
        }
    }

    /// A failed upload with its error report.
    pub fn failed(run_id: String, report: Vec<String>) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            run_id,
            created_at: Utc::now(),
            status: Status::Failed,
            application_id: None,
            track: None,
            version_codes: Vec::new(),
            report,
        }
    }

    /// An upload skipped because of the build status.
    pub fn skipped(run_id: String) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            run_id,
            created_at: Utc::now(),
            status: Status::Skipped,
            application_id: None,
            track: None,
            version_codes: Vec::new(),
            report: Vec::new(),
        }
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
