//! publish operation types.
//!
//! The release manifest is the single unit handed to the publishing
//! service: one application id, the ordered packages, the per-version
//! expansion filesets and the rollout configuration. The publish call is
//! all-or-nothing; a failed call leaves no remote state behind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// One application package included in a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Path relative to the workspace root.
    pub relative_path: String,
    /// Application id extracted from the package manifest.
    pub application_id: String,
    /// Version code extracted from the package manifest.
    pub version_code: u64,
    /// SHA-256 hex digest of the package bytes.
    pub sha256: String,
}

/// The main/patch expansion-file pairing for one version code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionFileSet {
    /// Relative path of the main expansion file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    /// Relative path of the patch expansion file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl ExpansionFileSet {
    /// True when a patch file is present without a main file.
    pub fn patch_without_main(&self) -> bool {
        self.patch.is_some() && self.main.is_none()
    }
}

/// A localized release-notes entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentChange {
    /// Play language code, e.g. "en-GB".
    pub language: String,
    /// Release notes text for that language.
    pub text: String,
}

/// The validated per-version release manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// The single application id shared by every artifact.
    pub application_id: String,
    /// Packages to upload, in discovery order.
    pub artifacts: Vec<Artifact>,
    /// Expansion filesets keyed by version code, ascending.
    #[serde(default)]
    pub expansion_file_sets: BTreeMap<u64, ExpansionFileSet>,
    /// Whether missing main files may be resolved from the newest
    /// previously-uploaded expansion file on the service side.
    pub reuse_previous_expansion_files: bool,
    /// Resolved release track config value (lower-case).
    pub track: String,
    /// Rollout percentage; only meaningful for the production track.
    pub rollout_percentage: f64,
    /// Localized release notes.
    #[serde(default)]
    pub recent_changes: Vec<RecentChange>,
}

impl ReleaseManifest {
    /// Version codes covered by this manifest, ascending.
    pub fn version_codes(&self) -> Vec<u64> {
        let mut codes: Vec<u64> = self.artifacts.iter().map(|a| a.version_code).collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}

/// publish request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    /// The validated release manifest.
    pub manifest: ReleaseManifest,
    /// Opaque credential handle, forwarded to the publishing service
    /// without interpretation.
    pub credential: String,
}

/// publish response payload, returned by the publishing service on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Application id the release was applied to.
    pub application_id: String,
    /// Track the release was assigned to.
    pub track: String,
    /// Version codes now active on the track.
    pub version_codes: Vec<u64>,
    /// Rollout fraction applied, when the track was production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staged_rollout_percentage: Option<f64>,
    /// When the service acknowledged the release.
    pub completed_at: DateTime<Utc>,
}
