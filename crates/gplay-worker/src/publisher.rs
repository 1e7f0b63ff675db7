//! Publishing service boundary.
//!
//! The worker never speaks the Play Developer API wire protocol itself;
//! it drives a [`PublishService`] implementation. [`SimulatedPublisher`]
//! is the in-memory stand-in used by tests and dry runs: it re-checks the
//! constraints the real service enforces and records applied releases.

use std::sync::Mutex;

use chrono::Utc;
use gplay_protocol::ops::{PublishReceipt, PublishRequest};

pub use gplay_protocol::service::{PublishError, PublishService};

/// One release accepted by the simulated service.
#[derive(Debug, Clone)]
pub struct AppliedRelease {
    pub application_id: String,
    pub track: String,
    pub version_codes: Vec<u64>,
    pub reuse_previous_expansion_files: bool,
}

/// In-memory publishing service.
///
/// Enforces the same coherence rules the remote service would before
/// recording anything, so a rejected manifest leaves the state untouched.
pub struct SimulatedPublisher {
    applied: Mutex<Vec<AppliedRelease>>,
    fail_next: Mutex<Option<String>>,
}

impl SimulatedPublisher {
    pub fn new() -> Self {
        Self {
            applied: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// Make the next publish call fail with the given reason.
    pub fn inject_failure(&self, reason: &str) {
        *self.fail_next.lock().unwrap() = Some(reason.to_string());
    }

    /// Releases accepted so far.
    pub fn applied(&self) -> Vec<AppliedRelease> {
        self.applied.lock().unwrap().clone()
    }
}

impl Default for SimulatedPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishService for SimulatedPublisher {
    fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        if let Some(reason) = self.fail_next.lock().unwrap().take() {
            return Err(PublishError::Unavailable(reason));
        }

        let manifest = &request.manifest;
        if request.credential.is_empty() {
            return Err(PublishError::Rejected("missing credential".to_string()));
        }
        if manifest.artifacts.is_empty() {
            return Err(PublishError::Rejected("release contains no packages".to_string()));
        }
        for artifact in &manifest.artifacts {
            if artifact.application_id != manifest.application_id {
                return Err(PublishError::Rejected(format!(
                    "package '{}' does not belong to {}",
                    artifact.relative_path, manifest.application_id
                )));
            }
        }

        let version_codes = manifest.version_codes();
        for (version_code, set) in &manifest.expansion_file_sets {
            if !version_codes.contains(version_code) {
                return Err(PublishError::Rejected(format!(
                    "expansion fileset references unknown version code {}",
                    version_code
                )));
            }
            if set.patch_without_main() && !manifest.reuse_previous_expansion_files {
                return Err(PublishError::Rejected(format!(
                    "version code {} has a patch file but no main file",
                    version_code
                )));
            }
        }

        self.applied.lock().unwrap().push(AppliedRelease {
            application_id: manifest.application_id.clone(),
            track: manifest.track.clone(),
            version_codes: version_codes.clone(),
            reuse_previous_expansion_files: manifest.reuse_previous_expansion_files,
        });

        let staged = if manifest.track == "production" {
            Some(manifest.rollout_percentage)
        } else {
            None
        };

        Ok(PublishReceipt {
            application_id: manifest.application_id.clone(),
            track: manifest.track.clone(),
            version_codes,
            staged_rollout_percentage: staged,
            completed_at: Utc::now(),
        })
    }
}
