//! Upload pipeline orchestration.
//!
//! The produced interface of the lane: gate on the build status, validate
//! the configuration shape (accumulating every error), discover and
//! inspect the APKs, match expansion files, assemble the release manifest
//! and publish it exactly once through the dispatcher. Every failure is
//! resolved into the summary's report; nothing unwinds past [`UploadPipeline::run`].

use std::collections::{BTreeMap, BTreeSet};

use gplay_protocol::ops::{Artifact, PublishReceipt, PublishRequest, ReleaseManifest};

use crate::config::{Environment, UploadConfig};
use crate::dispatch::{CredentialHandle, DispatchError, Dispatcher};
use crate::expansion::assemble_filesets;
use crate::summary::UploadSummary;
use crate::validate;

/// Result of the build that produced the artifacts.
///
/// Anything worse than unstable short-circuits the upload before any
/// filesystem or network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Success,
    Unstable,
    Failed,
}

impl BuildStatus {
    /// Whether an upload may proceed for this build.
    pub fn allows_upload(&self) -> bool {
        !matches!(self, BuildStatus::Failed)
    }
}

/// Outcome of one upload invocation.
#[derive(Debug)]
pub struct UploadOutcome {
    /// Summary for reporting.
    pub summary: UploadSummary,
    /// Receipt from the publishing service, on success.
    pub receipt: Option<PublishReceipt>,
}

/// The upload pipeline.
pub struct UploadPipeline<'a> {
    dispatcher: &'a dyn Dispatcher,
    verbose: bool,
}

impl<'a> UploadPipeline<'a> {
    /// Create a pipeline over the given dispatcher.
    pub fn new(dispatcher: &'a dyn Dispatcher) -> Self {
        Self {
            dispatcher,
            verbose: false,
        }
    }

    /// Enable progress output on stderr.
    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    /// Run one upload invocation.
    ///
    /// Always returns a definite outcome; infrastructure errors and
    /// validation failures alike end up in the summary's report.
    pub fn run(
        &self,
        config: &UploadConfig,
        env: &Environment,
        credential: &CredentialHandle,
        build_status: BuildStatus,
    ) -> UploadOutcome {
        let run_id = ulid::Ulid::new().to_string();

        if !build_status.allows_upload() {
            if self.verbose {
                eprintln!("Skipping upload to Google Play due to build result");
            }
            return UploadOutcome {
                summary: UploadSummary::skipped(run_id),
                receipt: None,
            };
        }

        match self.execute(config, env, credential) {
            Ok((manifest, receipt)) => UploadOutcome {
                summary: UploadSummary::succeeded(
                    run_id,
                    manifest.application_id.clone(),
                    manifest.track.clone(),
                    manifest.version_codes(),
                ),
                receipt: Some(receipt),
            },
            Err(report) => UploadOutcome {
                summary: UploadSummary::failed(run_id, report),
                receipt: None,
            },
        }
    }

    /// The full flow up to and including the publish call.
    ///
    /// Phase (a) accumulates configuration errors; every later check
    /// aborts on its first failure.
    fn execute(
        &self,
        config: &UploadConfig,
        env: &Environment,
        credential: &CredentialHandle,
    ) -> Result<(ReleaseManifest, PublishReceipt), Vec<String>> {
        let report = validate::check_configuration(config, env);
        if !report.is_empty() {
            return Err(report.into_errors());
        }

        // Present and resolvable after the configuration phase.
        let pattern = config
            .expanded_apk_files_pattern(env)
            .expect("pattern checked by configuration phase");
        let track_name = config
            .canonical_track_name(env)
            .expect("track checked by configuration phase");

        if self.verbose {
            eprintln!("Finding APK files matching '{}'...", pattern);
        }
        let paths = self
            .dispatcher
            .find_files(&pattern)
            .map_err(|e| vec![e.to_string()])?;
        if paths.is_empty() {
            return Err(vec![format!(
                "No APK files matching the pattern '{}' could be found",
                pattern
            )]);
        }

        let mut artifacts = Vec::with_capacity(paths.len());
        for path in &paths {
            if self.verbose {
                eprintln!("Inspecting {}...", path);
            }
            let metadata = self
                .dispatcher
                .inspect(path)
                .map_err(|e| vec![e.to_string()])?;
            artifacts.push(Artifact {
                relative_path: path.clone(),
                application_id: metadata.application_id,
                version_code: metadata.version_code,
                sha256: metadata.sha256,
            });
        }

        let application_id = validate::check_application_ids(&artifacts)?;
        let version_codes: BTreeSet<u64> = artifacts.iter().map(|a| a.version_code).collect();

        let mut expansion_file_sets = BTreeMap::new();
        if let Some(expansion_pattern) = config.expanded_expansion_files_pattern(env) {
            if self.verbose {
                eprintln!("Finding expansion files matching '{}'...", expansion_pattern);
            }
            let expansion_paths = self
                .dispatcher
                .find_files(&expansion_pattern)
                .map_err(|e| vec![e.to_string()])?;

            let mut files = Vec::with_capacity(expansion_paths.len());
            for path in &expansion_paths {
                let file = validate::check_expansion_file(path, &application_id, &version_codes)
                    .map_err(|e| vec![e])?;
                files.push(file);
            }

            expansion_file_sets = assemble_filesets(files);
            validate::check_filesets(
                &expansion_file_sets,
                config.use_previous_expansion_files_if_missing,
            )
            .map_err(|e| vec![e])?;
        }

        let manifest = ReleaseManifest {
            application_id,
            artifacts,
            expansion_file_sets,
            reuse_previous_expansion_files: config.use_previous_expansion_files_if_missing,
            track: track_name,
            rollout_percentage: config.rollout_percentage_value(env),
            recent_changes: config.expanded_recent_changes(env),
        };

        if self.verbose {
            eprintln!(
                "Publishing {} file(s) for {} to the {} track...",
                manifest.artifacts.len(),
                manifest.application_id,
                manifest.track
            );
        }

        let request = PublishRequest {
            manifest: manifest.clone(),
            credential: credential.expose().to_string(),
        };
        let receipt = self.dispatcher.publish(&request).map_err(|e| {
            let reason = match e {
                DispatchError::Publish(reason) => reason,
                other => other.to_string(),
            };
            vec![
                format!("Upload failed: {}", reason),
                "No changes have been applied to the Google Play account".to_string(),
            ]
        })?;

        Ok((manifest, receipt))
    }
}
