//! Mocks for pipeline tests.
//!
//! [`MockWorkspace`] is an in-memory stand-in for a build workspace: a set
//! of relative paths, a table of package metadata, and a recording
//! publisher. It implements [`Dispatcher`] directly so pipeline behavior
//! can be exercised without touching a filesystem or a worker process.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use sha2::{Digest, Sha256};

use gplay_protocol::ops::{InspectResponse, PublishReceipt, PublishRequest};
use gplay_protocol::service::{PublishError, PublishService};

use crate::dispatch::{DispatchError, Dispatcher};
use crate::locator;

/// Publishing service that records every request it accepts.
pub struct RecordingPublisher {
    requests: Mutex<Vec<PublishRequest>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        }
    }

    /// Make the next publish call fail with the given reason.
    pub fn fail_with(&self, reason: &str) {
        *self.fail_with.lock().unwrap() = Some(reason.to_string());
    }

    /// Requests accepted so far.
    pub fn requests(&self) -> Vec<PublishRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishService for RecordingPublisher {
    fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        if let Some(reason) = self.fail_with.lock().unwrap().take() {
            return Err(PublishError::Unavailable(reason));
        }

        let manifest = &request.manifest;
        self.requests.lock().unwrap().push(request.clone());

        Ok(PublishReceipt {
            application_id: manifest.application_id.clone(),
            track: manifest.track.clone(),
            version_codes: manifest.version_codes(),
            staged_rollout_percentage: (manifest.track == "production")
                .then_some(manifest.rollout_percentage),
            completed_at: Utc::now(),
        })
    }
}

/// In-memory workspace implementing [`Dispatcher`].
pub struct MockWorkspace {
    files: BTreeSet<String>,
    packages: BTreeMap<String, (String, u64)>,
    publisher: Arc<RecordingPublisher>,
    inspect_counts: Mutex<HashMap<String, u32>>,
}

impl MockWorkspace {
    pub fn new() -> Self {
        Self {
            files: BTreeSet::new(),
            packages: BTreeMap::new(),
            publisher: Arc::new(RecordingPublisher::new()),
            inspect_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Add a plain file.
    pub fn with_file(mut self, path: &str) -> Self {
        self.files.insert(path.to_string());
        self
    }

    /// Add a package with the given identity metadata.
    pub fn with_package(mut self, path: &str, application_id: &str, version_code: u64) -> Self {
        self.files.insert(path.to_string());
        self.packages
            .insert(path.to_string(), (application_id.to_string(), version_code));
        self
    }

    /// The recording publisher backing `publish`.
    pub fn publisher(&self) -> Arc<RecordingPublisher> {
        self.publisher.clone()
    }

    /// How many times a path was inspected.
    pub fn inspect_count(&self, path: &str) -> u32 {
        self.inspect_counts
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for MockWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for MockWorkspace {
    fn find_files(&self, patterns: &str) -> Result<Vec<String>, DispatchError> {
        let glob_set = locator::compile_patterns(patterns)?;
        Ok(self
            .files
            .iter()
            .filter(|path| glob_set.is_match(path.as_str()))
            .cloned()
            .collect())
    }

    fn inspect(&self, relative_path: &str) -> Result<InspectResponse, DispatchError> {
        *self
            .inspect_counts
            .lock()
            .unwrap()
            .entry(relative_path.to_string())
            .or_insert(0) += 1;

        if !self.files.contains(relative_path) {
            return Err(DispatchError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", relative_path),
            )));
        }

        match self.packages.get(relative_path) {
            Some((application_id, version_code)) => Ok(InspectResponse {
                application_id: application_id.clone(),
                version_code: *version_code,
                sha256: hex::encode(Sha256::digest(relative_path.as_bytes())),
            }),
            None => Err(DispatchError::BadPackage(format!(
                "'{}' could not be read as an application package: no manifest",
                relative_path
            ))),
        }
    }

    fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, DispatchError> {
        self.publisher.publish(request).map_err(|e| {
            let reason = match e {
                PublishError::Rejected(reason) => reason,
                PublishError::Unavailable(reason) => reason,
            };
            DispatchError::Publish(reason)
        })
    }
}
