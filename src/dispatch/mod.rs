//! Remote task dispatch.
//!
//! Discovery, inspection and the final publish call must run wherever the
//! build artifacts live. Each is a discrete unit of work behind the
//! [`Dispatcher`] trait: [`InProcessDispatcher`] executes against a local
//! workspace, [`RemoteDispatcher`] serializes the same calls to a worker
//! over a [`Transport`](crate::host::Transport). The pipeline above never
//! knows which one it holds.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use gplay_protocol::ops::{InspectResponse, ProbeResponse, PublishReceipt, PublishRequest};
use gplay_protocol::service::{PublishError, PublishService};
use gplay_protocol::ErrorCode;

use crate::host::rpc::{RpcClient, RpcClientError};
use crate::host::transport::Transport;
use crate::locator::{self, LocatorError};

/// Opaque credential handle, forwarded to the publish call untouched.
///
/// This core never interprets it; only the publishing service does.
#[derive(Clone)]
pub struct CredentialHandle(String);

impl CredentialHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw handle, for building the publish request.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHandle(****)")
    }
}

/// Errors raised by dispatched units of work.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{0}")]
    Locator(#[from] LocatorError),

    #[error("{0}")]
    BadPackage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The publish call failed; the reason comes from the publishing
    /// service and no remote state changed.
    #[error("{0}")]
    Publish(String),

    #[error("{0}")]
    Rpc(#[from] RpcClientError),
}

/// A unit of work executed where the build artifacts live.
pub trait Dispatcher {
    /// Resolve comma-separated glob patterns to sorted relative paths.
    fn find_files(&self, patterns: &str) -> Result<Vec<String>, DispatchError>;

    /// Extract identity metadata from one package.
    fn inspect(&self, relative_path: &str) -> Result<InspectResponse, DispatchError>;

    /// Apply the release manifest, all-or-nothing.
    fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, DispatchError>;
}

/// Dispatcher executing against a workspace on the local filesystem.
pub struct InProcessDispatcher {
    workspace_root: PathBuf,
    publisher: Arc<dyn PublishService>,
}

impl InProcessDispatcher {
    pub fn new(workspace_root: impl Into<PathBuf>, publisher: Arc<dyn PublishService>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            publisher,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}

impl Dispatcher for InProcessDispatcher {
    fn find_files(&self, patterns: &str) -> Result<Vec<String>, DispatchError> {
        Ok(locator::find_files(&self.workspace_root, patterns)?)
    }

    fn inspect(&self, relative_path: &str) -> Result<InspectResponse, DispatchError> {
        let full = self.workspace_root.join(relative_path);
        let metadata = gplay_apk::read_metadata(&full).map_err(|e| {
            DispatchError::BadPackage(format!(
                "'{}' could not be read as an application package: {}",
                relative_path, e
            ))
        })?;

        let bytes = std::fs::read(&full)?;
        Ok(InspectResponse {
            application_id: metadata.application_id,
            version_code: metadata.version_code,
            sha256: hex::encode(Sha256::digest(&bytes)),
        })
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

/// Dispatcher forwarding every unit of work to a remote worker.
pub struct RemoteDispatcher {
    client: RpcClient,
}

impl RemoteDispatcher {
    /// Connect to the worker behind `transport` and negotiate the
    /// protocol. Returns the probe payload alongside the dispatcher.
    pub fn connect(transport: Arc<dyn Transport>) -> Result<(Self, ProbeResponse), RpcClientError> {
        let mut client = RpcClient::new(transport);
        let probe = client.probe()?;
        Ok((Self { client }, probe))
    }
}

impl Dispatcher for RemoteDispatcher {
    fn find_files(&self, patterns: &str) -> Result<Vec<String>, DispatchError> {
        Ok(self.client.find_files(patterns)?)
    }

    fn inspect(&self, relative_path: &str) -> Result<InspectResponse, DispatchError> {
        self.client.inspect(relative_path).map_err(|e| match e {
            RpcClientError::Remote {
                code: ErrorCode::BadPackage,
                message,
            } => DispatchError::BadPackage(message),
            other => DispatchError::Rpc(other),
        })
    }

    fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, DispatchError> {
        self.client.publish(request).map_err(|e| match e {
            RpcClientError::Remote {
                code: ErrorCode::PublishFailed,
                message,
            } => DispatchError::Publish(message),
            other => DispatchError::Rpc(other),
        })
    }
}
