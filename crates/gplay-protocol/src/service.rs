//! Publishing service interface.
//!
//! The publish operation is the single network-facing call the lane makes.
//! The wire client for the Play Developer API lives behind this trait; the
//! lane itself only depends on the transactional contract: `Err` means no
//! remote state changed.

use crate::ops::{PublishReceipt, PublishRequest};

/// Errors raised by the publishing service.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The service refused the release (bad manifest, policy violation).
    #[error("publishing service rejected the release: {0}")]
    Rejected(String),

    /// The service could not be reached or failed mid-call.
    #[error("publishing service unavailable: {0}")]
    Unavailable(String),
}

/// The remote publish collaborator.
pub trait PublishService: Send + Sync {
    /// Apply the manifest to the service, all-or-nothing.
    fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError>;
}
