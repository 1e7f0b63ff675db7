//! publish handler.
//!
//! The single externally-observable side effect of the lane. Delegates to
//! the configured [`PublishService`]; a failure here means no remote state
//! changed.

use gplay_protocol::ops::PublishRequest;
use gplay_protocol::RpcError;

use crate::publisher::{PublishError, PublishService};

/// Handle a publish request.
pub fn handle(
    publisher: &dyn PublishService,
    payload: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let request: PublishRequest = serde_json::from_value(payload)
        .map_err(|e| RpcError::invalid_request(format!("bad publish payload: {}", e)))?;

    let receipt = publisher.publish(&request).map_err(|e| match e {
        PublishError::Rejected(reason) => RpcError::publish_failed(&reason),
        PublishError::Unavailable(reason) => RpcError::publish_failed(&reason),
    })?;

    serde_json::to_value(receipt).map_err(|e| RpcError::invalid_request(e.to_string()))
}
