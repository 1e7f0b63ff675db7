//! Operation dispatcher.
//!
//! Routes incoming requests to the appropriate operation handler after
//! validating the protocol version.

use gplay_protocol::{ops::names, RpcError, RpcRequest, RpcResponse, PROTOCOL_VERSION_PROBE};

use crate::handlers;
use crate::publisher::PublishService;
use crate::rpc::WorkerConfig;

/// Dispatch a request to the appropriate handler.
///
/// probe accepts only protocol version 0; every other operation requires a
/// negotiated version in `[PROTOCOL_MIN, PROTOCOL_MAX]`.
pub fn dispatch(
    config: &WorkerConfig,
    publisher: &dyn PublishService,
    request: &RpcRequest,
) -> RpcResponse {
    let op = request.op.as_str();
    let request_id = request.request_id.clone();
    let protocol_version = request.protocol_version;

    if op == names::PROBE {
        if protocol_version != PROTOCOL_VERSION_PROBE {
            return RpcResponse::error(
                PROTOCOL_VERSION_PROBE,
                request_id,
                RpcError::unsupported_protocol(protocol_version, 0, 0),
            );
        }
    } else if protocol_version < config.protocol_min || protocol_version > config.protocol_max {
        return RpcResponse::error(
            protocol_version,
            request_id,
            RpcError::unsupported_protocol(protocol_version, config.protocol_min, config.protocol_max),
        );
    }

    let result = match op {
        names::PROBE => handlers::probe::handle(config),
        names::FIND_FILES => handlers::find_files::handle(config, request.payload.clone()),
        names::INSPECT => handlers::inspect::handle(config, request.payload.clone()),
        names::PUBLISH => handlers::publish::handle(publisher, request.payload.clone()),
        _ => Err(RpcError::unknown_operation(op)),
    };

    match result {
        Ok(payload) => RpcResponse::success(protocol_version, request_id, payload),
        Err(error) => RpcResponse::error(protocol_version, request_id, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::SimulatedPublisher;
    use gplay_protocol::ErrorCode;

    fn request(op: &str, protocol_version: i32) -> RpcRequest {
        RpcRequest {
            protocol_version,
            op: op.to_string(),
            request_id: "req-001".to_string(),
            payload: serde_json::json!({}),
        }
    }

    #[test]
    fn test_probe_requires_version_zero() {
        let config = WorkerConfig::default();
        let publisher = SimulatedPublisher::new();

        let response = dispatch(&config, &publisher, &request(names::PROBE, 1));
        assert!(!response.ok);
        assert_eq!(
            response.error.unwrap().code,
            ErrorCode::UnsupportedProtocol
        );

        let response = dispatch(&config, &publisher, &request(names::PROBE, 0));
        assert!(response.ok);
    }

    #[test]
    fn test_non_probe_rejects_version_zero() {
        let config = WorkerConfig::default();
        let publisher = SimulatedPublisher::new();

        let response = dispatch(&config, &publisher, &request(names::FIND_FILES, 0));
        assert!(!response.ok);
        assert_eq!(
            response.error.unwrap().code,
            ErrorCode::UnsupportedProtocol
        );
    }

    #[test]
    fn test_unknown_operation() {
        let config = WorkerConfig::default();
        let publisher = SimulatedPublisher::new();

        let response = dispatch(&config, &publisher, &request("frobnicate", 1));
        assert!(!response.ok);
        assert_eq!(response.error.unwrap().code, ErrorCode::UnknownOperation);
    }
}
