//! Error types for the RPC protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes returned in RPC error responses.
///
/// These codes are stable and used for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed JSON, missing required fields, or invalid field values.
    InvalidRequest,
    /// Protocol version is outside the supported range.
    UnsupportedProtocol,
    /// A required feature is not available on this worker.
    FeatureMissing,
    /// Unknown operation requested.
    UnknownOperation,
    /// The requested path does not exist under the worker workspace.
    PathNotFound,
    /// The requested path escapes the worker workspace root.
    PathOutsideWorkspace,
    /// A file could not be read as an Android application package.
    BadPackage,
    /// The publish operation was rejected by the publishing service.
    PublishFailed,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "INVALID_REQUEST"),
            Self::UnsupportedProtocol => write!(f, "UNSUPPORTED_PROTOCOL"),
            Self::FeatureMissing => write!(f, "FEATURE_MISSING"),
            Self::UnknownOperation => write!(f, "UNKNOWN_OPERATION"),
            Self::PathNotFound => write!(f, "PATH_NOT_FOUND"),
            Self::PathOutsideWorkspace => write!(f, "PATH_OUTSIDE_WORKSPACE"),
            Self::BadPackage => write!(f, "BAD_PACKAGE"),
            Self::PublishFailed => write!(f, "PUBLISH_FAILED"),
        }
    }
}

/// RPC error response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    /// Error code from the registry.
    pub code: ErrorCode,
    /// Human-readable, single-line error message.
    /// Must not contain credentials or filesystem paths outside the workspace.
    pub message: String,
    /// Optional machine-readable details (failing field, offending path).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// Create a new RPC error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new RPC error with additional data.
    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create an INVALID_REQUEST error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Create an UNSUPPORTED_PROTOCOL error.
    pub fn unsupported_protocol(version: i32, min: i32, max: i32) -> Self {
        Self::with_data(
            ErrorCode::UnsupportedProtocol,
            format!("protocol_version {} is outside supported range [{}, {}]", version, min, max),
            serde_json::json!({
                "requested": version,
                "min": min,
                "max": max
            }),
        )
    }

    /// Create an UNKNOWN_OPERATION error.
    pub fn unknown_operation(op: &str) -> Self {
        Self::with_data(
            ErrorCode::UnknownOperation,
            format!("unknown operation: {}", op),
            serde_json::json!({ "op": op }),
        )
    }

    /// Create a FEATURE_MISSING error.
    pub fn feature_missing(feature: &str) -> Self {
        Self::with_data(
            ErrorCode::FeatureMissing,
            format!("feature '{}' is not available on this worker", feature),
            serde_json::json!({ "feature": feature }),
        )
    }

    /// Create a PATH_NOT_FOUND error.
    pub fn path_not_found(path: &str) -> Self {
        Self::with_data(
            ErrorCode::PathNotFound,
            format!("path '{}' not found in workspace", path),
            serde_json::json!({ "path": path }),
        )
    }

    /// Create a PATH_OUTSIDE_WORKSPACE error.
    pub fn path_outside_workspace(path: &str) -> Self {
        Self::with_data(
            ErrorCode::PathOutsideWorkspace,
            format!("path '{}' escapes the workspace root", path),
            serde_json::json!({ "path": path }),
        )
    }

    /// Create a BAD_PACKAGE error.
    pub fn bad_package(path: &str, reason: &str) -> Self {
        Self::with_data(
            ErrorCode::BadPackage,
            format!("'{}' could not be read as an application package: {}", path, reason),
            serde_json::json!({ "path": path }),
        )
    }

    /// Create a PUBLISH_FAILED error.
    pub fn publish_failed(reason: &str) -> Self {
        Self::new(ErrorCode::PublishFailed, reason)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::BadPackage).unwrap();
        assert_eq!(json, "\"BAD_PACKAGE\"");
        let code: ErrorCode = serde_json::from_str("\"PUBLISH_FAILED\"").unwrap();
        assert_eq!(code, ErrorCode::PublishFailed);
    }

    #[test]
    fn test_unsupported_protocol_data() {
        let err = RpcError::unsupported_protocol(5, 1, 1);
        assert_eq!(err.code, ErrorCode::UnsupportedProtocol);
        let data = err.data.unwrap();
        assert_eq!(data["requested"], 5);
        assert_eq!(data["max"], 1);
    }

    #[test]
    fn test_display_includes_code() {
        let err = RpcError::bad_package("app.apk", "not a zip");
        let text = err.to_string();
        assert!(text.starts_with("BAD_PACKAGE:"));
        assert!(text.contains("app.apk"));
    }
}
