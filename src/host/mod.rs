//! Host-side worker communication.
//!
//! The transport executes one serialized RPC against the worker that owns
//! the build artifacts; the client layers protocol negotiation and typed
//! operations on top.

pub mod rpc;
pub mod transport;

pub use rpc::{RpcClient, RpcClientError};
pub use transport::{SshConfig, SshTransport, Transport, TransportError};
