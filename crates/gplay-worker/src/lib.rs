//! Upload Lane Worker
//!
//! Executes discovery, inspection and publish operations against the
//! workspace that physically holds the build artifacts. Invoked as an SSH
//! forced command: one JSON request on stdin, one JSON response on stdout.

pub mod dispatcher;
pub mod handlers;
pub mod publisher;
pub mod rpc;

pub use publisher::{AppliedRelease, PublishError, PublishService, SimulatedPublisher};
pub use rpc::{RpcHandler, WorkerConfig};
