//! Operation handlers.
//!
//! Each handler takes the decoded request payload and the worker context,
//! and returns either a JSON success payload or a protocol error.

pub mod find_files;
pub mod inspect;
pub mod probe;
pub mod publish;
