//! Operation-specific types.

pub mod probe;
pub mod find_files;
pub mod inspect;
pub mod publish;

pub use probe::{ProbeRequest, ProbeResponse};
pub use find_files::{FindFilesRequest, FindFilesResponse};
pub use inspect::{InspectRequest, InspectResponse};
pub use publish::{
    Artifact, ExpansionFileSet, PublishReceipt, PublishRequest, RecentChange, ReleaseManifest,
};

/// Known operation names.
pub mod names {
    pub const PROBE: &str = "probe";
    pub const FIND_FILES: &str = "find_files";
    pub const INSPECT: &str = "inspect";
    pub const PUBLISH: &str = "publish";
}
