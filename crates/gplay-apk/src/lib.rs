//! APK identity metadata extraction.
//!
//! An APK is a ZIP container whose `AndroidManifest.xml` entry is stored in
//! the Android binary XML format. This crate opens the container, locates
//! the manifest and returns the two identity fields the upload lane needs:
//! the application id (`package` attribute) and the version code
//! (`android:versionCode`). Anything malformed is a fatal [`ApkError`];
//! there is no partial or best-effort metadata.

mod axml;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use zip::result::ZipError;

/// Identity metadata read from a package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApkMetadata {
    /// Application id declared by the `package` attribute.
    pub application_id: String,
    /// Version code declared by `android:versionCode`.
    pub version_code: u64,
}

/// Errors raised while reading a package.
#[derive(Debug, thiserror::Error)]
pub enum ApkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a readable ZIP archive: {0}")]
    Zip(#[from] ZipError),

    #[error("package contains no AndroidManifest.xml")]
    ManifestMissing,

    #[error("malformed binary manifest: {0}")]
    Malformed(String),

    #[error("manifest is missing the '{0}' attribute")]
    MissingAttribute(&'static str),
}

/// Read the application id and version code out of an APK on disk.
pub fn read_metadata(path: &Path) -> Result<ApkMetadata, ApkError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

    let mut entry = archive.by_name("AndroidManifest.xml").map_err(|e| match e {
        ZipError::FileNotFound => ApkError::ManifestMissing,
        other => ApkError::Zip(other),
    })?;

    let mut data = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut data)?;

    axml::parse_manifest(&data)
}

/// Parse manifest bytes already extracted from a container.
///
/// Exposed for callers that hold the binary manifest in memory.
pub fn parse_manifest_bytes(data: &[u8]) -> Result<ApkMetadata, ApkError> {
    axml::parse_manifest(data)
}
