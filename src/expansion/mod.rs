//! Expansion file naming and fileset assembly.
//!
//! OBB expansion files must follow the Play naming scheme
//! `main.1234.com.example.app.obb` / `patch.1234.com.example.app.obb`:
//! the type, the version code of the APK the file belongs to, and the
//! application id. A file that does not match is never materialized into
//! an [`ExpansionFile`]; parsing fails instead, and the caller treats that
//! as fatal for the whole upload.

use std::collections::BTreeMap;

use regex_lite::Regex;

use gplay_protocol::ops::ExpansionFileSet;

/// Expansion file type: main.
pub const TYPE_MAIN: &str = "main";
/// Expansion file type: patch.
pub const TYPE_PATCH: &str = "patch";

/// Which slot of a fileset an expansion file occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionFileType {
    Main,
    Patch,
}

impl ExpansionFileType {
    /// The lower-case name used in filenames and the publish payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => TYPE_MAIN,
            Self::Patch => TYPE_PATCH,
        }
    }
}

/// One successfully parsed expansion file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionFile {
    /// Path relative to the workspace root.
    pub relative_path: String,
    /// Main or patch.
    pub file_type: ExpansionFileType,
    /// Version code of the APK this file belongs to.
    pub version_code: u64,
    /// Application id embedded in the filename.
    pub application_id: String,
}

/// Errors raised by filename parsing.
#[derive(Debug, thiserror::Error)]
pub enum ExpansionError {
    #[error("Expansion file '{0}' doesn't match the required naming scheme")]
    NamingScheme(String),
}

/// File name pattern which expansion files must match.
fn obb_file_regex() -> Regex {
    // Type and extension are case-insensitive, mirroring what the Play
    // console accepts.
    Regex::new(r"(?i)^(main|patch)\.([0-9]+)\.([._a-z0-9]+)\.obb$").expect("static regex")
}

/// Parse an expansion file name into its components.
///
/// The pattern applies to the base name; the relative path is preserved in
/// the result and in error messages.
pub fn parse_expansion_file(relative_path: &str) -> Result<ExpansionFile, ExpansionError> {
    let base_name = relative_path.rsplit('/').next().unwrap_or(relative_path);

    let regex = obb_file_regex();
    let captures = regex
        .captures(base_name)
        .ok_or_else(|| ExpansionError::NamingScheme(relative_path.to_string()))?;

    let file_type = match captures[1].to_lowercase().as_str() {
        TYPE_MAIN => ExpansionFileType::Main,
        _ => ExpansionFileType::Patch,
    };

    // The digits capture can still overflow u64 for absurd inputs.
    let version_code: u64 = captures[2]
        .parse()
        .map_err(|_| ExpansionError::NamingScheme(relative_path.to_string()))?;

    Ok(ExpansionFile {
        relative_path: relative_path.to_string(),
        file_type,
        version_code,
        application_id: captures[3].to_string(),
    })
}

/// Fold parsed expansion files into per-version filesets.
///
/// Keyed by version code, ascending. When two files of the same type claim
/// the same version code, the later one wins; this mirrors the grouping
/// order of the original tool and is deliberately not an error.
pub fn assemble_filesets<I>(files: I) -> BTreeMap<u64, ExpansionFileSet>
where
    I: IntoIterator<Item = ExpansionFile>,
{
    let mut sets: BTreeMap<u64, ExpansionFileSet> = BTreeMap::new();
    for file in files {
        let set = sets.entry(file.version_code).or_default();
        match file.file_type {
            ExpansionFileType::Main => set.main = Some(file.relative_path),
            ExpansionFileType::Patch => set.patch = Some(file.relative_path),
        }
    }
    sets
}
