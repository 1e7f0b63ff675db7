//! Artifact locator.
//!
//! Resolves a comma-separated list of glob patterns (`*`, `**`) against a
//! directory tree and returns the matching relative paths in sorted order.
//! Finding nothing is a normal, empty result; the caller decides whether
//! zero matches is an error. Runs wherever the filesystem lives: the
//! in-process dispatcher calls this directly, and the worker applies the
//! same contract on its side of the RPC boundary.

use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

/// Errors raised while compiling patterns or walking the tree.
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("no patterns specified")]
    NoPatterns,

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },

    #[error("failed to walk '{root}': {source}")]
    Walk {
        root: String,
        source: walkdir::Error,
    },
}

/// Compile a comma-separated pattern list into a glob set.
pub fn compile_patterns(patterns: &str) -> Result<GlobSet, LocatorError> {
    let mut builder = GlobSetBuilder::new();
    let mut added = 0;

    for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        // Ant-style wildcards: `*` stays within one path component,
        // `**` crosses directories.
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| LocatorError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        builder.add(glob);
        added += 1;
    }

    if added == 0 {
        return Err(LocatorError::NoPatterns);
    }

    builder.build().map_err(|source| LocatorError::InvalidPattern {
        pattern: patterns.to_string(),
        source,
    })
}

/// Find all files under `root` matching at least one pattern.
///
/// Returned paths are relative to `root`, sorted, with `/` separators.
pub fn find_files(root: &Path, patterns: &str) -> Result<Vec<String>, LocatorError> {
    let glob_set = compile_patterns(patterns)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|source| LocatorError::Walk {
            root: root.display().to_string(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(p) => p,
            Err(_) => continue,
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if glob_set.is_match(&relative) {
            paths.push(relative);
        }
    }

    paths.sort();
    Ok(paths)
}
