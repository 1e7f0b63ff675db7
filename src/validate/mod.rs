//! Release validation.
//!
//! Checks run in two phases with deliberately different failure modes:
//!
//! 1. *Configuration shape* (pattern present, track resolvable, rollout
//!    percentage legal): every failure is accumulated into one
//!    [`ValidationReport`] so a misconfigured job surfaces all its
//!    problems in a single pass, before any filesystem activity.
//! 2. *Artifact matching* (application-id consistency, expansion file
//!    naming/ownership, fileset completeness): the first failure aborts,
//!    because a file set that cannot be trusted makes every later
//!    grouping decision meaningless.

use std::collections::BTreeSet;
use std::fmt;

use regex_lite::Regex;

use gplay_protocol::ops::{Artifact, ExpansionFileSet, RecentChange};

use crate::config::{Environment, UploadConfig};
use crate::expansion::{parse_expansion_file, ExpansionFile};
use crate::track::{format_percentage, is_allowed_rollout_percentage, ReleaseTrack};

/// Ordered list of human-readable validation errors.
///
/// Empty report ⇒ the configuration and artifacts are acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one error.
    pub fn push(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The accumulated error lines, in the order they were found.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Consume the report, yielding the error lines.
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {}", error)?;
        }
        Ok(())
    }
}

/// Phase 1: configuration-shape checks, all failures accumulated.
pub fn check_configuration(config: &UploadConfig, env: &Environment) -> ValidationReport {
    let mut report = ValidationReport::new();

    if config.apk_files_pattern().is_none() {
        report.push("Path or pattern to APK file was not specified");
    }

    match config.canonical_track_name(env) {
        None => report.push("Release track was not specified"),
        Some(name) => match name.parse::<ReleaseTrack>() {
            Err(e) => report.push(e.to_string()),
            Ok(ReleaseTrack::Production) => {
                let pct = config.rollout_percentage_value(env);
                if !is_allowed_rollout_percentage(pct) {
                    report.push(format!(
                        "{}% is not a valid rollout percentage",
                        format_percentage(pct)
                    ));
                }
            }
            // Non-production tracks ignore the rollout percentage.
            Ok(_) => {}
        },
    }

    report
}

/// Phase 2: the single application id shared by all artifacts.
///
/// Returns the id on success; on failure, the error lines listing every
/// distinct id found, sorted.
pub fn check_application_ids(artifacts: &[Artifact]) -> Result<String, Vec<String>> {
    let distinct: BTreeSet<&str> = artifacts
        .iter()
        .map(|a| a.application_id.as_str())
        .collect();

    if distinct.len() == 1 {
        return Ok(distinct.into_iter().next().expect("non-empty").to_string());
    }

    let mut lines =
        vec!["Multiple APKs were found but they have inconsistent application IDs:".to_string()];
    for id in distinct {
        lines.push(format!("- {}", id));
    }
    Err(lines)
}

/// Phase 2: parse one expansion file and check it belongs to this upload.
///
/// Fatal on the first of: bad naming scheme, foreign application id,
/// version code not among the APKs being uploaded.
pub fn check_expansion_file(
    relative_path: &str,
    application_id: &str,
    version_codes: &BTreeSet<u64>,
) -> Result<ExpansionFile, String> {
    let file = parse_expansion_file(relative_path).map_err(|e| e.to_string())?;

    if file.application_id != application_id {
        return Err(format!(
            "Expansion filename '{}' doesn't match the application ID to be uploaded: {}",
            relative_path, application_id
        ));
    }

    if !version_codes.contains(&file.version_code) {
        let codes: Vec<String> = version_codes.iter().map(u64::to_string).collect();
        return Err(format!(
            "Expansion filename '{}' doesn't match the versionCode of any of the APK(s) to be uploaded: {}",
            relative_path,
            codes.join(", ")
        ));
    }

    Ok(file)
}

/// Phase 2: every fileset with a patch file needs a main file, unless the
/// service may reuse the newest previously-uploaded main file.
pub fn check_filesets(
    filesets: &std::collections::BTreeMap<u64, ExpansionFileSet>,
    use_previous_if_missing: bool,
) -> Result<(), String> {
    if use_previous_if_missing {
        return Ok(());
    }

    for set in filesets.values() {
        if set.patch_without_main() {
            let patch = set.patch.as_deref().expect("patch present");
            let name = patch.rsplit('/').next().unwrap_or(patch);
            return Err(format!(
                "Patch expansion file '{}' was provided, but no main expansion file was \
                 provided, and the option to reuse a pre-existing expansion file was disabled. \
                 Google Play requires that each APK with a patch file also has a main file.",
                name
            ));
        }
    }

    Ok(())
}

/// Advisory range check on the configured rollout percentage, mirroring
/// the form-level check of the original configuration UI: whatever the
/// track, a configured value should lie between 0.5 and 100.
///
/// `None` when no percentage is configured or the value is in range.
pub fn check_rollout_range(config: &UploadConfig, env: &Environment) -> Option<String> {
    crate::config::fix_empty_and_trim(config.rollout_percentage.as_deref())?;
    let pct = config.rollout_percentage_value(env);
    if (0.5..=100.0).contains(&pct) {
        return None;
    }
    Some(format!(
        "Percentage value must be between {} and {}%",
        format_percentage(0.5),
        format_percentage(100.0)
    ))
}

/// Advisory checks on release notes, surfaced by `gplay-upload validate`.
///
/// These mirror the form-level checks of the configuration UI and do not
/// gate an upload.
pub fn check_recent_changes(changes: &[RecentChange]) -> Vec<String> {
    let language = Regex::new(r"^[a-z]{2,3}(-[A-Za-z]{2})?$").expect("static regex");
    let mut warnings = Vec::new();

    for change in changes {
        if !language.is_match(&change.language) {
            warnings.push(format!(
                "Recent-changes language '{}' should be a language code like 'be' or 'en-GB'",
                change.language
            ));
        }
        if change.text.chars().count() > 500 {
            warnings.push(format!(
                "Recent changes text for '{}' must be 500 characters or fewer",
                change.language
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::assemble_filesets;
    use crate::expansion::ExpansionFileType;

    fn artifact(application_id: &str, version_code: u64) -> Artifact {
        Artifact {
            relative_path: format!("app-{}.apk", version_code),
            application_id: application_id.to_string(),
            version_code,
            sha256: "ab".repeat(32),
        }
    }

    fn production_config(pct: &str) -> UploadConfig {
        UploadConfig {
            apk_files_pattern: Some("**/*.apk".to_string()),
            track_name: Some("production".to_string()),
            rollout_percentage: Some(pct.to_string()),
            ..UploadConfig::default()
        }
    }

    #[test]
    fn test_configuration_accumulates_all_errors() {
        let config = UploadConfig {
            track_name: Some("staging".to_string()),
            ..UploadConfig::default()
        };
        let report = check_configuration(&config, &Environment::new());
        assert_eq!(report.errors().len(), 2);
        assert_eq!(report.errors()[0], "Path or pattern to APK file was not specified");
        assert_eq!(report.errors()[1], "'staging' is not a valid release track");
    }

    #[test]
    fn test_missing_track_reported() {
        let config = UploadConfig {
            apk_files_pattern: Some("*.apk".to_string()),
            ..UploadConfig::default()
        };
        let report = check_configuration(&config, &Environment::new());
        assert_eq!(report.errors(), ["Release track was not specified"]);
    }

    #[test]
    fn test_production_rollout_must_be_in_fixed_set() {
        let report = check_configuration(&production_config("15%"), &Environment::new());
        assert_eq!(report.errors(), ["15% is not a valid rollout percentage"]);

        let report = check_configuration(&production_config("0.5%"), &Environment::new());
        assert!(report.is_empty());

        // Unparseable input defaults to 100, which is allowed.
        let report = check_configuration(&production_config("whenever"), &Environment::new());
        assert!(report.is_empty());
    }

    #[test]
    fn test_non_production_ignores_rollout() {
        let config = UploadConfig {
            apk_files_pattern: Some("*.apk".to_string()),
            track_name: Some("beta".to_string()),
            rollout_percentage: Some("15%".to_string()),
            ..UploadConfig::default()
        };
        let report = check_configuration(&config, &Environment::new());
        assert!(report.is_empty());
    }

    #[test]
    fn test_single_application_id() {
        let artifacts = vec![artifact("com.x", 1), artifact("com.x", 2)];
        assert_eq!(check_application_ids(&artifacts).unwrap(), "com.x");
    }

    #[test]
    fn test_mixed_application_ids_listed_sorted() {
        let artifacts = vec![
            artifact("com.zeta", 1),
            artifact("com.alpha", 2),
            artifact("com.zeta", 3),
        ];
        let lines = check_application_ids(&artifacts).unwrap_err();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "- com.alpha");
        assert_eq!(lines[2], "- com.zeta");
    }

    #[test]
    fn test_expansion_file_must_match_application_id() {
        let codes: BTreeSet<u64> = [1, 2].into_iter().collect();
        let err = check_expansion_file("main.1.com.other.obb", "com.x", &codes).unwrap_err();
        assert!(err.contains("doesn't match the application ID"));
        assert!(err.contains("com.x"));
    }

    #[test]
    fn test_expansion_file_must_match_version_code() {
        let codes: BTreeSet<u64> = [1, 2].into_iter().collect();
        let err = check_expansion_file("main.3.com.x.obb", "com.x", &codes).unwrap_err();
        assert!(err.contains("main.3.com.x.obb"));
        assert!(err.contains("1, 2"));
    }

    #[test]
    fn test_expansion_file_accepted() {
        let codes: BTreeSet<u64> = [1, 2].into_iter().collect();
        let file = check_expansion_file("patch.2.com.x.obb", "com.x", &codes).unwrap();
        assert_eq!(file.version_code, 2);
        assert_eq!(file.file_type, ExpansionFileType::Patch);
    }

    #[test]
    fn test_patch_without_main_rejected_unless_reusing() {
        let sets = assemble_filesets(vec![crate::expansion::ExpansionFile {
            relative_path: "obb/patch.2.com.x.obb".to_string(),
            file_type: ExpansionFileType::Patch,
            version_code: 2,
            application_id: "com.x".to_string(),
        }]);

        let err = check_filesets(&sets, false).unwrap_err();
        assert!(err.contains("patch.2.com.x.obb"));
        assert!(check_filesets(&sets, true).is_ok());
    }

    #[test]
    fn test_rollout_range_advisory() {
        let env = Environment::new();
        assert!(check_rollout_range(&UploadConfig::default(), &env).is_none());

        let in_range = production_config("20%");
        assert!(check_rollout_range(&in_range, &env).is_none());

        let too_low = production_config("0.1%");
        let warning = check_rollout_range(&too_low, &env).unwrap();
        assert_eq!(warning, "Percentage value must be between 0.5 and 100%");

        let too_high = production_config("250");
        assert!(check_rollout_range(&too_high, &env).is_some());

        // Unparseable values default to 100, which is in range.
        let junk = production_config("soon");
        assert!(check_rollout_range(&junk, &env).is_none());
    }

    #[test]
    fn test_recent_changes_warnings() {
        let changes = vec![
            RecentChange {
                language: "en-GB".to_string(),
                text: "ok".to_string(),
            },
            RecentChange {
                language: "English".to_string(),
                text: "x".repeat(501),
            },
        ];
        let warnings = check_recent_changes(&changes);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("English"));
        assert!(warnings[1].contains("500 characters"));
    }

    #[test]
    fn test_report_display_is_bulleted() {
        let mut report = ValidationReport::new();
        report.push("first");
        report.push("second");
        assert_eq!(report.to_string(), "- first\n- second");
    }
}
