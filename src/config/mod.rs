//! Upload job configuration.
//!
//! Loaded from `.gplay/upload.toml` (or built programmatically by a caller)
//! and normalized before use: blank strings collapse to `None`, and every
//! user-supplied field goes through variable expansion against the build
//! environment.

mod expand;

pub use expand::Environment;

use std::path::Path;

use serde::{Deserialize, Serialize};

use gplay_protocol::ops::RecentChange;

use crate::track::DEFAULT_PERCENTAGE;

/// Errors loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for one upload invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Comma-separated glob patterns matching the APK files to upload.
    pub apk_files_pattern: Option<String>,

    /// Comma-separated glob patterns matching expansion files, if any.
    pub expansion_files_pattern: Option<String>,

    /// Accept a patch expansion file without a main file, deferring to the
    /// newest main file already uploaded for the application.
    #[serde(default)]
    pub use_previous_expansion_files_if_missing: bool,

    /// Release track config value (internal, alpha, beta, production).
    pub track_name: Option<String>,

    /// Rollout percentage, optionally suffixed with `%`. Only meaningful
    /// for the production track.
    pub rollout_percentage: Option<String>,

    /// Localized release notes.
    #[serde(default)]
    pub recent_changes: Vec<RecentChange>,
}

/// Collapse blank input to `None`, trimming surrounding whitespace.
pub fn fix_empty_and_trim(value: Option<&str>) -> Option<&str> {
    match value {
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        None => None,
    }
}

impl UploadConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// The APK pattern, trimmed, `None` when blank.
    pub fn apk_files_pattern(&self) -> Option<&str> {
        fix_empty_and_trim(self.apk_files_pattern.as_deref())
    }

    /// The APK pattern after variable expansion.
    pub fn expanded_apk_files_pattern(&self, env: &Environment) -> Option<String> {
        self.apk_files_pattern().map(|p| env.expand(p))
    }

    /// The expansion-file pattern, trimmed, `None` when blank.
    pub fn expansion_files_pattern(&self) -> Option<&str> {
        fix_empty_and_trim(self.expansion_files_pattern.as_deref())
    }

    /// The expansion-file pattern after variable expansion.
    pub fn expanded_expansion_files_pattern(&self, env: &Environment) -> Option<String> {
        self.expansion_files_pattern().map(|p| env.expand(p))
    }

    /// The track name, trimmed, `None` when blank.
    pub fn track_name(&self) -> Option<&str> {
        fix_empty_and_trim(self.track_name.as_deref())
    }

    /// The track name after expansion and lower-casing, ready for
    /// resolution against the fixed track set.
    pub fn canonical_track_name(&self, env: &Environment) -> Option<String> {
        self.track_name().map(|t| env.expand(t).to_lowercase())
    }

    /// The rollout percentage as a number.
    ///
    /// `%` suffixes are allowed in the config; anything that does not
    /// parse as a number rolls out to 100%.
    pub fn rollout_percentage_value(&self, env: &Environment) -> f64 {
        let raw = match fix_empty_and_trim(self.rollout_percentage.as_deref()) {
            Some(p) => p.replace('%', ""),
            None => return DEFAULT_PERCENTAGE,
        };
        env.expand(&raw).trim().parse().unwrap_or(DEFAULT_PERCENTAGE)
    }

    /// Release notes with variables expanded in both fields.
    pub fn expanded_recent_changes(&self, env: &Environment) -> Vec<RecentChange> {
        self.recent_changes
            .iter()
            .map(|rc| RecentChange {
                language: env.expand(&rc.language),
                text: env.expand(&rc.text),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_empty_and_trim() {
        assert_eq!(fix_empty_and_trim(Some("  x ")), Some("x"));
        assert_eq!(fix_empty_and_trim(Some("   ")), None);
        assert_eq!(fix_empty_and_trim(None), None);
    }

    #[test]
    fn test_blank_fields_collapse_to_none() {
        let config = UploadConfig {
            apk_files_pattern: Some("  ".to_string()),
            track_name: Some("".to_string()),
            ..UploadConfig::default()
        };
        assert!(config.apk_files_pattern().is_none());
        assert!(config.track_name().is_none());
    }

    #[test]
    fn test_canonical_track_name_lowercases_after_expansion() {
        let config = UploadConfig {
            track_name: Some("$TRACK".to_string()),
            ..UploadConfig::default()
        };
        let env = Environment::new().with_var("TRACK", "Beta");
        assert_eq!(config.canonical_track_name(&env), Some("beta".to_string()));
    }

    #[test]
    fn test_rollout_percentage_strips_percent_sign() {
        let config = UploadConfig {
            rollout_percentage: Some("5%".to_string()),
            ..UploadConfig::default()
        };
        assert_eq!(config.rollout_percentage_value(&Environment::new()), 5.0);
    }

    #[test]
    fn test_rollout_percentage_defaults_to_100() {
        let unset = UploadConfig::default();
        assert_eq!(unset.rollout_percentage_value(&Environment::new()), 100.0);

        let junk = UploadConfig {
            rollout_percentage: Some("lots".to_string()),
            ..UploadConfig::default()
        };
        assert_eq!(junk.rollout_percentage_value(&Environment::new()), 100.0);
    }

    #[test]
    fn test_rollout_percentage_from_variable() {
        let config = UploadConfig {
            rollout_percentage: Some("${PCT}%".to_string()),
            ..UploadConfig::default()
        };
        let env = Environment::new().with_var("PCT", "0.5");
        assert_eq!(config.rollout_percentage_value(&env), 0.5);
    }

    #[test]
    fn test_recent_changes_expansion() {
        let config = UploadConfig {
            recent_changes: vec![RecentChange {
                language: "en-GB".to_string(),
                text: "Build $BUILD_NUMBER fixes".to_string(),
            }],
            ..UploadConfig::default()
        };
        let env = Environment::new().with_var("BUILD_NUMBER", "17");
        let expanded = config.expanded_recent_changes(&env);
        assert_eq!(expanded[0].text, "Build 17 fixes");
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            apk_files_pattern = "**/*.apk"
            track_name = "production"
            rollout_percentage = "10%"
            use_previous_expansion_files_if_missing = true

            [[recent_changes]]
            language = "en-GB"
            text = "Fixes"
        "#;
        let config: UploadConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.apk_files_pattern(), Some("**/*.apk"));
        assert!(config.use_previous_expansion_files_if_missing);
        assert_eq!(config.recent_changes.len(), 1);
    }
}
