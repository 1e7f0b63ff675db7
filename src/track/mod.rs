//! Release tracks and staged rollout rules.
//!
//! A release lands on exactly one track. Staged rollout percentages only
//! apply to the production track and must be drawn from the fixed set Play
//! accepts; every other track releases to its full audience.

use std::fmt;
use std::str::FromStr;

/// Allowed percentage values when doing a staged rollout to production.
pub const ROLLOUT_PERCENTAGES: [f64; 7] = [0.5, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0];

/// Rollout applied when no valid percentage was configured.
pub const DEFAULT_PERCENTAGE: f64 = 100.0;

/// The fixed set of release tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseTrack {
    Internal,
    Alpha,
    Beta,
    Production,
}

/// Error for track names outside the fixed set.
#[derive(Debug, thiserror::Error)]
#[error("'{0}' is not a valid release track")]
pub struct UnknownTrack(pub String);

impl ReleaseTrack {
    /// All tracks, in promotion order.
    pub fn all() -> [ReleaseTrack; 4] {
        [Self::Internal, Self::Alpha, Self::Beta, Self::Production]
    }

    /// The lower-case config value for this track.
    pub fn config_value(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::Production => "production",
        }
    }
}

impl FromStr for ReleaseTrack {
    type Err = UnknownTrack;

    /// Resolve a normalized (lower-case) config value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(Self::Internal),
            "alpha" => Ok(Self::Alpha),
            "beta" => Ok(Self::Beta),
            "production" => Ok(Self::Production),
            other => Err(UnknownTrack(other.to_string())),
        }
    }
}

impl fmt::Display for ReleaseTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_value())
    }
}

/// Whether a percentage is one of the values production rollouts accept.
///
/// Exact numeric equality; there is no tolerance band.
pub fn is_allowed_rollout_percentage(pct: f64) -> bool {
    ROLLOUT_PERCENTAGES.iter().any(|allowed| *allowed == pct)
}

/// Format a percentage with at most one decimal place, the way the Play
/// console displays them: `0.5`, `5`, `100`.
pub fn format_percentage(pct: f64) -> String {
    let rounded = (pct * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}
