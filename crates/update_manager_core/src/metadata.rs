//! Release metadata embedded in artifact file names.
//!
//! Update packages are named like `Stratus_V0.1.38D_20250806.update`: a
//! `V`-prefixed semantic version with an optional release-code letter, and a
//! `_YYYYMMDD.` build date.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;

/// Display format for build dates, e.g. "Aug 06, 2025".
pub const BUILD_DATE_DISPLAY_FORMAT: &str = "%b %d, %Y";

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"V(\d+\.\d+\.\d+[A-Z]?)").expect("valid version regex"))
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_(\d{8})\.").expect("valid date regex"))
}

/// Release classification of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Development,
    Public,
}

impl ReleaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Development => "development",
            ReleaseType::Public => "public",
        }
    }
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata recovered from an artifact file name.
///
/// Every field is best effort. A name without a version or date simply
/// leaves the field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactMetadata {
    /// Version without the leading `V`, e.g. `0.1.38D`
    pub version: Option<String>,

    /// Set only when `version` is present
    pub release_type: Option<ReleaseType>,

    pub build_date: Option<NaiveDate>,

    /// Why a matched date token was rejected
    pub date_error: Option<String>,
}

impl ArtifactMetadata {
    /// `build_date` rendered for display.
    pub fn build_date_formatted(&self) -> Option<String> {
        self.build_date
            .map(|date| date.format(BUILD_DATE_DISPLAY_FORMAT).to_string())
    }
}

/// Whether `name` ends with `.{extension}`, ignoring case.
pub fn has_extension(name: &str, extension: &str) -> bool {
    let extension = extension.trim_start_matches('.');
    let Some((_, suffix)) = name.rsplit_once('.') else {
        return false;
    };
    !extension.is_empty() && suffix.eq_ignore_ascii_case(extension)
}

/// Extract metadata from an artifact file name.
///
/// Names that do not end in `artifact_extension` are not inspected at all.
pub fn extract_metadata(name: &str, artifact_extension: &str) -> ArtifactMetadata {
    if !has_extension(name, artifact_extension) {
        return ArtifactMetadata::default();
    }

    let mut metadata = ArtifactMetadata::default();

    if let Some(captures) = version_pattern().captures(name) {
        let version = captures[1].to_string();
        // Any `D` in the name marks a development build, not just the
        // release-code letter.
        let release_type = if name.contains('D') || version.contains('D') {
            ReleaseType::Development
        } else {
            ReleaseType::Public
        };
        metadata.version = Some(version);
        metadata.release_type = Some(release_type);
    }

    if let Some(captures) = date_pattern().captures(name) {
        let token = &captures[1];
        match parse_build_date(token) {
            Some(date) => metadata.build_date = Some(date),
            None => {
                warn!(file = name, "Could not parse build date from {}", token);
                metadata.date_error = Some(format!("invalid build date '{}'", token));
            }
        }
    }

    metadata
}

/// Parse an eight digit `YYYYMMDD` token into a calendar date.
pub fn parse_build_date(token: &str) -> Option<NaiveDate> {
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = token[0..4].parse().ok()?;
    if year < 1 {
        return None;
    }
    let month = token[4..6].parse().ok()?;
    let day = token[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
