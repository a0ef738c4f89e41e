//! Release version value object
//!
//! Versions are dot-separated segments ("0.8.3", "1.0.0-beta"). Comparison
//! follows the host's newer-than rule: segments are compared pairwise,
//! numerically when both are numeric and lexically otherwise; a version with
//! extra trailing segments is newer than its prefix.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Error when parsing a version string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// The version string is empty
    #[error("Empty version string")]
    Empty,
    /// A segment between dots is empty or contains whitespace
    #[error("Invalid version segment in '{0}'")]
    InvalidSegment(String),
}

/// A parsed release version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseVersion {
    raw: String,
}

impl ReleaseVersion {
    /// Parse a version string like "0.7.1" or "1.0.0-beta"
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(VersionParseError::Empty);
        }
        if input
            .split('.')
            .any(|segment| segment.is_empty() || segment.chars().any(char::is_whitespace))
        {
            return Err(VersionParseError::InvalidSegment(input.to_string()));
        }
        Ok(Self {
            raw: input.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split('.')
    }

    /// True when `self` is strictly newer than `other`.
    pub fn is_newer_than(&self, other: &ReleaseVersion) -> bool {
        let mut theirs = other.segments();
        for ours in self.segments() {
            let Some(their) = theirs.next() else {
                return true;
            };
            match compare_segment(ours, their) {
                Ordering::Equal => continue,
                Ordering::Greater => return true,
                Ordering::Less => return false,
            }
        }
        false
    }
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for ReleaseVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReleaseVersion {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReleaseVersion> for String {
    fn from(value: ReleaseVersion) -> Self {
        value.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ReleaseVersion {
        ReleaseVersion::parse(s).unwrap()
    }

    #[test]
    fn test_numeric_segments_compare_numerically() {
        assert!(v("0.8.10").is_newer_than(&v("0.8.9")));
        assert!(!v("0.8.9").is_newer_than(&v("0.8.10")));
    }

    #[test]
    fn test_equal_versions_are_not_newer() {
        assert!(!v("0.7.1").is_newer_than(&v("0.7.1")));
    }

    #[test]
    fn test_extra_segment_is_newer() {
        assert!(v("0.7.1.1").is_newer_than(&v("0.7.1")));
        assert!(!v("0.7").is_newer_than(&v("0.7.1")));
    }

    #[test]
    fn test_non_numeric_segments_compare_lexically() {
        assert!(v("1.0.0-rc2").is_newer_than(&v("1.0.0-rc1")));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ReleaseVersion::parse("  "), Err(VersionParseError::Empty));
        assert!(matches!(
            ReleaseVersion::parse("1..2"),
            Err(VersionParseError::InvalidSegment(_))
        ));
        assert!(matches!(
            ReleaseVersion::parse("1.0 beta"),
            Err(VersionParseError::InvalidSegment(_))
        ));
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let parsed: ReleaseVersion = serde_json::from_str("\"0.8.4\"").unwrap();
        assert_eq!(parsed.as_str(), "0.8.4");
        assert!(serde_json::from_str::<ReleaseVersion>("\"\"").is_err());
    }
}
