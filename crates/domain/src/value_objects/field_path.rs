//! Dotted field path value object

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dotted path into a document, e.g. `data.attribs.san.dailyLoss`.
///
/// Numeric segments address positions inside ordered sequences
/// (`data.groups.2.skills.0.img`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Appends a named segment.
    pub fn child(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self(segment.to_string())
        } else {
            Self(format!("{}.{}", self.0, segment))
        }
    }

    /// Appends a sequence position.
    pub fn index(&self, position: usize) -> Self {
        self.child(&position.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Splits into parent path and last segment.
    ///
    /// A single-segment path yields an empty parent.
    pub fn split_last(&self) -> (&str, &str) {
        match self.0.rfind('.') {
            Some(pos) => (&self.0[..pos], &self.0[pos + 1..]),
            None => ("", &self.0),
        }
    }

    /// True when `self` equals `other` or lies underneath it.
    pub fn starts_with(&self, other: &FieldPath) -> bool {
        self.0 == other.0
            || (self.0.starts_with(&other.0) && self.0[other.0.len()..].starts_with('.'))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FieldPath {
    fn from(value: String) -> Self {
        Self(value)
    }
}
