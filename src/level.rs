//! Compatibility levels
//!
//! The closed set of policy names a subject (or the registry as a whole) can be
//! governed by.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SchemaError;

/// A named compatibility policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityLevel {
    /// No compatibility checking
    None,
    /// The new schema can read data written with the previous one
    Backward,
    /// Backward against every earlier version
    BackwardTransitive,
    /// The previous schema can read data written with the new one
    Forward,
    /// Forward against every earlier version
    ForwardTransitive,
    /// Backward and forward
    Full,
    /// Full against every earlier version
    FullTransitive,
    /// Backward and forward; the registry default
    Both,
}

impl CompatibilityLevel {
    /// Level applied when no global record exists yet.
    ///
    /// Intentionally `BOTH` rather than the usual `BACKWARD`; clients rely on it.
    pub const DEFAULT: CompatibilityLevel = CompatibilityLevel::Both;

    /// Every accepted level, in declaration order
    pub const ALL: [CompatibilityLevel; 8] = [
        CompatibilityLevel::None,
        CompatibilityLevel::Backward,
        CompatibilityLevel::BackwardTransitive,
        CompatibilityLevel::Forward,
        CompatibilityLevel::ForwardTransitive,
        CompatibilityLevel::Full,
        CompatibilityLevel::FullTransitive,
        CompatibilityLevel::Both,
    ];

    /// Canonical (uppercase) name
    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityLevel::None => "NONE",
            CompatibilityLevel::Backward => "BACKWARD",
            CompatibilityLevel::BackwardTransitive => "BACKWARD_TRANSITIVE",
            CompatibilityLevel::Forward => "FORWARD",
            CompatibilityLevel::ForwardTransitive => "FORWARD_TRANSITIVE",
            CompatibilityLevel::Full => "FULL",
            CompatibilityLevel::FullTransitive => "FULL_TRANSITIVE",
            CompatibilityLevel::Both => "BOTH",
        }
    }

    /// Look up a level by its canonical name. Exact match only.
    pub fn from_canonical(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|level| level.as_str() == name)
    }

    /// Normalize raw input (any casing) into a level.
    ///
    /// The error carries the original, un-normalized text.
    pub fn normalize(raw: &str) -> Result<Self, SchemaError> {
        Self::from_canonical(&raw.to_uppercase())
            .ok_or_else(|| SchemaError::InvalidCompatibilityLevel(raw.to_string()))
    }

    /// Whether the candidate must be able to read the reference's data
    pub fn requires_backward(&self) -> bool {
        !matches!(
            self,
            CompatibilityLevel::None
                | CompatibilityLevel::Forward
                | CompatibilityLevel::ForwardTransitive
        )
    }

    /// Whether the reference must be able to read the candidate's data
    pub fn requires_forward(&self) -> bool {
        !matches!(
            self,
            CompatibilityLevel::None
                | CompatibilityLevel::Backward
                | CompatibilityLevel::BackwardTransitive
        )
    }
}

impl Default for CompatibilityLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_both() {
        assert_eq!(CompatibilityLevel::DEFAULT, CompatibilityLevel::Both);
        assert_eq!(CompatibilityLevel::default().as_str(), "BOTH");
    }

    #[test]
    fn test_normalize_any_casing() {
        assert_eq!(
            CompatibilityLevel::normalize("forward").unwrap(),
            CompatibilityLevel::Forward
        );
        assert_eq!(
            CompatibilityLevel::normalize("Full_Transitive").unwrap(),
            CompatibilityLevel::FullTransitive
        );
        for level in CompatibilityLevel::ALL {
            let lower = level.as_str().to_lowercase();
            assert_eq!(CompatibilityLevel::normalize(&lower).unwrap(), level);
        }
    }

    #[test]
    fn test_normalize_rejects_unknown() {
        match CompatibilityLevel::normalize("back") {
            Err(SchemaError::InvalidCompatibilityLevel(value)) => assert_eq!(value, "back"),
            other => panic!("Expected InvalidCompatibilityLevel, got {:?}", other),
        }
        assert!(CompatibilityLevel::normalize("").is_err());
        assert!(CompatibilityLevel::normalize(" FULL").is_err());
    }

    #[test]
    fn test_directions() {
        assert!(!CompatibilityLevel::None.requires_backward());
        assert!(!CompatibilityLevel::None.requires_forward());
        assert!(CompatibilityLevel::Backward.requires_backward());
        assert!(!CompatibilityLevel::Backward.requires_forward());
        assert!(CompatibilityLevel::ForwardTransitive.requires_forward());
        assert!(!CompatibilityLevel::ForwardTransitive.requires_backward());
        assert!(CompatibilityLevel::Both.requires_backward());
        assert!(CompatibilityLevel::Both.requires_forward());
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&CompatibilityLevel::BackwardTransitive).unwrap();
        assert_eq!(json, "\"BACKWARD_TRANSITIVE\"");
        let level: CompatibilityLevel = serde_json::from_str("\"BOTH\"").unwrap();
        assert_eq!(level, CompatibilityLevel::Both);
    }
}
