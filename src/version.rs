//! Version selection
//!
//! Turns a subject name plus a `latest` / number selector into a stored
//! [`SchemaVersion`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::schema::{SchemaVersion, Subject};
use crate::store::SchemaStore;

/// Token selecting the highest version of a subject
pub const LATEST: &str = "latest";

/// Which version of a subject to resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSelector {
    /// The highest version number
    Latest,
    /// An explicit positive version number
    Number(u32),
    /// Anything else from the path; never matches a stored version
    Unmatched(String),
}

impl VersionSelector {
    /// Parse a path segment. Never fails: unusable input is kept for reporting.
    pub fn parse(raw: &str) -> Self {
        if raw == LATEST {
            return VersionSelector::Latest;
        }
        match raw.parse::<u32>() {
            Ok(n) if n > 0 => VersionSelector::Number(n),
            _ => VersionSelector::Unmatched(raw.to_string()),
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => f.write_str(LATEST),
            VersionSelector::Number(n) => write!(f, "{}", n),
            VersionSelector::Unmatched(raw) => f.write_str(raw),
        }
    }
}

/// Looks up subjects and their versions in a [`SchemaStore`]
#[derive(Clone)]
pub struct VersionResolver {
    store: Arc<dyn SchemaStore>,
}

impl VersionResolver {
    pub fn new(store: Arc<dyn SchemaStore>) -> Self {
        Self { store }
    }

    /// Find a subject by name
    pub fn subject(&self, name: &str) -> Result<Subject> {
        self.store
            .find_subject(name)?
            .ok_or_else(|| SchemaError::SubjectNotFound(name.to_string()))
    }

    /// Resolve a version of an already-found subject
    pub fn version(&self, subject: &Subject, selector: &VersionSelector) -> Result<SchemaVersion> {
        let found = match selector {
            VersionSelector::Latest => self.store.latest_version(subject)?,
            VersionSelector::Number(n) => self.store.find_version(subject, *n)?,
            VersionSelector::Unmatched(_) => None,
        };

        found.ok_or_else(|| SchemaError::VersionNotFound {
            subject: subject.name.clone(),
            selector: selector.to_string(),
        })
    }

    /// Resolve a subject name and selector to a stored version
    pub fn resolve(&self, subject_name: &str, selector: &VersionSelector) -> Result<SchemaVersion> {
        let subject = self.subject(subject_name)?;
        self.version(&subject, selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn resolver_with(store: MemoryStore) -> VersionResolver {
        VersionResolver::new(Arc::new(store))
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!(VersionSelector::parse("latest"), VersionSelector::Latest);
        assert_eq!(VersionSelector::parse("3"), VersionSelector::Number(3));
        assert_eq!(
            VersionSelector::parse("0"),
            VersionSelector::Unmatched("0".to_string())
        );
        assert_eq!(
            VersionSelector::parse("-1"),
            VersionSelector::Unmatched("-1".to_string())
        );
        assert_eq!(
            VersionSelector::parse("LATEST"),
            VersionSelector::Unmatched("LATEST".to_string())
        );
        assert_eq!(VersionSelector::parse("latest").to_string(), "latest");
    }

    #[test]
    fn test_resolve_latest_picks_highest() {
        let store = MemoryStore::new();
        store.register_version("users", "\"string\"").unwrap();
        store.register_version("users", "\"int\"").unwrap();
        let resolver = resolver_with(store);

        let version = resolver.resolve("users", &VersionSelector::Latest).unwrap();
        assert_eq!(version.version, 2);
        assert_eq!(version.schema, "\"int\"");
    }

    #[test]
    fn test_resolve_explicit_number() {
        let store = MemoryStore::new();
        store.register_version("users", "\"string\"").unwrap();
        store.register_version("users", "\"int\"").unwrap();
        let resolver = resolver_with(store);

        let version = resolver.resolve("users", &VersionSelector::Number(1)).unwrap();
        assert_eq!(version.schema, "\"string\"");

        match resolver.resolve("users", &VersionSelector::Number(3)) {
            Err(SchemaError::VersionNotFound { subject, selector }) => {
                assert_eq!(subject, "users");
                assert_eq!(selector, "3");
            }
            other => panic!("Expected VersionNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_latest_without_versions() {
        let store = MemoryStore::new();
        store.create_subject("empty").unwrap();
        let resolver = resolver_with(store);

        assert!(matches!(
            resolver.resolve("empty", &VersionSelector::Latest),
            Err(SchemaError::VersionNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_missing_subject() {
        let resolver = resolver_with(MemoryStore::new());
        match resolver.resolve("nobody", &VersionSelector::Number(1)) {
            Err(SchemaError::SubjectNotFound(name)) => assert_eq!(name, "nobody"),
            other => panic!("Expected SubjectNotFound, got {:?}", other),
        }
    }
}
