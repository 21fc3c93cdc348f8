//! Compatibility registry
//!
//! Ties the config resolver, version lookup and compatibility checker together
//! behind the operations the HTTP API exposes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compatibility::{AvroCompatibilityChecker, CompatibilityChecker};
use crate::error::Result;
use crate::level::CompatibilityLevel;
use crate::resolver::ConfigResolver;
use crate::schema::Subject;
use crate::store::{ConfigStore, MemoryStore, SchemaStore};
use crate::version::{VersionResolver, VersionSelector};

/// Outcome of a compatibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityVerdict {
    pub is_compatible: bool,
}

/// The main registry facade
#[derive(Clone)]
pub struct SchemaRegistry {
    config: ConfigResolver,
    versions: VersionResolver,
    checker: Arc<dyn CompatibilityChecker>,
}

impl SchemaRegistry {
    /// Build a registry from its collaborators
    pub fn new(
        schemas: Arc<dyn SchemaStore>,
        configs: Arc<dyn ConfigStore>,
        checker: Arc<dyn CompatibilityChecker>,
    ) -> Self {
        Self {
            config: ConfigResolver::new(configs),
            versions: VersionResolver::new(schemas),
            checker,
        }
    }

    /// Registry over one in-memory store with the Avro checker
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self::new(
            store.clone(),
            store,
            Arc::new(AvroCompatibilityChecker::new()),
        )
    }

    /// Config resolver
    pub fn config(&self) -> &ConfigResolver {
        &self.config
    }

    /// Version resolver
    pub fn versions(&self) -> &VersionResolver {
        &self.versions
    }

    /// Find a subject by name, failing with `SubjectNotFound`
    pub fn subject(&self, name: &str) -> Result<Subject> {
        self.versions.subject(name)
    }

    /// The subject's own level, or `None` if it inherits the global level
    pub fn subject_compatibility(&self, subject_name: &str) -> Result<Option<CompatibilityLevel>> {
        let subject = self.subject(subject_name)?;
        self.config.get_for_subject(&subject)
    }

    /// Set the subject's own level
    pub fn set_subject_compatibility(
        &self,
        subject_name: &str,
        level: &str,
    ) -> Result<CompatibilityLevel> {
        let subject = self.subject(subject_name)?;
        self.config.set_for_subject(&subject, level)
    }

    /// Check a candidate schema against a version of a subject.
    ///
    /// Errors are reported in a fixed order: missing subject, then missing
    /// version, then malformed schema.
    pub fn check_compatibility(
        &self,
        subject_name: &str,
        selector: &VersionSelector,
        candidate: &str,
    ) -> Result<CompatibilityVerdict> {
        let subject = self.subject(subject_name)?;
        let level = self.config.get_effective(&subject)?;
        let reference = self.versions.version(&subject, selector)?;

        let is_compatible = self
            .checker
            .is_compatible(level, &reference.schema, candidate)?;

        tracing::info!(
            subject = %subject.name,
            version = reference.version,
            %level,
            is_compatible,
            "compatibility check"
        );
        Ok(CompatibilityVerdict { is_compatible })
    }
}
