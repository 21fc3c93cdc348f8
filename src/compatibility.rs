//! Schema compatibility checking
//!
//! The registry does not judge schema evolution itself; it hands the resolved
//! level plus both schema texts to a [`CompatibilityChecker`].

use apache_avro::schema_compatibility::SchemaCompatibility;
use apache_avro::Schema as AvroSchema;

use crate::error::{Result, SchemaError};
use crate::level::CompatibilityLevel;

/// Decides whether a candidate schema may follow a reference schema
pub trait CompatibilityChecker: Send + Sync {
    /// Check `candidate` against `reference` under `level`.
    ///
    /// Fails with [`SchemaError::InvalidAvroSchema`] if either text is not a
    /// well-formed schema. An incompatible pair is `Ok(false)`, not an error.
    fn is_compatible(
        &self,
        level: CompatibilityLevel,
        reference: &str,
        candidate: &str,
    ) -> Result<bool>;
}

/// Checker backed by `apache-avro`'s schema resolution rules
#[derive(Debug, Clone, Copy, Default)]
pub struct AvroCompatibilityChecker;

impl AvroCompatibilityChecker {
    pub fn new() -> Self {
        Self
    }

    fn parse(text: &str) -> Result<AvroSchema> {
        AvroSchema::parse_str(text).map_err(|e| SchemaError::InvalidAvroSchema(e.to_string()))
    }
}

impl CompatibilityChecker for AvroCompatibilityChecker {
    fn is_compatible(
        &self,
        level: CompatibilityLevel,
        reference: &str,
        candidate: &str,
    ) -> Result<bool> {
        let candidate = Self::parse(candidate)?;
        let reference = Self::parse(reference)?;

        // Transitive levels are judged against the one reference given.
        let backward = !level.requires_backward()
            || SchemaCompatibility::can_read(&reference, &candidate).is_ok();
        let forward = !level.requires_forward()
            || SchemaCompatibility::can_read(&candidate, &reference).is_ok();

        tracing::debug!(%level, backward, forward, "checked schema pair");
        Ok(backward && forward)
    }
}
