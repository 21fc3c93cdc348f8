//! Compatibility config resolution
//!
//! A subject's own level overrides the registry-wide global level. The global
//! record is materialized lazily with [`CompatibilityLevel::DEFAULT`]; creation
//! goes through [`ConfigStore::find_or_create`], so the store's key uniqueness
//! (not a lock here) guarantees a single global record.

use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::level::CompatibilityLevel;
use crate::schema::Subject;
use crate::store::{ConfigKey, ConfigRecord, ConfigStore, StoreError, COMPATIBILITY_FIELD};

/// Level applied to a subject: its own if set, the global one otherwise
pub fn effective_level(
    subject: Option<CompatibilityLevel>,
    global: CompatibilityLevel,
) -> CompatibilityLevel {
    subject.unwrap_or(global)
}

/// Reads and writes global and per-subject compatibility levels
#[derive(Clone)]
pub struct ConfigResolver {
    store: Arc<dyn ConfigStore>,
}

impl ConfigResolver {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// The global config record, created with the default level if absent
    pub fn global_record(&self) -> Result<ConfigRecord> {
        Ok(self
            .store
            .find_or_create(ConfigKey::Global, Some(CompatibilityLevel::DEFAULT))?)
    }

    /// Current global level
    pub fn get_global(&self) -> Result<CompatibilityLevel> {
        let record = self.global_record()?;
        Ok(record.level().unwrap_or(CompatibilityLevel::DEFAULT))
    }

    /// Set the global level from raw input in any casing
    pub fn set_global(&self, level: &str) -> Result<CompatibilityLevel> {
        let record = self.global_record()?;
        let updated = self.update_compatibility(record, level)?;
        tracing::info!(compatibility = %updated, "updated global compatibility");
        Ok(updated)
    }

    /// The subject's own level; `None` means it inherits the global level
    pub fn get_for_subject(&self, subject: &Subject) -> Result<Option<CompatibilityLevel>> {
        Ok(self
            .store
            .find(ConfigKey::Subject(subject.id))?
            .and_then(|record| record.level()))
    }

    /// Level actually applied to the subject
    pub fn get_effective(&self, subject: &Subject) -> Result<CompatibilityLevel> {
        let own = self.get_for_subject(subject)?;
        Ok(effective_level(own, self.get_global()?))
    }

    /// Set the subject's level from raw input in any casing
    pub fn set_for_subject(&self, subject: &Subject, level: &str) -> Result<CompatibilityLevel> {
        let record = self
            .store
            .find_or_create(ConfigKey::Subject(subject.id), None)?;
        let updated = self.update_compatibility(record, level)?;
        tracing::info!(
            subject = %subject.name,
            compatibility = %updated,
            "updated subject compatibility"
        );
        Ok(updated)
    }

    /// Persist an uppercased level on the record.
    ///
    /// A store validation failure on the compatibility field becomes
    /// [`SchemaError::InvalidCompatibilityLevel`] carrying the caller's text;
    /// anything else is returned as is.
    fn update_compatibility(
        &self,
        mut record: ConfigRecord,
        level: &str,
    ) -> Result<CompatibilityLevel> {
        record.compatibility = Some(level.to_uppercase());
        let saved = self.store.save(&record).map_err(|err| translate(err, level))?;
        saved
            .level()
            .ok_or_else(|| SchemaError::InvalidCompatibilityLevel(level.to_string()))
    }
}

fn translate(err: StoreError, requested: &str) -> SchemaError {
    if err.has_field_error(COMPATIBILITY_FIELD) {
        tracing::warn!(compatibility = %requested, "rejected compatibility level");
        SchemaError::InvalidCompatibilityLevel(requested.to_string())
    } else {
        SchemaError::Store(err)
    }
}
