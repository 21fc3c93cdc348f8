//! Storage collaborators
//!
//! Two seams are defined here:
//!
//! - [`SchemaStore`]: read access to subjects and their versions
//! - [`ConfigStore`]: the compatibility config records, keyed by [`ConfigKey`]
//!
//! [`MemoryStore`] implements both. Config keys are unique by construction (the
//! map key), so [`ConfigStore::find_or_create`] is an atomic create-if-absent:
//! concurrent creators for the same key all get the one stored record back.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::level::CompatibilityLevel;
use crate::schema::{SchemaVersion, Subject, SubjectId};

/// Reserved record id of the global config
pub const GLOBAL_CONFIG_ID: u64 = 0;

/// Name of the compatibility field, as reported in validation failures
pub const COMPATIBILITY_FIELD: &str = "compatibility";

/// Name of the owning-subject field, as reported in validation failures
pub const SUBJECT_FIELD: &str = "subject";

/// Identity of a config record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    /// The registry-wide singleton
    Global,
    /// The config owned by one subject
    Subject(SubjectId),
}

impl ConfigKey {
    /// Record id; `0` is reserved for the global config
    pub fn id(&self) -> u64 {
        match self {
            ConfigKey::Global => GLOBAL_CONFIG_ID,
            ConfigKey::Subject(id) => *id,
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKey::Global => write!(f, "global"),
            ConfigKey::Subject(id) => write!(f, "subject:{}", id),
        }
    }
}

/// A stored compatibility config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub key: ConfigKey,
    /// Stored level name; `None` means unset
    pub compatibility: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConfigRecord {
    fn new(key: ConfigKey, level: Option<CompatibilityLevel>) -> Self {
        let now = Utc::now();
        Self {
            key,
            compatibility: level.map(|l| l.as_str().to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Stored level, if set
    pub fn level(&self) -> Option<CompatibilityLevel> {
        self.compatibility
            .as_deref()
            .and_then(CompatibilityLevel::from_canonical)
    }
}

/// A single failed field check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Storage errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Validation failed: {}", describe(.0))]
    RecordInvalid(Vec<FieldError>),

    #[error("Config record not found: {0}")]
    RecordNotFound(ConfigKey),

    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Whether validation failed on the named field
    pub fn has_field_error(&self, field: &str) -> bool {
        match self {
            StoreError::RecordInvalid(errors) => errors.iter().any(|e| e.field == field),
            _ => false,
        }
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read access to subjects and versions
pub trait SchemaStore: Send + Sync {
    /// Find a subject by name
    fn find_subject(&self, name: &str) -> std::result::Result<Option<Subject>, StoreError>;

    /// All versions of a subject, ordered by version number
    fn versions(&self, subject: &Subject) -> std::result::Result<Vec<SchemaVersion>, StoreError>;

    /// The version with exactly this number
    fn find_version(
        &self,
        subject: &Subject,
        version: u32,
    ) -> std::result::Result<Option<SchemaVersion>, StoreError> {
        Ok(self
            .versions(subject)?
            .into_iter()
            .find(|v| v.version == version))
    }

    /// The version with the highest number
    fn latest_version(
        &self,
        subject: &Subject,
    ) -> std::result::Result<Option<SchemaVersion>, StoreError> {
        Ok(self
            .versions(subject)?
            .into_iter()
            .max_by_key(|v| v.version))
    }
}

/// Persistence for compatibility config records
pub trait ConfigStore: Send + Sync {
    /// Find a record by key
    fn find(&self, key: ConfigKey) -> std::result::Result<Option<ConfigRecord>, StoreError>;

    /// Atomically return the record for `key`, creating it with `initial` if absent.
    ///
    /// When several callers race, exactly one record is created and every caller
    /// receives it.
    fn find_or_create(
        &self,
        key: ConfigKey,
        initial: Option<CompatibilityLevel>,
    ) -> std::result::Result<ConfigRecord, StoreError>;

    /// Validate and persist an existing record. Nothing is written on failure.
    fn save(&self, record: &ConfigRecord) -> std::result::Result<ConfigRecord, StoreError>;

    /// Number of stored config records
    fn count(&self) -> std::result::Result<usize, StoreError>;
}

#[derive(Debug, Default)]
struct SubjectTable {
    by_name: HashMap<String, Subject>,
    versions: HashMap<SubjectId, Vec<SchemaVersion>>,
    last_id: SubjectId,
}

/// In-memory store for subjects, versions and config records
#[derive(Debug, Default)]
pub struct MemoryStore {
    subjects: RwLock<SubjectTable>,
    configs: RwLock<HashMap<ConfigKey, ConfigRecord>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded from a seed
    pub fn from_seed(seed: &Seed) -> Result<Self> {
        let store = Self::new();
        for (name, schemas) in &seed.subjects {
            store.create_subject(name)?;
            for schema in schemas {
                store.register_version(name, schema)?;
            }
        }
        Ok(store)
    }

    /// Create a subject, or return the existing one with this name
    pub fn create_subject(&self, name: &str) -> std::result::Result<Subject, StoreError> {
        let mut table = self.subjects.write().map_err(|_| StoreError::Poisoned)?;
        if let Some(existing) = table.by_name.get(name) {
            return Ok(existing.clone());
        }

        table.last_id += 1;
        let subject = Subject {
            id: table.last_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        table.by_name.insert(name.to_string(), subject.clone());
        table.versions.insert(subject.id, Vec::new());
        tracing::debug!(subject = %name, id = subject.id, "created subject");
        Ok(subject)
    }

    /// Append a new version to a subject, creating the subject if needed
    pub fn register_version(
        &self,
        subject_name: &str,
        schema: &str,
    ) -> std::result::Result<SchemaVersion, StoreError> {
        let subject = self.create_subject(subject_name)?;
        let mut table = self.subjects.write().map_err(|_| StoreError::Poisoned)?;
        let versions = table.versions.entry(subject.id).or_default();
        let next = versions.iter().map(|v| v.version).max().unwrap_or(0) + 1;
        let version = SchemaVersion {
            subject_id: subject.id,
            version: next,
            schema: schema.to_string(),
            created_at: Utc::now(),
        };
        versions.push(version.clone());
        tracing::debug!(subject = %subject_name, version = next, "registered version");
        Ok(version)
    }

    fn subject_exists(&self, id: SubjectId) -> std::result::Result<bool, StoreError> {
        let table = self.subjects.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table.versions.contains_key(&id))
    }

    fn validate(&self, record: &ConfigRecord) -> std::result::Result<(), StoreError> {
        let mut errors = Vec::new();

        if let Some(value) = &record.compatibility {
            if CompatibilityLevel::from_canonical(value).is_none() {
                errors.push(FieldError {
                    field: COMPATIBILITY_FIELD,
                    message: format!("invalid: {}", value),
                });
            }
        }

        if let ConfigKey::Subject(id) = record.key {
            if !self.subject_exists(id)? {
                errors.push(FieldError {
                    field: SUBJECT_FIELD,
                    message: "must exist".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::RecordInvalid(errors))
        }
    }
}

impl SchemaStore for MemoryStore {
    fn find_subject(&self, name: &str) -> std::result::Result<Option<Subject>, StoreError> {
        let table = self.subjects.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table.by_name.get(name).cloned())
    }

    fn versions(&self, subject: &Subject) -> std::result::Result<Vec<SchemaVersion>, StoreError> {
        let table = self.subjects.read().map_err(|_| StoreError::Poisoned)?;
        let mut versions = table.versions.get(&subject.id).cloned().unwrap_or_default();
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }
}

impl ConfigStore for MemoryStore {
    fn find(&self, key: ConfigKey) -> std::result::Result<Option<ConfigRecord>, StoreError> {
        let configs = self.configs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(configs.get(&key).cloned())
    }

    fn find_or_create(
        &self,
        key: ConfigKey,
        initial: Option<CompatibilityLevel>,
    ) -> std::result::Result<ConfigRecord, StoreError> {
        if let Some(existing) = self.find(key)? {
            return Ok(existing);
        }

        let candidate = ConfigRecord::new(key, initial);
        self.validate(&candidate)?;

        // Re-check under the write lock; a racing creator may have won.
        let mut configs = self.configs.write().map_err(|_| StoreError::Poisoned)?;
        let record = configs.entry(key).or_insert_with(|| {
            tracing::debug!(key = %key, "created config record");
            candidate
        });
        Ok(record.clone())
    }

    fn save(&self, record: &ConfigRecord) -> std::result::Result<ConfigRecord, StoreError> {
        self.validate(record)?;

        let mut configs = self.configs.write().map_err(|_| StoreError::Poisoned)?;
        let stored = configs
            .get_mut(&record.key)
            .ok_or(StoreError::RecordNotFound(record.key))?;
        stored.compatibility = record.compatibility.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    fn count(&self) -> std::result::Result<usize, StoreError> {
        let configs = self.configs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(configs.len())
    }
}

/// Subjects and schema bodies to preload into a [`MemoryStore`]
///
/// ```json
/// { "subjects": { "com.example.users": ["{\"type\": \"string\"}"] } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    /// Subject name to schema bodies, oldest first
    #[serde(default)]
    pub subjects: BTreeMap<String, Vec<String>>,
}

impl Seed {
    /// Load a seed from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_register_versions_increment() {
        let store = MemoryStore::new();
        let v1 = store.register_version("users", "\"string\"").unwrap();
        let v2 = store.register_version("users", "\"int\"").unwrap();
        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);

        let subject = store.find_subject("users").unwrap().unwrap();
        assert_eq!(store.latest_version(&subject).unwrap().unwrap().version, 2);
        assert_eq!(store.find_version(&subject, 1).unwrap().unwrap().schema, "\"string\"");
        assert!(store.find_version(&subject, 3).unwrap().is_none());
    }

    #[test]
    fn test_create_subject_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.create_subject("users").unwrap();
        let second = store.create_subject("users").unwrap();
        assert_eq!(first.id, second.id);
        assert_ne!(first.id, GLOBAL_CONFIG_ID);
    }

    #[test]
    fn test_find_or_create_keeps_first_record() {
        let store = MemoryStore::new();
        let first = store
            .find_or_create(ConfigKey::Global, Some(CompatibilityLevel::Both))
            .unwrap();
        let second = store
            .find_or_create(ConfigKey::Global, Some(CompatibilityLevel::Forward))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.level(), Some(CompatibilityLevel::Both));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_find_or_create_creates_one_record() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .find_or_create(ConfigKey::Global, Some(CompatibilityLevel::Both))
                        .unwrap()
                })
            })
            .collect();

        let records: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(store.count().unwrap(), 1);
        assert!(records.iter().all(|r| r == &records[0]));
    }

    #[test]
    fn test_save_rejects_invalid_compatibility() {
        let store = MemoryStore::new();
        let mut record = store
            .find_or_create(ConfigKey::Global, Some(CompatibilityLevel::Both))
            .unwrap();
        record.compatibility = Some("BACK".to_string());

        let err = store.save(&record).unwrap_err();
        assert!(err.has_field_error(COMPATIBILITY_FIELD));
        assert_eq!(err.to_string(), "Validation failed: compatibility invalid: BACK");
        assert_eq!(
            store.find(ConfigKey::Global).unwrap().unwrap().level(),
            Some(CompatibilityLevel::Both)
        );
    }

    #[test]
    fn test_subject_config_requires_subject() {
        let store = MemoryStore::new();
        let err = store.find_or_create(ConfigKey::Subject(42), None).unwrap_err();
        assert!(err.has_field_error(SUBJECT_FIELD));
        assert!(!err.has_field_error(COMPATIBILITY_FIELD));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_save_unknown_record() {
        let store = MemoryStore::new();
        let record = ConfigRecord::new(ConfigKey::Global, None);
        assert_eq!(
            store.save(&record).unwrap_err(),
            StoreError::RecordNotFound(ConfigKey::Global)
        );
    }

    #[test]
    fn test_seed_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(
            &path,
            r#"{"subjects": {"users": ["\"string\"", "\"int\""], "empty": []}}"#,
        )
        .unwrap();

        let seed = Seed::load(&path).unwrap();
        let store = MemoryStore::from_seed(&seed).unwrap();
        let users = store.find_subject("users").unwrap().unwrap();
        let empty = store.find_subject("empty").unwrap().unwrap();
        assert_eq!(store.versions(&users).unwrap().len(), 2);
        assert!(store.versions(&empty).unwrap().is_empty());
    }
}
