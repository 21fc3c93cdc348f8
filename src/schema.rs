//! Subjects and stored schema versions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric subject identifier assigned by the store
pub type SubjectId = u64;

/// A named lineage of evolving schemas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Store-assigned id, never `0`
    pub id: SubjectId,
    /// Unique subject name (e.g., "com.example.users-value")
    pub name: String,
    /// When this subject was created
    pub created_at: DateTime<Utc>,
}

/// One immutable schema revision within a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Owning subject
    pub subject_id: SubjectId,
    /// Version number, starting at 1 and increasing per subject
    pub version: u32,
    /// Schema body as JSON text
    pub schema: String,
    /// When this version was registered
    pub created_at: DateTime<Utc>,
}
