//! Compatibility Registry
//!
//! Compatibility configuration and compatibility checking for an Avro schema
//! registry.
//!
//! ## Features
//!
//! - **Two-level policy**: a subject's own compatibility level overrides the
//!   registry-wide global level, which defaults to `BOTH`
//! - **Lazy global record**: created on first access, exactly once, even under
//!   concurrent first requests
//! - **Compatibility checks**: a candidate schema against `latest` or a numbered
//!   version of a subject, judged by `apache-avro`
//! - **HTTP API**: `/config` and `/compatibility` endpoints with structured errors
//!
//! ## Architecture
//!
//! ```text
//! api ──► SchemaRegistry ──► ConfigResolver ──► ConfigStore
//!                        ├─► VersionResolver ─► SchemaStore
//!                        └─► CompatibilityChecker
//! ```

pub mod api;
pub mod compatibility;
pub mod config;
pub mod error;
pub mod level;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod version;

pub use compatibility::{AvroCompatibilityChecker, CompatibilityChecker};
pub use config::RegistrySettings;
pub use error::{Result, SchemaError};
pub use level::CompatibilityLevel;
pub use registry::{CompatibilityVerdict, SchemaRegistry};
pub use resolver::{effective_level, ConfigResolver};
pub use schema::{SchemaVersion, Subject};
pub use store::{ConfigKey, ConfigRecord, ConfigStore, MemoryStore, SchemaStore, Seed, StoreError};
pub use version::{VersionResolver, VersionSelector};
