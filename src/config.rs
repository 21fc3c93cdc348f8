//! Configuration management for the registry server
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (registry.toml)
//! - Environment variables (REGISTRY__*)
//!
//! ## Example config file (registry.toml):
//! ```toml
//! [server]
//! bind = "0.0.0.0:8081"
//!
//! [registry]
//! seed_file = "seed.json"
//!
//! [logging]
//! filter = "compat_registry=debug,tower_http=info"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Main configuration for the registry server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage settings
    #[serde(default)]
    pub registry: StorageConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file of subjects and versions to preload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is not set
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8081))
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl RegistrySettings {
    /// Load configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["registry.toml", ".registry.toml", "config/registry.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "compat", "registry") {
            let xdg_config = config_dir.config_dir().join("registry.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // REGISTRY__SERVER__BIND=0.0.0.0:8081
        builder = builder.add_source(
            Environment::with_prefix("REGISTRY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistrySettings::default();
        assert_eq!(config.server.bind.port(), 8081);
        assert!(config.registry.seed_file.is_none());
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_serialize_config() {
        let config = RegistrySettings::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[server]\nbind = \"0.0.0.0:9000\"\n\n[registry]\nseed_file = \"seed.json\"\n",
        )
        .unwrap();

        let config = RegistrySettings::load_from(path.to_str()).unwrap();
        assert_eq!(config.server.bind.port(), 9000);
        assert_eq!(config.registry.seed_file, Some(PathBuf::from("seed.json")));
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = RegistrySettings::default();
        config.logging.filter = "debug".to_string();
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = RegistrySettings::load_from(path.to_str()).unwrap();
        assert_eq!(loaded.logging.filter, "debug");
    }
}
