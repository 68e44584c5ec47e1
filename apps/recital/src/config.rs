//! # Configuration
//!
//! Server configuration is resolved in layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config recital.toml`)
//! 3. Environment (`RECITAL_HOST`, `RECITAL_PORT`, `RECITAL_DATABASE`,
//!    `RECITAL_BACKEND`, `RECITAL_PUBLIC_DIR`, `RECITAL_RATE_LIMIT`)
//! 4. Command-line flags
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 5000
//! database = "data/recital.db"
//! backend = "redb"
//! public_dir = "public"
//! rate_limit = 50
//! ```

use crate::backend::Backend;
use recital_core::RecitalError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Maximum config file size (64 KB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub backend: Backend,
    /// Directory of static front-end files, if any.
    pub public_dir: Option<PathBuf>,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database: PathBuf::from("recital.db"),
            backend: Backend::Redb,
            public_dir: None,
            rate_limit: 100,
        }
    }
}

/// One partial configuration layer. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub public_dir: Option<PathBuf>,
    pub rate_limit: Option<u32>,
}

impl ConfigLayer {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, RecitalError> {
        toml::from_str(text).map_err(|e| RecitalError::ConfigError(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RecitalError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            RecitalError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(RecitalError::ConfigError(format!(
                "Config file size {} bytes exceeds maximum {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            RecitalError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Build a layer from `RECITAL_*` environment variables.
    pub fn from_env() -> Result<Self, RecitalError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a layer from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RecitalError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = get("RECITAL_PORT")
            .map(|v| {
                v.trim()
                    .parse::<u16>()
                    .map_err(|e| RecitalError::ConfigError(format!("RECITAL_PORT: {}", e)))
            })
            .transpose()?;
        let rate_limit = get("RECITAL_RATE_LIMIT")
            .map(|v| {
                v.trim()
                    .parse::<u32>()
                    .map_err(|e| RecitalError::ConfigError(format!("RECITAL_RATE_LIMIT: {}", e)))
            })
            .transpose()?;
        let backend = get("RECITAL_BACKEND")
            .map(|v| match v.trim().to_ascii_lowercase().as_str() {
                "redb" => Ok(Backend::Redb),
                "file" => Ok(Backend::File),
                other => Err(RecitalError::ConfigError(format!(
                    "RECITAL_BACKEND: unknown backend '{}'",
                    other
                ))),
            })
            .transpose()?;

        Ok(Self {
            host: get("RECITAL_HOST"),
            port,
            database: get("RECITAL_DATABASE").map(PathBuf::from),
            backend,
            public_dir: get("RECITAL_PUBLIC_DIR").map(PathBuf::from),
            rate_limit,
        })
    }
}

impl AppConfig {
    /// Resolve defaults, optional file, environment, then flags.
    pub fn load(config_file: Option<&Path>, flags: ConfigLayer) -> Result<Self, RecitalError> {
        let mut config = Self::default();
        if let Some(path) = config_file {
            config.apply(ConfigLayer::from_file(path)?);
        }
        config.apply(ConfigLayer::from_env()?);
        config.apply(flags);
        Ok(config)
    }

    /// Overlay every set field of `layer`.
    pub fn apply(&mut self, layer: ConfigLayer) {
        if let Some(host) = layer.host {
            self.host = host;
        }
        if let Some(port) = layer.port {
            self.port = port;
        }
        if let Some(database) = layer.database {
            self.database = database;
        }
        if let Some(backend) = layer.backend {
            self.backend = backend;
        }
        if let Some(public_dir) = layer.public_dir {
            self.public_dir = Some(public_dir);
        }
        if let Some(rate_limit) = layer.rate_limit {
            self.rate_limit = rate_limit;
        }
    }

    /// `host:port` for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn toml_layer_parses_all_keys() {
        let layer = ConfigLayer::from_toml_str(
            r#"
host = "0.0.0.0"
port = 8081
database = "data/poems.json"
backend = "file"
public_dir = "public"
rate_limit = 0
"#,
        )
        .expect("parse");

        assert_eq!(layer.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(layer.port, Some(8081));
        assert_eq!(layer.backend, Some(Backend::File));
        assert_eq!(layer.rate_limit, Some(0));
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        assert!(matches!(
            ConfigLayer::from_toml_str("colour = \"red\""),
            Err(RecitalError::ConfigError(_))
        ));
    }

    #[test]
    fn later_layers_win() {
        let mut config = AppConfig::default();
        config.apply(ConfigLayer {
            port: Some(7000),
            host: Some("0.0.0.0".to_string()),
            ..ConfigLayer::default()
        });
        config.apply(ConfigLayer {
            port: Some(7001),
            ..ConfigLayer::default()
        });

        assert_eq!(config.port, 7001);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.bind_addr(), "0.0.0.0:7001");
        assert_eq!(config.backend, Backend::Redb);
    }

    #[test]
    fn env_lookup_layer() {
        let vars = BTreeMap::from([
            ("RECITAL_PORT", "9000"),
            ("RECITAL_BACKEND", "FILE"),
            ("RECITAL_HOST", "  "),
        ]);
        let layer =
            ConfigLayer::from_lookup(|k| vars.get(k).map(|v| v.to_string())).expect("layer");

        assert_eq!(layer.port, Some(9000));
        assert_eq!(layer.backend, Some(Backend::File));
        assert_eq!(layer.host, None);
    }

    #[test]
    fn env_lookup_rejects_bad_port() {
        let result = ConfigLayer::from_lookup(|k| {
            (k == "RECITAL_PORT").then(|| "eighty".to_string())
        });
        assert!(result.is_err());
    }
}
