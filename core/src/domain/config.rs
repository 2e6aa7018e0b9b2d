// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Database Configuration Types
//
// Defines the configuration manifest that materializes the connection tree:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Named connection specs (driver kind, default flag, driver parameters)
// - Discovery of the config file and environment overrides

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::connection::{ConnectionId, ConnectionTree, DEFAULT_KEY};

pub const API_VERSION: &str = "multidb/v1";
pub const KIND: &str = "DatabaseConfig";

/// Top-level Kubernetes-style database configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfigManifest {
    /// API version (must be "multidb/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "DatabaseConfig")
    pub kind: String,

    /// Manifest metadata (name, labels)
    pub metadata: ManifestMetadata,

    /// Connection specification
    pub spec: DatabaseConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable name of the application owning the connections
    pub name: String,

    /// Optional: Configuration version for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Content under spec:
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfigSpec {
    /// Named connections, in declaration order
    #[serde(default)]
    pub connections: ConnectionTree,
}

impl Default for DatabaseConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "multidb".to_string(),
                version: None,
                labels: None,
            },
            spec: DatabaseConfigSpec::default(),
        }
    }
}

impl DatabaseConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// The connection tree handed to the registry
    pub fn connections(&self) -> &ConnectionTree {
        &self.spec.connections
    }

    /// Discover configuration file using precedence order
    /// 1. MULTIDB_CONFIG_PATH environment variable
    /// 2. ./multidb.yaml (working directory)
    /// 3. ~/.multidb/config.yaml (user home)
    /// 4. /etc/multidb/config.yaml (system, Unix) or C:\ProgramData\Multidb\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        Self::discover_from(
            std::env::var_os("MULTIDB_CONFIG_PATH").map(PathBuf::from),
            Path::new("."),
            dirs::home_dir().as_deref(),
        )
    }

    /// Discovery against explicit roots, falling back to the system path
    pub fn discover_from(
        env_path: Option<PathBuf>,
        working_dir: &Path,
        home: Option<&Path>,
    ) -> Option<PathBuf> {
        if let Some(path) = env_path {
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = working_dir.join("multidb.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = home {
            let user_config = home.join(".multidb").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/multidb/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Multidb\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must load
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using empty defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("MULTIDB_DEFAULT_CONNECTION") {
            self.override_default(&id);
        }
    }

    /// Make `id` the only connection flagged default. Unknown ids are ignored.
    pub fn override_default(&mut self, id: &str) -> bool {
        if !self.spec.connections.contains_key(id) {
            tracing::warn!(
                "Default connection override '{}' is not configured. Ignoring.",
                id
            );
            return false;
        }

        tracing::info!("Environment override: MULTIDB_DEFAULT_CONNECTION={}", id);
        for (conn_id, spec) in self.spec.connections.iter_mut() {
            spec.clear_default();
            if conn_id.as_str() == id {
                spec.set(DEFAULT_KEY, true);
            }
        }
        true
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        for (id, spec) in &self.spec.connections {
            if id.as_str().is_empty() {
                anyhow::bail!("Connection id cannot be empty");
            }

            match spec.adapter() {
                Some(adapter) if !adapter.trim().is_empty() => {}
                _ => anyhow::bail!("Connection '{}' is missing the 'adapter' key", id),
            }
        }

        let defaults: Vec<&ConnectionId> = self
            .spec
            .connections
            .iter()
            .filter(|(_, spec)| spec.is_default())
            .map(|(id, _)| id)
            .collect();
        if defaults.len() > 1 {
            // Allowed: the last one wins
            tracing::warn!(
                "Several connections are flagged default ({:?}); '{}' wins",
                defaults,
                defaults[defaults.len() - 1]
            );
        }

        Ok(())
    }
}
