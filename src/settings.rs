//! Process settings
//!
//! Layered from lowest to highest precedence:
//! 1. Built-in defaults
//! 2. TOML settings file (`--config`, else `centralconfig.toml` in `$HOME`
//!    or the working directory)
//! 3. `CENTRALCONFIG_*` environment variables
//! 4. Command-line flags (applied by the binary)
//!
//! ```toml
//! [server]
//! port = 3000
//! bind = ""
//! allowed-origins = "*"
//!
//! [datastore]
//! type = "file"
//! database = "config.db"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Settings file looked up when no explicit path is given
pub const SETTINGS_FILE_NAME: &str = "centralconfig.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "CENTRALCONFIG";

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub server: ServerSettings,
    pub datastore: DatastoreSettings,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerSettings {
    pub port: u16,

    /// Interface to bind; empty means all interfaces
    pub bind: String,

    /// `*` or a comma-separated list of origins allowed by CORS
    pub allowed_origins: String,
}

/// Datastore selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DatastoreSettings {
    #[serde(rename = "type")]
    pub kind: DatastoreKind,

    /// Store file for the `file` datastore
    pub database: PathBuf,
}

/// Available datastore backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatastoreKind {
    #[default]
    File,
    Memory,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 3000,
            bind: String::new(),
            allowed_origins: "*".to_string(),
        }
    }
}

impl Default for DatastoreSettings {
    fn default() -> Self {
        Self {
            kind: DatastoreKind::File,
            database: PathBuf::from("config.db"),
        }
    }
}

impl FromStr for DatastoreKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(DatastoreKind::File),
            "memory" => Ok(DatastoreKind::Memory),
            other => Err(StoreError::Config(format!(
                "Unknown datastore type '{}' (expected 'file' or 'memory')",
                other
            ))),
        }
    }
}

impl fmt::Display for DatastoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatastoreKind::File => write!(f, "file"),
            DatastoreKind::Memory => write!(f, "memory"),
        }
    }
}

/// Settings plus the file they were read from
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,

    /// `None` when no settings file was found (defaults + environment only)
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Load settings from file and process environment
    ///
    /// An explicit `path` must be readable; a missing default file is not an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<LoadedSettings> {
        let source = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::search_paths().into_iter().find(|p| p.is_file()),
        };

        let mut settings = match &source {
            Some(path) => Self::from_file(path)?,
            None => Settings::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;

        Ok(LoadedSettings { settings, source })
    }

    /// Parse a TOML settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!(
                "Cannot read settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Default settings file locations, in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(2);
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join(SETTINGS_FILE_NAME));
        }
        paths.push(PathBuf::from(".").join(SETTINGS_FILE_NAME));
        paths
    }

    /// Apply `CENTRALCONFIG_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

        if let Some(port) = var("SERVER_PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                StoreError::Config(format!("Invalid {}_SERVER_PORT '{}'", ENV_PREFIX, port))
            })?;
        }
        if let Some(bind) = var("SERVER_BIND") {
            self.server.bind = bind;
        }
        if let Some(origins) = var("SERVER_ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins;
        }
        if let Some(kind) = var("DATASTORE_TYPE") {
            self.datastore.kind = kind.parse()?;
        }
        if let Some(database) = var("DATASTORE_DATABASE") {
            self.datastore.database = PathBuf::from(database);
        }

        Ok(())
    }
}

impl ServerSettings {
    /// `host:port` to listen on
    pub fn listen_addr(&self) -> String {
        let host = if self.bind.trim().is_empty() {
            "0.0.0.0"
        } else {
            self.bind.trim()
        };
        format!("{}:{}", host, self.port)
    }

    /// Parsed CORS origin list
    pub fn allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}
