// src/config.rs

//! Configuration for the package manager.
//!
//! A `Configuration` is an immutable bundle of the root directories and the
//! repository endpoint. All per-coordinate paths are pure derivations from
//! it; nothing here touches the filesystem or the network.
//!
//! Configuration is assembled exactly once by merging an ordered list of
//! overlay layers (built-in defaults, system file, user file, explicit
//! `--config` file, command-line flags). Later layers win per field. The
//! result is never mutated; `missing_fields` reports which mandatory fields
//! are still unset so the CLI can refuse to run before any destructive or
//! network operation happens.
//!
//! The on-disk format is TOML with camelCase field names:
//!
//! ```toml
//! packageDir = "/var/lib/stevedore/packages"
//! packageBaseUrl = "https://packages.example.com/repo"
//! username = "deploy"
//! password = "secret"
//! runtimeBaseDir = "/var/run/stevedore"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::coordinate::Coordinate;
use crate::error::{Error, Result};

/// Name of the download cache directory relative to the package dir
pub const DOWNLOAD_DIR: &str = ".download";

/// System-wide configuration file path
const SYSTEM_CONFIG_FILE: &str = "/etc/stevedore/config.toml";

/// Configuration file name inside the user config directory
const USER_CONFIG_FILE: &str = "stevedore/config.toml";

/// Mandatory configuration fields, for the missing-field sanity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    PackageDir,
    PackageBaseUrl,
    RuntimeBaseDir,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigField::PackageDir => "packageDir",
            ConfigField::PackageBaseUrl => "packageBaseUrl",
            ConfigField::RuntimeBaseDir => "runtimeBaseDir",
        };
        write!(f, "{name}")
    }
}

/// Immutable package manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Root directory under which packages are installed
    pub package_dir: PathBuf,

    /// Base URL of the package repository
    pub package_base_url: String,

    /// Repository username, if the repository requires authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Repository password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Base directory for per-service runtime directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_base_dir: Option<PathBuf>,
}

impl Configuration {
    /// Create a configuration with just the mandatory fields
    pub fn new(package_dir: impl Into<PathBuf>, package_base_url: impl Into<String>) -> Self {
        Self {
            package_dir: package_dir.into(),
            package_base_url: package_base_url.into(),
            username: None,
            password: None,
            runtime_base_dir: None,
        }
    }

    /// Directory used for downloaded archives, derived from the package dir
    pub fn download_dir(&self) -> PathBuf {
        self.package_dir.join(DOWNLOAD_DIR)
    }

    /// Canonical install directory for a coordinate
    pub fn install_path_for(&self, coordinate: &Coordinate) -> PathBuf {
        self.package_dir.join(coordinate.path_fragment())
    }

    /// Destination file inside the download cache for a coordinate
    pub fn download_path_for(&self, coordinate: &Coordinate) -> PathBuf {
        self.download_dir()
            .join(coordinate.path_fragment())
            .join(coordinate.filename())
    }

    /// Report mandatory fields that are still empty.
    ///
    /// An empty result means the configuration is usable for install and
    /// uninstall operations. `RuntimeBaseDir` is only mandatory for
    /// commands that need to derive a runtime directory, so callers check
    /// for it separately via [`Configuration::runtime_base_dir`].
    pub fn missing_fields(&self) -> Vec<ConfigField> {
        let mut missing = Vec::new();
        if self.package_dir.as_os_str().is_empty() {
            missing.push(ConfigField::PackageDir);
        }
        if self.package_base_url.is_empty() {
            missing.push(ConfigField::PackageBaseUrl);
        }
        missing
    }

    /// Render the configuration in its on-disk TOML form
    pub fn to_toml(&self) -> String {
        // Serialization of this struct cannot fail: all fields are strings
        // and paths.
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// One layer of configuration overrides.
///
/// Every field is optional; merging folds layers in priority order, with
/// later (higher-priority) layers winning per field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigOverlay {
    pub package_dir: Option<PathBuf>,
    pub package_base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub runtime_base_dir: Option<PathBuf>,
}

impl ConfigOverlay {
    /// Read an overlay from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("cannot read {}: {e}", path.display())))?;
        let overlay = toml::from_str(&text)?;
        Ok(overlay)
    }

    /// Fold another layer on top of this one; fields set in `higher` win
    pub fn merged_with(mut self, higher: ConfigOverlay) -> Self {
        self.package_dir = higher.package_dir.or(self.package_dir);
        self.package_base_url = higher.package_base_url.or(self.package_base_url);
        self.username = higher.username.or(self.username);
        self.password = higher.password.or(self.password);
        self.runtime_base_dir = higher.runtime_base_dir.or(self.runtime_base_dir);
        self
    }
}

impl Configuration {
    /// Build the final configuration from overlay layers in priority order
    /// (lowest first). Fields no layer sets come out empty and are caught
    /// by [`Configuration::missing_fields`].
    pub fn from_layers(layers: impl IntoIterator<Item = ConfigOverlay>) -> Self {
        let merged = layers
            .into_iter()
            .fold(ConfigOverlay::default(), ConfigOverlay::merged_with);

        Self {
            package_dir: merged.package_dir.unwrap_or_default(),
            package_base_url: merged.package_base_url.unwrap_or_default(),
            username: merged.username,
            password: merged.password,
            runtime_base_dir: merged.runtime_base_dir,
        }
    }

    /// Assemble the effective configuration from the standard locations.
    ///
    /// Priority order, lowest first: built-in defaults, the system config
    /// file, the user config file, an explicit `--config` file, and
    /// command-line flag overrides. Files that do not exist are skipped;
    /// an explicitly named file that cannot be read is an error.
    pub fn discover(explicit_file: Option<&Path>, flags: ConfigOverlay) -> Result<Self> {
        let mut layers = vec![Self::defaults()];

        for path in [
            Some(PathBuf::from(SYSTEM_CONFIG_FILE)),
            dirs::config_dir().map(|d| d.join(USER_CONFIG_FILE)),
        ]
        .into_iter()
        .flatten()
        {
            if path.exists() {
                info!("loading configuration from {}", path.display());
                layers.push(ConfigOverlay::from_file(&path)?);
            } else {
                debug!("no configuration file at {}", path.display());
            }
        }

        if let Some(path) = explicit_file {
            info!("loading configuration from {}", path.display());
            layers.push(ConfigOverlay::from_file(path)?);
        }

        layers.push(flags);
        Ok(Self::from_layers(layers))
    }

    /// Last-ditch defaults used when no configuration file sets a field.
    ///
    /// The package dir defaults to a per-user data directory; there is no
    /// default repository URL, so an unconfigured repository shows up in
    /// `missing_fields` before any network operation is attempted.
    fn defaults() -> ConfigOverlay {
        ConfigOverlay {
            package_dir: dirs::data_local_dir().map(|d| d.join("stevedore/packages")),
            ..ConfigOverlay::default()
        }
    }
}
