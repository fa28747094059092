//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed with `DYNADUPE_` (e.g. `DYNADUPE_PAGE_SIZE=100`)
//! 4. Command-line flags, applied with [`Config::merge_cli`]
//!
//! # Example file
//!
//! ```toml
//! endpoint_url = "http://localhost:8000"
//! index_name = "email-index"
//! page_size = 200
//! progress = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::accessor::ConnectSettings;
use crate::cli::Cli;

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "DYNADUPE_";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A provider yielded a value of the wrong shape.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Custom DynamoDB endpoint (DynamoDB Local, LocalStack).
    pub endpoint_url: Option<String>,
    /// Secondary index name; the attribute name is used when unset.
    pub index_name: Option<String>,
    /// Page size for scan and query requests; service default when unset.
    pub page_size: Option<u32>,
    /// Show progress bars on stderr.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            index_name: None,
            page_size: None,
            progress: true,
        }
    }
}

impl Config {
    /// Load configuration, honoring an explicit `--config` path.
    ///
    /// Without an explicit path the platform default is tried; a missing
    /// default file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if `explicit` points at a missing
    /// file, and `ConfigError::Invalid` for malformed TOML or env values.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_from_path(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from_path(&path),
                None => Self::extract(Self::base_figment()),
            },
        }
    }

    /// Load defaults, then `path` if it exists, then the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if any provider cannot be extracted.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading configuration from {}", path.display());
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Platform-specific default location of `config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dynadupe", "dynadupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line flags, which take precedence over every other layer.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.endpoint_url {
            self.endpoint_url = Some(url.clone());
        }
        if let Some(name) = &cli.index_name {
            self.index_name = Some(name.clone());
        }
        if let Some(size) = cli.page_size {
            self.page_size = Some(size);
        }
        if cli.no_progress {
            self.progress = false;
        }
    }

    /// Connection settings for `region`/`table` with this configuration applied.
    #[must_use]
    pub fn connect_settings(&self, region: &str, table: &str) -> ConnectSettings {
        ConnectSettings::new(region, table)
            .with_endpoint_url(self.endpoint_url.clone())
            .with_index_name(self.index_name.clone())
            .with_page_size(self.page_size)
    }
}
