//! TOML Configuration File Support
//!
//! Centralized configuration loading for the stego client, supporting a TOML
//! configuration file at `~/.config/stego-client/client.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [service]
//! base_url = "http://localhost:5000"
//! encode_path = "/encode"
//! decode_path = "/decode"
//! timeout_secs = 120
//! connect_timeout_secs = 10
//!
//! [limits]
//! max_image_bytes = 26214400
//!
//! [ui]
//! dark_mode = true
//! star_count = 300
//! frame_rate = 10
//! download_dir = "~/Downloads"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::ServiceConfig;
use crate::starfield::DEFAULT_STAR_COUNT;

/// Directory name used under the XDG config/cache directories
const APP_DIR: &str = "stego-client";

/// Default image size limit (25 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 25 * 1024 * 1024;

/// Largest star count accepted from configuration
pub const MAX_STAR_COUNT: usize = 5000;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Service section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceToml {
    /// Base URL of the stego service
    pub base_url: Option<String>,

    /// Encode endpoint path
    pub encode_path: Option<String>,

    /// Decode endpoint path
    pub decode_path: Option<String>,

    /// Whole-request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: Option<u64>,
}

/// Limits section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsToml {
    /// Largest image accepted for selection, in bytes
    pub max_image_bytes: Option<u64>,
}

/// UI section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiToml {
    /// Start in dark mode
    pub dark_mode: Option<bool>,

    /// Number of background stars
    pub star_count: Option<usize>,

    /// Frames per second for the surface
    pub frame_rate: Option<u32>,

    /// Where encoded images are saved
    pub download_dir: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// Service configuration section
    pub service: ServiceToml,

    /// Limits configuration section
    pub limits: LimitsToml,

    /// UI configuration section
    pub ui: UiToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// How to reach the stego service
    pub service: ServiceConfig,

    /// Largest image accepted for selection, in bytes
    pub max_image_bytes: u64,

    /// Start in dark mode
    pub dark_mode: bool,

    /// Number of background stars
    pub star_count: usize,

    /// Frames per second for the surface
    pub frame_rate: u32,

    /// Where encoded images are saved (`None` = platform download dir)
    pub download_dir: Option<PathBuf>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            dark_mode: false,
            star_count: DEFAULT_STAR_COUNT,
            frame_rate: 10,
            download_dir: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Directory encoded images are saved into
    #[must_use]
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Check values that would make the client misbehave
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.service.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "service.base_url must be an http(s) URL, got '{url}'"
            )));
        }
        for (name, path) in [
            ("encode_path", &self.service.encode_path),
            ("decode_path", &self.service.decode_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::ValidationError(format!(
                    "service.{name} must start with '/', got '{path}'"
                )));
            }
        }
        if self.service.timeout.is_zero() || self.service.connect_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "service timeouts must be greater than zero".to_string(),
            ));
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_bytes must be greater than zero".to_string(),
            ));
        }
        if self.star_count > MAX_STAR_COUNT {
            return Err(ConfigError::ValidationError(format!(
                "ui.star_count must be at most {MAX_STAR_COUNT}, got {}",
                self.star_count
            )));
        }
        if !(1..=60).contains(&self.frame_rate) {
            return Err(ConfigError::ValidationError(format!(
                "ui.frame_rate must be between 1 and 60, got {}",
                self.frame_rate
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/stego-client/client.toml` or
/// `~/.config/stego-client/client.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR).join("client.toml"))
}

/// Get the default log file path for surfaces that own the terminal
#[must_use]
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("stego-tui.log")
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or the
/// resulting configuration is invalid. A missing config file is not an error.
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or the resulting configuration is invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    load_config_with_env(path, |name| std::env::var(name).ok())
}

/// Load configuration using `env` to look up environment variables
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig, ConfigError> {
    // Start with defaults
    let mut config = ClientConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_config = read_toml(config_path)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Environment overrides file values
    apply_env_config(&mut config, env);

    config.validate()?;
    Ok(config)
}

fn read_toml(path: &Path) -> Result<ClientToml, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ClientConfig, toml: &ClientToml) {
    // Service settings
    if let Some(ref url) = toml.service.base_url {
        config.service.base_url = url.clone();
    }
    if let Some(ref path) = toml.service.encode_path {
        config.service.encode_path = path.clone();
    }
    if let Some(ref path) = toml.service.decode_path {
        config.service.decode_path = path.clone();
    }
    if let Some(secs) = toml.service.timeout_secs {
        config.service.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = toml.service.connect_timeout_secs {
        config.service.connect_timeout = Duration::from_secs(secs);
    }

    // Limits
    if let Some(bytes) = toml.limits.max_image_bytes {
        config.max_image_bytes = bytes;
    }

    // UI settings
    if let Some(dark) = toml.ui.dark_mode {
        config.dark_mode = dark;
    }
    if let Some(count) = toml.ui.star_count {
        config.star_count = count;
    }
    if let Some(rate) = toml.ui.frame_rate {
        config.frame_rate = rate;
    }
    if let Some(ref dir) = toml.ui.download_dir {
        config.download_dir = Some(expand_home(dir));
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut ClientConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(url) = env("STEGO_SERVICE_URL") {
        config.service.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(secs) = env("STEGO_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
        config.service.timeout = Duration::from_secs(secs);
        config.source = ConfigSource::Env;
    }
    if let Some(bytes) = env("STEGO_MAX_IMAGE_BYTES").and_then(|v| v.parse::<u64>().ok()) {
        config.max_image_bytes = bytes;
        config.source = ConfigSource::Env;
    }
    if let Some(dark) = env("STEGO_DARK_MODE") {
        config.dark_mode = parse_flag(&dark);
        config.source = ConfigSource::Env;
    }
    if let Some(count) = env("STEGO_STAR_COUNT").and_then(|v| v.parse::<usize>().ok()) {
        config.star_count = count;
        config.source = ConfigSource::Env;
    }
    if let Some(dir) = env("STEGO_DOWNLOAD_DIR") {
        config.download_dir = Some(expand_home(&dir));
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Service base URL override
    pub service_url: Option<String>,

    /// Request timeout override (seconds)
    pub timeout_secs: Option<u64>,

    /// Dark mode override
    pub dark_mode: Option<bool>,

    /// Star count override
    pub star_count: Option<usize>,

    /// Download directory override
    pub download_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set service URL override
    #[must_use]
    pub fn with_service_url(mut self, url: String) -> Self {
        self.service_url = Some(url);
        self
    }

    /// Set timeout override
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set dark mode override
    #[must_use]
    pub fn with_dark_mode(mut self, dark: bool) -> Self {
        self.dark_mode = Some(dark);
        self
    }

    /// Set star count override
    #[must_use]
    pub fn with_star_count(mut self, count: usize) -> Self {
        self.star_count = Some(count);
        self
    }

    /// Set download directory override
    #[must_use]
    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = Some(dir);
        self
    }

    /// Apply overrides to a configuration and re-validate it
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override is invalid.
    pub fn apply(&self, config: &mut ClientConfig) -> Result<(), ConfigError> {
        if self.service_url.is_some()
            || self.timeout_secs.is_some()
            || self.dark_mode.is_some()
            || self.star_count.is_some()
            || self.download_dir.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.service_url {
            config.service.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.service.timeout = Duration::from_secs(secs);
        }
        if let Some(dark) = self.dark_mode {
            config.dark_mode = dark;
        }
        if let Some(count) = self.star_count {
            config.star_count = count;
        }
        if let Some(ref dir) = self.download_dir {
            config.download_dir = Some(dir.clone());
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
