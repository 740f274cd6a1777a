//! Configuration loading and root folder resolution
//!
//! Settings priority (highest first):
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (`ECOTOUR_*`)
//! 3. TOML config file
//! 4. Built-in defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ECOTOUR_CONFIG";
pub const ROOT_FOLDER_ENV_VAR: &str = "ECOTOUR_ROOT_FOLDER";
pub const PORT_ENV_VAR: &str = "ECOTOUR_PORT";
pub const SUGGESTION_KEY_ENV_VAR: &str = "ECOTOUR_SUGGESTION_API_KEY";
pub const PLACES_KEY_ENV_VAR: &str = "ECOTOUR_PLACES_API_KEY";
pub const ROUTES_KEY_ENV_VAR: &str = "ECOTOUR_ROUTES_API_KEY";

const DATABASE_FILE_NAME: &str = "ecotour.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the tour database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub services: ServicesConfig,

    /// Buffered events per EventBus subscriber
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            services: ServicesConfig::default(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// HTTP server binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Endpoints and credentials for the external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Generative POI suggestion endpoint
    #[serde(default = "default_suggestion_url")]
    pub suggestion_url: String,
    #[serde(default)]
    pub suggestion_api_key: Option<String>,

    /// Places text-search endpoint
    #[serde(default = "default_places_url")]
    pub places_url: String,
    /// Places photo endpoint used to turn photo references into image URLs
    #[serde(default = "default_places_photo_url")]
    pub places_photo_url: String,
    #[serde(default)]
    pub places_api_key: Option<String>,
    #[serde(default = "default_photo_max_width")]
    pub photo_max_width: u32,
    #[serde(default = "default_places_rps")]
    pub places_requests_per_second: u32,

    /// Route optimization endpoint
    #[serde(default = "default_routes_url")]
    pub routes_url: String,
    #[serde(default)]
    pub routes_api_key: Option<String>,

    /// Total timeout for any single service call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            suggestion_url: default_suggestion_url(),
            suggestion_api_key: None,
            places_url: default_places_url(),
            places_photo_url: default_places_photo_url(),
            places_api_key: None,
            photo_max_width: default_photo_max_width(),
            places_requests_per_second: default_places_rps(),
            routes_url: default_routes_url(),
            routes_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_event_bus_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5790
}

fn default_suggestion_url() -> String {
    "http://127.0.0.1:5791/v1/suggest".to_string()
}

fn default_places_url() -> String {
    "https://maps.googleapis.com/maps/api/place/textsearch/json".to_string()
}

fn default_places_photo_url() -> String {
    "https://maps.googleapis.com/maps/api/place/photo".to_string()
}

fn default_photo_max_width() -> u32 {
    800
}

fn default_places_rps() -> u32 {
    5
}

fn default_routes_url() -> String {
    "http://127.0.0.1:5792/v1/optimize".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Apply `ECOTOUR_*` environment overrides
    ///
    /// Blank values are ignored. An unparsable port is a configuration error.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(folder) = non_blank_env(ROOT_FOLDER_ENV_VAR) {
            self.root_folder = Some(PathBuf::from(folder));
        }
        if let Some(port) = non_blank_env(PORT_ENV_VAR) {
            self.server.port = port.parse().map_err(|_| {
                Error::Config(format!("{} is not a valid port: {}", PORT_ENV_VAR, port))
            })?;
        }
        if let Some(key) = non_blank_env(SUGGESTION_KEY_ENV_VAR) {
            self.services.suggestion_api_key = Some(key);
        }
        if let Some(key) = non_blank_env(PLACES_KEY_ENV_VAR) {
            self.services.places_api_key = Some(key);
        }
        if let Some(key) = non_blank_env(ROUTES_KEY_ENV_VAR) {
            self.services.routes_api_key = Some(key);
        }
        Ok(())
    }

    /// Reject values the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.event_bus_capacity == 0 {
            return Err(Error::Config(
                "event_bus_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Root folder from config, falling back to the OS default
    pub fn resolve_root_folder(&self) -> PathBuf {
        self.root_folder
            .clone()
            .unwrap_or_else(default_root_folder)
    }

    /// Tour database location inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.resolve_root_folder().join(DATABASE_FILE_NAME)
    }
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path given on the command line
    Explicit(PathBuf),
    /// Found by [`find_config_file`]
    Discovered(PathBuf),
    /// No file found, built-in defaults
    Defaults,
}

impl ConfigSource {
    /// Report the source once logging is installed
    pub fn log(&self) {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => {
                info!("Loaded configuration from {}", path.display());
            }
            ConfigSource::Defaults => {
                warn!("No config file found, using built-in defaults");
            }
        }
    }
}

/// Load configuration with graceful degradation
///
/// An explicit path must exist and parse. Without one, the first discovered
/// config file is used, falling back to defaults. Environment overrides are
/// applied last and the result is validated.
///
/// Nothing is logged here: callers usually load the config before tracing is
/// installed, so the returned [`ConfigSource`] is reported via
/// [`ConfigSource::log`] afterwards.
pub fn load_config(explicit: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    let (mut config, source) = match explicit {
        Some(path) => (
            TomlConfig::from_file(path)?,
            ConfigSource::Explicit(path.to_path_buf()),
        ),
        None => match find_config_file() {
            Some(path) => (TomlConfig::from_file(&path)?, ConfigSource::Discovered(path)),
            None => (TomlConfig::default(), ConfigSource::Defaults),
        },
    };

    config.apply_env_overrides()?;
    config.validate()?;
    Ok((config, source))
}

/// Locate a config file
///
/// `ECOTOUR_CONFIG` first (skipped if the file is missing), then
/// `~/.config/ecotour/config.toml`, then
/// `/etc/ecotour/config.toml` on unix.
pub fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = non_blank_env(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("ecotour").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/ecotour/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ecotour"))
        .unwrap_or_else(|| PathBuf::from("./ecotour_data"))
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
