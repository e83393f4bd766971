//! Configuration loading and resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command-line and environment values are applied by the binary through
//! [`ConfigOverrides`]; this module owns the TOML layer and the defaults.
//! A missing TOML file is not an error: the defaults are used and a warning
//! is logged.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::accuracy::DEFAULT_DIVERGENCE_THRESHOLD_PCT;
use crate::{Error, Result};

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "GWAS_VIEWER_CONFIG";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5730;

/// Default query memoization window
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Bounds on the number of pages retrieved as chat context
pub const MIN_CONTEXT_PAGES: u32 = 1;
pub const MAX_CONTEXT_PAGES: u32 = 10;

/// Completion models offered in the chat settings
pub const DEFAULT_CHAT_MODELS: [&str; 3] = ["mistral-large2", "llama3.1-70b", "llama3.1-8b"];

/// Complete viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub warehouse: WarehouseConfig,
    pub snowflake: SnowflakeConfig,
    pub chat: ChatConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where trait and page rows are read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseBackend {
    /// Local read-only SQLite mirror of the warehouse tables
    #[default]
    Sqlite,
    /// Snowflake SQL API
    Snowflake,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub backend: WarehouseBackend,
    /// SQLite mirror path; compiled default when unset
    pub database_path: Option<PathBuf>,
    pub cache_ttl_secs: u64,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            backend: WarehouseBackend::default(),
            database_path: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl WarehouseConfig {
    /// Configured SQLite path, or the platform default
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(default_database_path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowflakeConfig {
    /// e.g. `https://myorg-myaccount.snowflakecomputing.com`
    pub account_url: Option<String>,
    /// Environment variable holding the bearer token
    pub token_env: String,
    /// Value of `X-Snowflake-Authorization-Token-Type`
    pub token_type: String,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SnowflakeConfig {
    fn default() -> Self {
        Self {
            account_url: None,
            token_env: "SNOWFLAKE_TOKEN".to_string(),
            token_type: "PROGRAMMATIC_ACCESS_TOKEN".to_string(),
            warehouse: None,
            role: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub default_model: String,
    pub models: Vec<String>,
    pub default_context_pages: u32,
    /// Embedding model used to vectorize questions for search
    pub embed_model: String,
    /// Fully-qualified Cortex Search service name
    pub search_service: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_CHAT_MODELS[0].to_string(),
            models: DEFAULT_CHAT_MODELS.iter().map(|m| m.to_string()).collect(),
            default_context_pages: 5,
            embed_model: "voyage-multimodal-3".to_string(),
            search_service: "GWAS.PDF_PROCESSING.MULTIMODAL_SEARCH_SERVICE".to_string(),
        }
    }
}

impl ChatConfig {
    /// Clamp a requested context-page count into the allowed range
    pub fn clamp_context_pages(requested: Option<u32>, default: u32) -> u32 {
        requested
            .unwrap_or(default)
            .clamp(MIN_CONTEXT_PAGES, MAX_CONTEXT_PAGES)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Gap (percentage points) at which reported accuracy is flagged
    pub divergence_threshold_pct: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            divergence_threshold_pct: DEFAULT_DIVERGENCE_THRESHOLD_PCT,
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ViewerConfig {
    /// Apply higher-priority overrides on top of file/default values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(path) = overrides.database_path {
            self.warehouse.database_path = Some(path);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Reject configurations the viewer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }
        if self.warehouse.cache_ttl_secs == 0 {
            return Err(Error::Config("warehouse.cache_ttl_secs must be greater than zero".to_string()));
        }
        if self.chat.models.is_empty() {
            return Err(Error::Config("chat.models must list at least one model".to_string()));
        }
        if !self.chat.models.contains(&self.chat.default_model) {
            return Err(Error::Config(format!(
                "chat.default_model '{}' is not in chat.models",
                self.chat.default_model
            )));
        }
        if !(MIN_CONTEXT_PAGES..=MAX_CONTEXT_PAGES).contains(&self.chat.default_context_pages) {
            return Err(Error::Config(format!(
                "chat.default_context_pages must be between {} and {}",
                MIN_CONTEXT_PAGES, MAX_CONTEXT_PAGES
            )));
        }
        if !self.analytics.divergence_threshold_pct.is_finite()
            || self.analytics.divergence_threshold_pct < 0.0
        {
            return Err(Error::Config(
                "analytics.divergence_threshold_pct must be a non-negative number".to_string(),
            ));
        }
        if self.warehouse.backend == WarehouseBackend::Snowflake
            && self.snowflake.account_url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(Error::Config(
                "snowflake.account_url is required when warehouse.backend = \"snowflake\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pick the config file path: CLI argument, then environment, then platform default
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Platform config file location (`~/.config/gwas-viewer/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gwas-viewer").join("config.toml"))
}

/// Platform default location of the SQLite mirror
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("gwas-viewer").join("gwas.db"))
        .unwrap_or_else(|| PathBuf::from("./gwas.db"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<ViewerConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the config file if it exists, otherwise fall back to defaults
///
/// A missing file only warns; a file that exists but cannot be parsed is an
/// error so that typos are not silently ignored.
pub fn load_or_default(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) if path.exists() => {
            let config = load_toml_config(path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!("Config file not found at {}; using defaults", path.display());
            Ok(ViewerConfig::default())
        }
        None => {
            warn!("No config directory for this platform; using defaults");
            Ok(ViewerConfig::default())
        }
    }
}
