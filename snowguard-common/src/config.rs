//! Bootstrap configuration
//!
//! Loaded once at startup from a TOML file. Resolution order for the file:
//! 1. Command-line argument (highest priority)
//! 2. `SNOWGUARD_CONFIG` environment variable
//! 3. `~/.config/snowguard/config.toml`, then `/etc/snowguard/config.toml`
//! 4. Compiled defaults (no file)
//!
//! A missing or unreadable file never stops startup: the dashboard logs a
//! warning and runs on defaults, which means sample data.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SNOWGUARD_CONFIG";

/// Top-level TOML layout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub warehouse: WarehouseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Snowflake connection parameters
///
/// Every field is optional so that an absent section simply means "not
/// configured". [`WarehouseConfig::missing_credentials`] decides whether a
/// connection is attempted at all.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// Account identifier, e.g. `xy12345.us-east-1`
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    /// OAuth access token or key-pair JWT
    #[serde(default)]
    pub token: Option<String>,
    /// `OAUTH` or `KEYPAIR_JWT`
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    /// Upper bound on each table fetch, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Overrides `https://<account>.snowflakecomputing.com`
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            account: None,
            user: None,
            token: None,
            token_type: default_token_type(),
            warehouse: None,
            role: None,
            database: None,
            schema: None,
            timeout_secs: default_timeout_secs(),
            base_url: None,
        }
    }
}

impl WarehouseConfig {
    /// Describe what is missing for a connection attempt, if anything
    pub fn missing_credentials(&self) -> Option<String> {
        let missing: Vec<&str> = [
            ("user", &self.user),
            ("account", &self.account),
            ("token", &self.token),
        ]
        .into_iter()
        .filter(|(_, v)| v.as_deref().map_or(true, |s| s.trim().is_empty()))
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            None
        } else {
            Some(format!(
                "Snowflake credentials not found in [warehouse] config (missing: {})",
                missing.join(", ")
            ))
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// SQL API root for this account
    pub fn api_base_url(&self) -> Option<String> {
        if let Some(url) = &self.base_url {
            return Some(url.trim_end_matches('/').to_string());
        }
        self.account
            .as_deref()
            .map(|account| format!("https://{}.snowflakecomputing.com", account.trim()))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_token_type() -> String {
    "OAUTH".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve and load the config file, falling back to defaults
    pub fn load(cli_path: Option<&Path>) -> Self {
        match resolve_config_path(cli_path) {
            Some(path) => match Self::from_file(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring configuration file: {}", e);
                    Self::default()
                }
            },
            None => {
                warn!("No configuration file found, using defaults");
                Self::default()
            }
        }
    }
}

/// Find the config file following the documented priority order
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: user then system config file
    let user_config = dirs::config_dir().map(|d| d.join("snowguard").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/snowguard/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.warehouse.timeout_secs, 15);
        assert_eq!(config.warehouse.token_type, "OAUTH");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [warehouse]
            account = "xy12345.us-east-1"
            user = "ADMIN_USER"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.warehouse.account.as_deref(), Some("xy12345.us-east-1"));
        assert_eq!(config.warehouse.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_missing_credentials_lists_fields() {
        let config = WarehouseConfig {
            account: Some("xy12345".to_string()),
            user: Some("  ".to_string()),
            ..Default::default()
        };
        let msg = config.missing_credentials().unwrap();
        assert!(msg.contains("missing: user, token"));
    }

    #[test]
    fn test_complete_credentials() {
        let config = WarehouseConfig {
            account: Some("xy12345".to_string()),
            user: Some("ADMIN_USER".to_string()),
            token: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(config.missing_credentials().is_none());
    }

    #[test]
    fn test_api_base_url() {
        let mut config = WarehouseConfig {
            account: Some("xy12345.us-east-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.api_base_url().as_deref(),
            Some("https://xy12345.us-east-1.snowflakecomputing.com")
        );

        config.base_url = Some("http://127.0.0.1:9999/".to_string());
        assert_eq!(config.api_base_url().as_deref(), Some("http://127.0.0.1:9999"));
    }

    #[test]
    fn test_zero_timeout_clamped() {
        let config = WarehouseConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }
}
