//! # Application Configuration
//!
//! Settings for the `flohmarkt` binary.
//!
//! ## Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags         --db, --market, --log                    │
//! │  2. Environment variables      FLOHMARKT_DB, FLOHMARKT_MARKET,          │
//! │                                FLOHMARKT_LOG                            │
//! │  3. Config file                --config <path> or ./flohmarkt.toml      │
//! │  4. Defaults                   ./flohmarkt.db, no market, info          │
//! │                                                                         │
//! │  RUST_LOG, when set, replaces the log filter entirely.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Flags and environment variables are resolved by clap (see [`crate::Cli`]);
//! this module handles the file and the defaults.
//!
//! ## Configuration File Format
//! ```toml
//! # flohmarkt.toml
//! [database]
//! path = "/var/lib/flohmarkt/flohmarkt.db"
//! max_connections = 4
//!
//! [market]
//! current = 3
//!
//! [logging]
//! filter = "info,sqlx=warn"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use flohmarkt_core::MarketId;
use flohmarkt_db::DbConfig;

use crate::OutputFormat;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "flohmarkt.toml";

/// Database file used when nothing else is configured.
pub const DEFAULT_DB_PATH: &str = "./flohmarkt.db";

/// Log filter used when neither RUST_LOG nor a configured filter is set.
pub const DEFAULT_LOG_FILTER: &str = "info,flohmarkt=debug,sqlx=warn";

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file {path} not found")]
    NotFound { path: PathBuf },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(&'static str),
}

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}
fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// `[market]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSettings {
    /// Market the cashier and settlement commands act on.
    #[serde(default)]
    pub current: Option<i64>,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub market: MarketSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    /// Output format; only ever set from the command line.
    #[serde(skip)]
    pub format: OutputFormat,
}

impl AppConfig {
    /// Loads the config file on top of the defaults.
    ///
    /// An explicit path must exist. Without one, `./flohmarkt.toml` is used
    /// when present and the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                Self::from_file(path)
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Reads and parses one config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses TOML; missing keys fall back to defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Checks the merged values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(market) = self.market.current {
            if market < 1 {
                return Err(ConfigError::InvalidValue {
                    field: "market",
                    reason: format!("{market} is not a market id"),
                });
            }
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The market to act on, for commands that need one.
    pub fn require_market(&self) -> Result<MarketId, ConfigError> {
        self.market
            .current
            .map(MarketId)
            .ok_or(ConfigError::MissingRequired(
                "market (use --market, FLOHMARKT_MARKET or [market] current)",
            ))
    }

    /// Database pool settings derived from this config.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .min_connections(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.database.path, PathBuf::from("./flohmarkt.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.market.current, None);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [database]
            path = "/srv/markt.db"

            [market]
            current = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/srv/markt.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.market.current, Some(2));
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_malformed_file() {
        let err = AppConfig::from_toml_str("[database\npath = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_explicit_missing_file() {
        let path = Path::new("/definitely/not/here/flohmarkt.toml");
        let err = AppConfig::load(Some(path)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "flohmarkt-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[logging]\nfilter = \"warn\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.logging.filter, "warn");
        assert_eq!(config.database.path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.market.current = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "market", .. })
        ));

        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.filter = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_market() {
        let mut config = AppConfig::default();
        assert!(matches!(
            config.require_market(),
            Err(ConfigError::MissingRequired(_))
        ));

        config.market.current = Some(4);
        assert_eq!(config.require_market().unwrap(), MarketId(4));
    }

    #[test]
    fn test_db_config() {
        let mut config = AppConfig::default();
        config.database.max_connections = 2;
        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(db.max_connections, 2);
    }
}
