use crate::error::ConfigError;
use crate::scrapers::types::Endpoints;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client settings shared by every marketplace
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    /// Honour `HTTP_PROXY` / `HTTPS_PROXY` from the environment
    pub use_system_proxy: bool,
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            use_system_proxy: true,
        }
    }
}

/// Application configuration, read from an optional TOML file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_file: PathBuf,
    /// How many of the cheapest results the deals view shows
    pub top_deals: usize,
    pub http: HttpSettings,
    pub marketplaces: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("product_prices.db"),
            log_file: PathBuf::from("price_tracker.log"),
            top_deals: 5,
            http: HttpSettings::default(),
            marketplaces: Endpoints::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or fall back to defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_deals == 0 {
            return Err(ConfigError::Invalid("top_deals must be at least 1".into()));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid("http.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}
