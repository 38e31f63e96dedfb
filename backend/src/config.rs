//! Server configuration.
//!
//! Read from the environment at startup. A `.env` file in the working
//! directory is loaded first, so local setups can keep settings there.

use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE: &str = "sheets.sqlite";
/// 10 MB, enough for a few thousand spreadsheet rows as JSON.
const DEFAULT_PAYLOAD_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{key} must be {expected}, got '{value}'")]
pub struct ConfigError {
    pub key: &'static str,
    pub expected: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Largest accepted request body in bytes, for JSON imports and CSV uploads.
    pub payload_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE),
            payload_limit: DEFAULT_PAYLOAD_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(host) = lookup("SHEETS_HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup("SHEETS_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError {
                key: "SHEETS_PORT",
                expected: "a port number",
                value: port.clone(),
            })?;
        }
        if let Some(path) = lookup("SHEETS_DATABASE").filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path.trim());
        }
        if let Some(limit) = lookup("SHEETS_PAYLOAD_LIMIT") {
            config.payload_limit = limit
                .trim()
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError {
                    key: "SHEETS_PAYLOAD_LIMIT",
                    expected: "a positive number of bytes",
                    value: limit.clone(),
                })?;
        }
        Ok(config)
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
