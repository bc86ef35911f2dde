//! Configuration management for PulseChain

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{ChainError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_DOTENV_PATH: &str = ".env";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests running longer than this are answered with 408.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Combined size of all header names and values.
    #[serde(default = "default_max_header_bytes")]
    pub max_header_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
            max_header_bytes: default_max_header_bytes(),
        }
    }
}

impl ServerConfig {
    /// `host:port`, with IPv6 literals bracketed.
    pub fn bind_addr(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{}]:{}", ip, self.port),
            _ => format!("{}:{}", self.host, self.port),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Accepted BPM range for new blocks.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_min_bpm")]
    pub min_bpm: i64,
    #[serde(default = "default_max_bpm")]
    pub max_bpm: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_bpm: default_min_bpm(),
            max_bpm: default_max_bpm(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_max_header_bytes() -> usize {
    1024 * 1024
}

fn default_min_bpm() -> i64 {
    0
}

fn default_max_bpm() -> i64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Load `./config.toml` (or defaults when absent) and apply `HOST`/`PORT`
/// from the process environment, falling back to `./.env`.
pub fn load_config() -> Result<Config> {
    load_config_with_env(DEFAULT_CONFIG_PATH, DEFAULT_DOTENV_PATH)
}

/// Like [`load_config`] but reads the config file at `path` and the dotenv
/// file at `dotenv_path`.
pub fn load_config_with_env(
    path: impl AsRef<Path>,
    dotenv_path: impl AsRef<Path>,
) -> Result<Config> {
    let mut config = load_config_from(path)?;
    let dotenv = load_dotenv(dotenv_path)?;
    apply_env_overrides(&mut config, |key| {
        std::env::var(key).ok().or_else(|| dotenv.get(key).cloned())
    })?;
    validate(&config)?;
    Ok(config)
}

/// Parse a dotenv file into a map without touching the process environment.
/// A missing file yields an empty map; a malformed one is an error.
pub fn load_dotenv(path: impl AsRef<Path>) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => {
            return Err(ChainError::Config(format!("{}: {}", path.display(), e)));
        }
    };

    iter.map(|item| item.map_err(|e| ChainError::Config(format!("{}: {}", path.display(), e))))
        .collect()
}

/// Load a config file without consulting the environment. A missing file
/// yields the defaults; a malformed one is an error.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let config_str = match fs::read_to_string(path.as_ref()) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };

    validate(&config)?;
    Ok(config)
}

/// Overlay `HOST` and `PORT` looked up through `lookup`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
        config.server.host = host;
    }

    if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| {
                ChainError::Config(format!("PORT must be a valid port number, got {:?}", port))
            })?;
    }

    Ok(())
}

pub fn validate(config: &Config) -> Result<()> {
    if config.server.host.trim().is_empty() {
        return Err(ChainError::Config("server.host must not be empty".to_string()));
    }

    if config.server.request_timeout_secs == 0 {
        return Err(ChainError::Config(
            "server.request_timeout_secs must be positive".to_string(),
        ));
    }

    if config.server.max_body_bytes == 0 || config.server.max_header_bytes == 0 {
        return Err(ChainError::Config(
            "server.max_body_bytes and server.max_header_bytes must be positive".to_string(),
        ));
    }

    if config.ledger.min_bpm > config.ledger.max_bpm {
        return Err(ChainError::Config(format!(
            "ledger.min_bpm ({}) must not exceed ledger.max_bpm ({})",
            config.ledger.min_bpm, config.ledger.max_bpm
        )));
    }

    Ok(())
}
