// src/config.rs

//! Manages gateway configuration: loading, resolving loosely-typed values, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Settings for the HTTP status endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StatusConfig {
    /// If false, no status server is started.
    #[serde(default = "default_status_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_status_port")]
    pub port: u16,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: default_status_enabled(),
            host: default_host(),
            port: default_status_port(),
        }
    }
}

impl StatusConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings for the background registry sweeper.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SweeperConfig {
    /// How often closed connections are reclaimed, e.g. `"10s"`.
    #[serde(with = "humantime_serde", default = "default_sweep_interval")]
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: default_sweep_interval(),
        }
    }
}

/// The longest session deadline accepted, one year.
pub const MAX_IDLE_TIMEOUT_SECS: u64 = 365 * 24 * 60 * 60;

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    1080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_status_enabled() -> bool {
    true
}
fn default_status_port() -> u16 {
    9000
}
fn default_sweep_interval() -> Duration {
    Duration::from_secs(10)
}

/// A port given either as a number or as a numeric string (`"1080"`).
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

impl Default for PortValue {
    fn default() -> Self {
        PortValue::Number(default_port())
    }
}

/// The on-disk shape of the configuration, before loosely-typed values are resolved.
#[derive(Deserialize, Debug)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default)]
    port: PortValue,
    #[serde(default)]
    login: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    idle_timeout: Option<u64>,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    status: StatusConfig,
    #[serde(default)]
    sweeper: SweeperConfig,
}

/// The fully resolved gateway configuration.
#[derive(Serialize, Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub login: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Session deadline in seconds. `None` or `0` means sessions may live forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<u64>,
    pub log_level: String,
    pub status: StatusConfig,
    pub sweeper: SweeperConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            login: String::new(),
            password: String::new(),
            idle_timeout: None,
            log_level: default_log_level(),
            status: StatusConfig::default(),
            sweeper: SweeperConfig::default(),
        }
    }
}

impl Config {
    /// Reads and parses a configuration file. Files ending in `.toml` are parsed
    /// as TOML; anything else is parsed as JSON.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;

        let is_toml = Path::new(path)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&contents)
                .with_context(|| format!("Invalid configuration in '{path}'"))
        } else {
            Self::from_json_str(&contents)
                .with_context(|| format!("Invalid configuration in '{path}'"))
        }
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let raw: RawConfig =
            serde_json::from_str(contents).context("Failed to parse JSON configuration")?;
        Self::resolve(raw)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents).context("Failed to parse TOML configuration")?;
        Self::resolve(raw)
    }

    fn resolve(raw: RawConfig) -> Result<Self> {
        let port = resolve_port(raw.port)?;
        let config = Config {
            host: raw.host,
            port,
            login: raw.login,
            password: raw.password,
            idle_timeout: raw.idle_timeout,
            log_level: raw.log_level,
            status: raw.status,
            sweeper: raw.sweeper,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the resolved configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.login.is_empty() {
            return Err(anyhow!("login cannot be empty"));
        }
        if self.login.len() > 255 || self.password.len() > 255 {
            return Err(anyhow!("login and password must be at most 255 bytes"));
        }
        if self.status.enabled {
            if self.status.port == 0 {
                return Err(anyhow!("status.port cannot be 0"));
            }
            if self.status.port == self.port && self.status.host == self.host {
                return Err(anyhow!(
                    "status.port cannot be the same as the proxy port"
                ));
            }
        }
        if let Some(secs) = self.idle_timeout
            && secs > MAX_IDLE_TIMEOUT_SECS
        {
            return Err(anyhow!(
                "idle_timeout {secs}s exceeds the maximum of {MAX_IDLE_TIMEOUT_SECS}s"
            ));
        }
        if self.sweeper.interval.is_zero() {
            return Err(anyhow!("sweeper.interval cannot be 0"));
        }
        Ok(())
    }

    /// The `host:port` the SOCKS5 listener binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The per-connection deadline, if one is configured.
    pub fn session_timeout(&self) -> Option<Duration> {
        self.idle_timeout
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn resolve_port(value: PortValue) -> Result<u16> {
    match value {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(s) => s
            .trim()
            .parse()
            .with_context(|| format!("Invalid port '{s}'. Must be a number between 1 and 65535.")),
    }
}
