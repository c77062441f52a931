use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Sentinel meaning "no API key configured"; the key check is skipped entirely.
pub const NO_API_KEY: &str = "no-key-provided";

/// Placeholder default for the database password secret. The registry has no
/// database yet; the value is only loaded and logged masked at startup.
pub const NO_DB_PASSWORD: &str = "no-db-password";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default = "default_db_password")]
    pub database_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            registry: RegistryConfig::default(),
            auth: AuthConfig::default(),
            log: LogConfig::default(),
            database_password: default_db_password(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub greeting: String,
    pub data_dir: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello from the Hero Registry!".into(),
            data_dir: "data".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub api_key: String,
    pub mode: AuthMode,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { api_key: NO_API_KEY.into(), mode: AuthMode::Enforcing }
    }
}

impl AuthConfig {
    /// The key check only applies once an actual secret has been configured.
    pub fn key_configured(&self) -> bool {
        self.api_key != NO_API_KEY && !self.api_key.trim().is_empty()
    }
}

/// What to do when a request presents a missing or mismatching API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Reject the request with 401.
    Enforcing,
    /// Log a warning and let the request through unauthenticated.
    Observing,
}

impl FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforce" | "enforcing" => Ok(Self::Enforcing),
            "observe" | "observing" => Ok(Self::Observing),
            other => Err(anyhow!("auth.mode must be 'enforce' or 'observe', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".into(), format: LogFormat::Json }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_db_password() -> String {
    NO_DB_PASSWORD.into()
}

/// Load from `CONFIG_PATH` (default `config.toml`) when present, otherwise
/// start from defaults; environment variables override either way.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let mut cfg = match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content)?,
        Err(_) => AppConfig::default(),
    };
    cfg.apply_env_overrides()?;
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

impl AppConfig {
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = std::env::var("SERVER_PORT") {
            self.server.port = v
                .parse::<u16>()
                .map_err(|_| anyhow!("SERVER_PORT must be a port number, got '{v}'"))?;
        }
        if let Ok(v) = std::env::var("GREETING_MESSAGE") {
            self.registry.greeting = v;
        }
        if let Ok(v) = std::env::var("DATA_DIR") {
            self.registry.data_dir = v;
        }
        if let Ok(v) = std::env::var("API_KEY") {
            self.auth.api_key = v;
        }
        if let Ok(v) = std::env::var("AUTH_MODE") {
            self.auth.mode = v.parse()?;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.log.level = v.to_ascii_lowercase();
        }
        if let Ok(v) = std::env::var("LOG_FORMAT") {
            self.log.format = match v.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                other => return Err(anyhow!("LOG_FORMAT must be 'json' or 'compact', got '{other}'")),
            };
        }
        if let Ok(v) = std::env::var("DATABASE_PASSWORD") {
            self.database_password = v;
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            self.server.host = "127.0.0.1".to_string();
        }
        if self.server.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.registry.data_dir.trim().is_empty() {
            return Err(anyhow!("registry.data_dir must not be empty"));
        }
        Ok(())
    }
}
