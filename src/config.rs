//! Configuration loader and validator for the content API.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Environment variable consulted when `blob.token` is left empty.
pub const TOKEN_ENV: &str = "BLOB_READ_WRITE_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub blob: Blob,
    pub documents: Documents,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub bind: String,
}

/// Blob store access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blob {
    pub base_url: String,
    pub api_version: String,
    #[serde(default)]
    pub token: String,
}

/// Well-known pathnames of the published documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Documents {
    pub resources: String,
    pub testimonials: String,
}

impl Config {
    /// Parsed `app.bind`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.app
            .bind
            .parse()
            .map_err(|_| ConfigError::Invalid("app.bind must be a socket address"))
    }

    /// Fill an empty `blob.token` from the environment.
    fn apply_env(&mut self) {
        if self.blob.token.trim().is_empty() {
            if let Ok(token) = std::env::var(TOKEN_ENV) {
                self.blob.token = token;
            }
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
/// - An empty `blob.token` falls back to `BLOB_READ_WRITE_TOKEN`.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    cfg.apply_env();
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    cfg.bind_addr()?;

    match Url::parse(&cfg.blob.base_url) {
        Ok(url) if !url.cannot_be_a_base() => {}
        _ => return Err(ConfigError::Invalid("blob.base_url must be an absolute URL")),
    }
    if cfg.blob.api_version.trim().is_empty() {
        return Err(ConfigError::Invalid("blob.api_version must be non-empty"));
    }
    if cfg.blob.token.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "blob.token must be non-empty (or set BLOB_READ_WRITE_TOKEN)",
        ));
    }

    if cfg.documents.resources.trim().is_empty() {
        return Err(ConfigError::Invalid("documents.resources must be non-empty"));
    }
    if cfg.documents.testimonials.trim().is_empty() {
        return Err(ConfigError::Invalid("documents.testimonials must be non-empty"));
    }

    Ok(())
}

/// Example configuration, valid as-is.
pub fn example() -> &'static str {
    r#"app:
  bind: "0.0.0.0:3000"

blob:
  base_url: "https://blob.vercel-storage.com/"
  api_version: "7"
  token: "YOUR_BLOB_READ_WRITE_TOKEN"

documents:
  resources: "resources.json"
  testimonials: "testimonials.json"
"#
}
