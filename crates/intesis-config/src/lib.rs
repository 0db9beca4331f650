//! Configuration for the Intesis bridge.
//!
//! A TOML file plus `INTESIS_*` environment overrides, validated and
//! translated into [`intesis_core::BridgeConfig`]. File keys may use the
//! camelCase names (`apiBaseURL`, `clientID`, `configCacheSeconds`, ...)
//! or their snake_case equivalents.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use intesis_api::GrantType;
use intesis_api::client::DEFAULT_BASE_URL;
use intesis_core::{BridgeConfig, MotionTimings};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("'{field}' is not configured")]
    Missing { field: &'static str },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config structs ──────────────────────────────────────────────────

/// Bridge configuration as written in the file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Cloud base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// OAuth2 grant for the initial login.
    #[serde(default = "default_grant_type")]
    pub grant_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Plaintext; prefer `INTESIS_PASSWORD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Config cache lifetime in seconds.
    #[serde(default = "default_config_cache_seconds")]
    pub config_cache_seconds: u64,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub motion: MotionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            grant_type: default_grant_type(),
            client_id: None,
            client_secret: None,
            username: None,
            password: None,
            config_cache_seconds: default_config_cache_seconds(),
            timeout: default_timeout(),
            motion: MotionConfig::default(),
        }
    }
}

/// Motion filter settings. Both timings must be given to run a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MotionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_delay_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_after_stop_fuse_ms: Option<u64>,
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_grant_type() -> String {
    "password".into()
}
fn default_config_cache_seconds() -> u64 {
    30
}
fn default_timeout() -> u64 {
    30
}

// ── Key normalization ───────────────────────────────────────────────

/// camelCase file keys and their canonical snake_case names.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("apiBaseURL", "api_base_url"),
    ("apiBaseUrl", "api_base_url"),
    ("grantType", "grant_type"),
    ("clientID", "client_id"),
    ("clientId", "client_id"),
    ("clientSecret", "client_secret"),
    ("configCacheSeconds", "config_cache_seconds"),
    ("stopDelayMs", "stop_delay_ms"),
    ("startAfterStopFuseMs", "start_after_stop_fuse_ms"),
];

fn normalize_keys(table: toml::Table) -> toml::Table {
    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::Table(nested) => toml::Value::Table(normalize_keys(nested)),
                other => other,
            };
            let key = KEY_ALIASES
                .iter()
                .find(|(camel, _)| *camel == key)
                .map_or(key, |(_, snake)| (*snake).to_owned());
            (key, value)
        })
        .collect()
}

fn parse_table(text: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    let table: toml::Table = text.parse().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_keys(table))
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "intesis", "intesis-bridge").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("intesis-bridge");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load defaults, then the config file (`path` or [`config_path`]), then
/// `INTESIS_*` environment variables. A missing file is not an error.
///
/// Nested keys use a double underscore: `INTESIS_MOTION__STOP_DELAY_MS`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
    if path.exists() {
        let text = std::fs::read_to_string(&path)?;
        figment = figment.merge(Serialized::defaults(parse_table(&text, &path)?));
    }
    figment = figment.merge(Env::prefixed("INTESIS_").split("__"));

    Ok(figment.extract()?)
}

/// Parse a config document without consulting the environment.
pub fn from_toml_str(text: &str) -> Result<Config, ConfigError> {
    let table = parse_table(text, Path::new("<inline>"))?;
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Serialized::defaults(table))
        .extract()?;
    Ok(config)
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Validate and build the runtime bridge config.
    pub fn to_bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        url::Url::parse(&self.api_base_url).map_err(|e| ConfigError::Validation {
            field: "apiBaseURL".into(),
            reason: format!("{e}: {}", self.api_base_url),
        })?;

        let username = self
            .username
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::Missing { field: "username" })?;
        let password = self
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::Missing { field: "password" })?;

        if self.grant_type.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "grantType".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        let mut config = BridgeConfig::new(username, SecretString::from(password));
        config.api_base_url.clone_from(&self.api_base_url);
        config.grant_type = GrantType::from(self.grant_type.trim());
        config.client_id.clone_from(&self.client_id);
        config.client_secret = self.client_secret.clone().map(SecretString::from);
        config.config_cache = Duration::from_secs(self.config_cache_seconds);
        config.timeout = Duration::from_secs(self.timeout);
        Ok(config)
    }

    /// Motion timings, when both are configured.
    pub fn motion_timings(&self) -> Option<MotionTimings> {
        let stop = self.motion.stop_delay_ms?;
        let fuse = self.motion.start_after_stop_fuse_ms?;
        Some(MotionTimings::new(
            Duration::from_millis(stop),
            Duration::from_millis(fuse),
        ))
    }
}
