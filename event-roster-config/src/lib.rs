use core::fmt::{Debug, Display};
use core::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "roster.toml";
pub const ENV_PREFIX: &str = "ROSTER_";

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// `memory://` or a `mongodb://` connection string.
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_store_database")]
    pub database: String,
    /// Deadline for every single record store call.
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

impl StoreConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            database: default_store_database(),
            timeout_ms: default_store_timeout_ms(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    pub log_filter: Option<String>,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_listen_address() -> String {
    "0.0.0.0:8080".to_owned()
}

fn default_store_url() -> String {
    "memory://".to_owned()
}

fn default_store_database() -> String {
    "schoolEvents".to_owned()
}

const fn default_store_timeout_ms() -> u64 {
    5000
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[must_use]
pub fn figment() -> Figment {
    Figment::new()
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn get_config() -> Result<Config, ConfigError> {
    Ok(figment().extract()?)
}
