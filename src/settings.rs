use config::{Config, ConfigError, Environment, File};
use log::debug;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct NodeSettings {
    #[serde(default = "default_node_url")]
    pub url: String,
    /// Polling interval handed to the provider, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_node_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_poll_interval_ms() -> u64 {
    50 // local dev nodes mine instantly
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            url: default_node_url(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub node: NodeSettings,
}

impl Settings {
    /// Load settings from an optional `Fixtures.toml` in the working directory,
    /// then `.env`, then `FIXTURE_*` environment variables (e.g. `FIXTURE_NODE__URL`).
    pub fn new() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let s = Config::builder()
            .add_source(File::with_name("Fixtures").required(false))
            .add_source(env_source())
            .build()?;

        s.try_deserialize()
    }

    /// Load settings from an explicit TOML file; environment overrides still apply.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        s.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("FIXTURE").separator("__")
}
