//! Server configuration

use anyhow::Result;
use iris_core::DEFAULT_ARTIFACT_PATH;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration, read from `IRIS_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for prediction, health and metrics endpoints
    #[serde(default = "default_port")]
    pub port: u16,

    /// Location of the trained model artifact
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_PATH)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_path: default_model_path(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_env(config::Environment::with_prefix("IRIS"))
    }

    fn from_env(source: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(source.try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
