//! `easytalk.toml` configuration.

use easytalk_agent::{ModelConfig, SpeechConfig};
use easytalk_core::{EasytalkError, EasytalkResult};
use easytalk_gateway::GatewayConfig;
use easytalk_orchestrator::DisclaimerPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct EasytalkConfig {
    /// Optional so profile commands work without provider settings.
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub disclaimer: DisclaimerPolicy,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            cors_origins: vec![],
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl EasytalkConfig {
    pub fn from_toml(raw: &str) -> EasytalkResult<Self> {
        toml::from_str(raw).map_err(|e| EasytalkError::Config(e.to_string()))
    }

    pub async fn load(path: &Path) -> EasytalkResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            EasytalkError::Config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&raw)
    }

    /// Fill empty API keys from the environment variable of each provider.
    pub fn resolve_secrets(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.model.api_key.is_empty() {
            let var = self.model.provider.api_key_env();
            match lookup(var).filter(|v| !v.is_empty()) {
                Some(key) => self.model.api_key = key,
                None => warn!(env = var, "No API key for the generation provider"),
            }
        }
        if self.speech.api_key.is_empty() {
            let var = self.speech.provider.api_key_env();
            match lookup(var).filter(|v| !v.is_empty()) {
                Some(key) => self.speech.api_key = key,
                None => warn!(env = var, "No API key for the speech provider"),
            }
        }
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.data_dir.join("profiles.json")
    }

    pub fn contexts_dir(&self) -> PathBuf {
        self.data_dir.join("contexts")
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            request_timeout: Duration::from_secs(self.server.request_timeout_secs),
            cors_origins: self.server.cors_origins.clone(),
        }
    }
}
