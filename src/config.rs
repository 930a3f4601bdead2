use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub smart: SmartConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmartConfig {
    #[serde(default = "default_update_interval")]
    pub update_interval_seconds: u64,
    #[serde(default = "default_smartctl_path")]
    pub smartctl_path: String,
    #[serde(default = "default_lsblk_path")]
    pub lsblk_path: String,
    #[serde(default = "default_device_dir")]
    pub device_dir: String,
    /// Upper bound on simultaneous smartctl invocations per cycle (0 = unbounded)
    #[serde(default = "default_max_concurrent_samples")]
    pub max_concurrent_samples: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for SmartConfig {
    fn default() -> Self {
        Self {
            update_interval_seconds: default_update_interval(),
            smartctl_path: default_smartctl_path(),
            lsblk_path: default_lsblk_path(),
            device_dir: default_device_dir(),
            max_concurrent_samples: default_max_concurrent_samples(),
        }
    }
}

impl SmartConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_seconds)
    }

    /// Fan-out limit in the form `for_each_concurrent` expects
    pub fn concurrency_limit(&self) -> Option<usize> {
        match self.max_concurrent_samples {
            0 => None,
            n => Some(n),
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9649
}

fn default_update_interval() -> u64 {
    600
}

fn default_smartctl_path() -> String {
    "smartctl".to_string()
}

fn default_lsblk_path() -> String {
    "lsblk".to_string()
}

fn default_device_dir() -> String {
    "/dev".to_string()
}

fn default_max_concurrent_samples() -> usize {
    16
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("SMART_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
