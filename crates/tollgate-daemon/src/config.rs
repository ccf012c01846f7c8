//! Daemon configuration: TOML file with serde-side defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use tollgate_admission::GateConfig;

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Admission bounds.
    #[serde(default)]
    pub admission: AdmissionConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the TCP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Folder whose files are loaded into the quote store.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Log level directive: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Admission bounds, mirroring [`GateConfig`] in file-friendly units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Capacity of the replay cache.
    #[serde(default = "default_cache_size")]
    pub access_token_cache_size: usize,
    /// Token lifetime in milliseconds.
    #[serde(default = "default_life_time_millis")]
    pub access_token_life_time_millis: u64,
    /// Smallest admissible tree depth.
    #[serde(default = "default_min_depth")]
    pub min_allowed_depth: u32,
    /// Largest admissible tree depth.
    #[serde(default = "default_max_depth")]
    pub max_allowed_depth: u32,
    /// Smallest admissible selection size.
    #[serde(default = "default_min_leaves")]
    pub min_allowed_proof_leaves_num: usize,
    /// Largest admissible selection size.
    #[serde(default = "default_max_leaves")]
    pub max_allowed_proof_leaves_num: usize,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_size() -> usize {
    1000
}

fn default_life_time_millis() -> u64 {
    5000
}

fn default_min_depth() -> u32 {
    10
}

fn default_max_depth() -> u32 {
    25
}

fn default_min_leaves() -> usize {
    3
}

fn default_max_leaves() -> usize {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            access_token_cache_size: default_cache_size(),
            access_token_life_time_millis: default_life_time_millis(),
            min_allowed_depth: default_min_depth(),
            max_allowed_depth: default_max_depth(),
            min_allowed_proof_leaves_num: default_min_leaves(),
            max_allowed_proof_leaves_num: default_max_leaves(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file, or fall back to defaults when
    /// no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {path:?}"))?;
                toml::from_str(&content).with_context(|| format!("parsing config file {path:?}"))
            }
            None => Ok(Self::default()),
        }
    }
}

impl AdmissionConfig {
    /// Translate into the gate's own config type.
    pub fn to_gate_config(&self) -> GateConfig {
        GateConfig::default()
            .with_access_token_cache_size(self.access_token_cache_size)
            .with_access_token_life_time(Duration::from_millis(self.access_token_life_time_millis))
            .with_allowed_depth_range(self.min_allowed_depth, self.max_allowed_depth)
            .with_allowed_proof_leaves_range(
                self.min_allowed_proof_leaves_num,
                self.max_allowed_proof_leaves_num,
            )
    }
}
