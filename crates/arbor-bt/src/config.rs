//! Runtime configuration loading.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings for driving a population of agents, loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Global seed; each agent's random choices derive from it.
    pub seed: u64,

    /// Tick an agent's tree every N frames (offset per agent).
    #[serde(default = "default_think_every_ticks")]
    pub think_every_ticks: u32,

    /// Frame length in seconds
    #[serde(default = "default_dt_seconds")]
    pub dt_seconds: f32,

    /// Agents spawned by the simulation driver
    #[serde(default = "default_agents")]
    pub agents: usize,

    /// Frames simulated by the driver
    #[serde(default = "default_ticks")]
    pub ticks: u64,
}

fn default_think_every_ticks() -> u32 {
    1
}
fn default_dt_seconds() -> f32 {
    1.0 / 60.0
}
fn default_agents() -> usize {
    1
}
fn default_ticks() -> u64 {
    60
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            think_every_ticks: default_think_every_ticks(),
            dt_seconds: default_dt_seconds(),
            agents: default_agents(),
            ticks: default_ticks(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
