// ABOUTME: Configuration for the aviary daemon and supervisor.
// ABOUTME: Loaded from TOML file with sensible defaults.

use crate::types::{AgentConfig, DEFAULT_PROVIDER, DEFAULT_SYSTEM_PROMPT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider selector for agents that don't name one
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// System prompt for agents that don't carry one
    #[serde(default = "default_system_prompt")]
    pub default_system_prompt: String,

    /// Per-worker command mailbox depth
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Bound on health/state probes, in milliseconds
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,

    /// Grace period before a stop escalates to a forced kill, in milliseconds
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,

    /// Agents started when the daemon boots
    #[serde(default)]
    pub agents: Vec<StartupAgent>,
}

/// One pre-declared agent in the daemon config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupAgent {
    pub agent_id: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_mailbox_capacity() -> usize {
    32
}

fn default_health_timeout_ms() -> u64 {
    2_000
}

fn default_stop_grace_ms() -> u64 {
    5_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            default_system_prompt: default_system_prompt(),
            mailbox_capacity: default_mailbox_capacity(),
            health_timeout_ms: default_health_timeout_ms(),
            stop_grace_ms: default_stop_grace_ms(),
            agents: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Get the default config file path (~/.config/aviary/aviary.toml)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("."))
            })
            .join("aviary");
        Ok(config_dir.join("aviary.toml"))
    }

    /// Full AgentConfig for a startup entry, daemon defaults filled in
    pub fn agent_config(&self, startup: &StartupAgent) -> AgentConfig {
        AgentConfig {
            agent_id: startup.agent_id.clone(),
            provider: startup
                .provider
                .clone()
                .unwrap_or_else(|| self.default_provider.clone()),
            tools: startup.tools.clone(),
            system_prompt: startup
                .system_prompt
                .clone()
                .unwrap_or_else(|| self.default_system_prompt.clone()),
            settings: HashMap::new(),
        }
    }
}
