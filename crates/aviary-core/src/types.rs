// ABOUTME: Agent configuration and state types shared across the workspace.
// ABOUTME: Contains AgentConfig, ConfigOverrides, ChatMessage, and reporting snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default system prompt applied when a config does not carry one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Provider selector used when a config does not name one.
pub const DEFAULT_PROVIDER: &str = "placeholder";

/// A single turn in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "user", "assistant", or "system"
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Immutable creation-time configuration for one agent.
///
/// Consumed once when the worker is spawned; a restart rebuilds it from
/// the running worker's state snapshot before merging overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Caller-supplied identifier, unique among running agents
    pub agent_id: String,

    /// Symbolic provider selector (resolved by the supervisor)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Ordered tool references passed through to the provider
    #[serde(default)]
    pub tools: Vec<String>,

    /// System prompt prepended to every generation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Free-form per-agent settings
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl AgentConfig {
    /// Config with defaults for everything except the identifier
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            provider: default_provider(),
            tools: Vec::new(),
            system_prompt: default_system_prompt(),
            settings: HashMap::new(),
        }
    }

    /// New config with override fields taking precedence over this one
    pub fn merged(&self, overrides: &ConfigOverrides) -> Self {
        Self {
            agent_id: self.agent_id.clone(),
            provider: overrides
                .provider
                .clone()
                .unwrap_or_else(|| self.provider.clone()),
            tools: overrides.tools.clone().unwrap_or_else(|| self.tools.clone()),
            system_prompt: overrides
                .system_prompt
                .clone()
                .unwrap_or_else(|| self.system_prompt.clone()),
            settings: overrides
                .settings
                .clone()
                .unwrap_or_else(|| self.settings.clone()),
        }
    }
}

/// Partial config applied on top of an existing one during restart
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub tools: Option<Vec<String>>,
    pub system_prompt: Option<String>,
    pub settings: Option<HashMap<String, serde_json::Value>>,
}

/// Read-only snapshot of a worker's state, produced on demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStateSnapshot {
    pub agent_id: String,
    pub provider: String,
    pub tools: Vec<String>,
    /// Reference to a memory backend, when the agent has one configured
    pub memory: Option<String>,
    pub system_prompt: String,
    pub settings: HashMap<String, serde_json::Value>,
    pub conversation: Vec<ChatMessage>,
    pub context: HashMap<String, serde_json::Value>,
    /// Best-effort footprint estimate of the worker's owned state
    pub approx_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl AgentStateSnapshot {
    /// Rebuild the creation-time config from this snapshot
    pub fn to_config(&self) -> AgentConfig {
        AgentConfig {
            agent_id: self.agent_id.clone(),
            provider: self.provider.clone(),
            tools: self.tools.clone(),
            system_prompt: self.system_prompt.clone(),
            settings: self.settings.clone(),
        }
    }
}

/// Liveness as observed by a bounded probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Running,
    Unresponsive,
}

/// Per-agent report row, computed on demand and never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub agent_id: String,
    pub instance_id: String,
    pub status: AgentStatus,
    pub approx_bytes: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_defaults() {
        let config = AgentConfig::new("research");
        assert_eq!(config.agent_id, "research");
        assert_eq!(config.provider, DEFAULT_PROVIDER);
        assert!(config.tools.is_empty());
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(config.settings.is_empty());
    }

    #[test]
    fn test_merged_overrides_take_precedence() {
        let mut base = AgentConfig::new("research");
        base.provider = "echo".to_string();
        base.tools = vec!["search".to_string()];

        let overrides = ConfigOverrides {
            system_prompt: Some("Be terse.".to_string()),
            ..Default::default()
        };

        let merged = base.merged(&overrides);
        assert_eq!(merged.agent_id, "research");
        assert_eq!(merged.system_prompt, "Be terse.");
        // Untouched fields come from the base
        assert_eq!(merged.provider, "echo");
        assert_eq!(merged.tools, vec!["search".to_string()]);
    }

    #[test]
    fn test_merged_full_override() {
        let base = AgentConfig::new("a");
        let overrides = ConfigOverrides {
            provider: Some("echo".to_string()),
            tools: Some(vec!["calc".to_string()]),
            system_prompt: Some("X".to_string()),
            settings: Some(HashMap::from([(
                "temperature".to_string(),
                serde_json::json!(0.2),
            )])),
        };

        let merged = base.merged(&overrides);
        assert_eq!(merged.provider, "echo");
        assert_eq!(merged.tools, vec!["calc".to_string()]);
        assert_eq!(merged.system_prompt, "X");
        assert_eq!(merged.settings["temperature"], serde_json::json!(0.2));
    }

    #[test]
    fn test_snapshot_to_config_round_trip() {
        let snapshot = AgentStateSnapshot {
            agent_id: "a".to_string(),
            provider: "echo".to_string(),
            tools: vec!["search".to_string()],
            memory: None,
            system_prompt: "Y".to_string(),
            settings: HashMap::new(),
            conversation: vec![ChatMessage::user("hi")],
            context: HashMap::new(),
            approx_bytes: 128,
            created_at: Utc::now(),
        };

        let config = snapshot.to_config();
        assert_eq!(config.agent_id, "a");
        assert_eq!(config.provider, "echo");
        assert_eq!(config.tools, vec!["search".to_string()]);
        assert_eq!(config.system_prompt, "Y");
    }

    #[test]
    fn test_chat_message_constructors() {
        assert_eq!(ChatMessage::user("hi").role, "user");
        assert_eq!(ChatMessage::assistant("hello").role, "assistant");
    }
}
