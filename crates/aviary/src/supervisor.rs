// ABOUTME: Fleet orchestration over the registry: start, stop, restart, reporting.
// ABOUTME: Owns no agent state; delegates addressing to the registry by identifier.

use crate::registry::Registry;
use crate::worker::{self, WorkerHandle};
use aviary_core::telemetry::{SinkHandle, TelemetryEvent, TracingSink};
use aviary_core::types::{AgentInfo, AgentStatus};
use aviary_core::{
    AgentConfig, AgentError, AgentStateSnapshot, Config, ConfigOverrides, EchoProvider,
    PlaceholderProvider, ProviderHandle,
};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Result of a fleet-wide health sweep. Never an error: a hung or dead
/// agent lands in `unhealthy` with its reason.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthReport {
    pub healthy: Vec<String>,
    pub unhealthy: Vec<(String, String)>,
}

/// Lifecycle orchestrator for the agent fleet.
pub struct Supervisor {
    registry: Registry,
    providers: HashMap<String, ProviderHandle>,
    sink: SinkHandle,
    mailbox_capacity: usize,
    health_timeout: Duration,
    stop_grace: Duration,
}

impl Supervisor {
    /// Supervisor with default tunables and the built-in providers
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "placeholder".to_string(),
            ProviderHandle::new(PlaceholderProvider),
        );
        providers.insert("echo".to_string(), ProviderHandle::new(EchoProvider));

        Self {
            registry: Registry::new(),
            providers,
            sink: SinkHandle::new(TracingSink),
            mailbox_capacity: config.mailbox_capacity,
            health_timeout: Duration::from_millis(config.health_timeout_ms),
            stop_grace: Duration::from_millis(config.stop_grace_ms),
        }
    }

    /// Replace the telemetry sink
    pub fn with_sink(mut self, sink: SinkHandle) -> Self {
        self.sink = sink;
        self
    }

    /// Make a provider available under a selector name
    pub fn register_provider(&mut self, name: impl Into<String>, provider: ProviderHandle) {
        self.providers.insert(name.into(), provider);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Start an agent. Idempotent: an identifier that is already running
    /// yields the existing handle rather than an error. Any other creation
    /// failure is returned annotated with the identifier.
    pub async fn start_agent(&self, config: AgentConfig) -> Result<WorkerHandle, AgentError> {
        let agent_id = config.agent_id.clone();
        match self.create(config).await {
            Ok(handle) => Ok(handle),
            Err(AgentError::AlreadyRunning(_)) => {
                match self.registry.lookup(&agent_id).await {
                    Some(existing) => {
                        tracing::debug!(agent_id = %agent_id, "Agent already running, returning existing handle");
                        Ok(existing)
                    }
                    // The running worker terminated between the conflict
                    // and the lookup; surface it as absent.
                    None => Err(AgentError::NotFound(agent_id)),
                }
            }
            Err(err) => {
                tracing::warn!(agent_id = %agent_id, error = %err, "Failed to start agent");
                Err(err)
            }
        }
    }

    async fn create(&self, config: AgentConfig) -> Result<WorkerHandle, AgentError> {
        let provider = self.providers.get(&config.provider).cloned().ok_or_else(|| {
            AgentError::InvalidConfig(format!("unknown provider: {}", config.provider))
        })?;
        worker::spawn(
            config,
            provider,
            self.registry.clone(),
            self.sink.clone(),
            self.mailbox_capacity,
        )
        .await
    }

    /// Stop an agent and wait for confirmed termination. Graceful within
    /// the configured grace period, forced after it.
    pub async fn stop_agent(&self, agent_id: &str) -> Result<(), AgentError> {
        let handle = self
            .registry
            .lookup(agent_id)
            .await
            .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))?;
        handle.shutdown(self.stop_grace).await;
        Ok(())
    }

    /// Stop, then start a fresh worker with the prior configuration plus
    /// `overrides`. The two steps are not transactional: a failure in
    /// between leaves the identifier absent, which is the documented
    /// outcome rather than a partially-applied one.
    pub async fn restart_agent(
        &self,
        agent_id: &str,
        overrides: &ConfigOverrides,
    ) -> Result<WorkerHandle, AgentError> {
        let handle = self
            .registry
            .lookup(agent_id)
            .await
            .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))?;

        let snapshot = handle.state(self.health_timeout).await?;
        let merged = snapshot.to_config().merged(overrides);

        handle.shutdown(self.stop_grace).await;

        let replacement = self.create(merged).await?;
        tracing::info!(
            agent_id = %agent_id,
            instance_id = %replacement.instance_id(),
            "Agent restarted"
        );
        self.sink.emit(
            TelemetryEvent::new("agent.restarted")
                .metadata("agent_id", agent_id)
                .metadata("instance_id", replacement.instance_id().to_string()),
        );
        Ok(replacement)
    }

    /// Send one chat message to an agent
    pub async fn chat(&self, agent_id: &str, message: &str) -> Result<String, AgentError> {
        let handle = self
            .registry
            .lookup(agent_id)
            .await
            .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))?;
        handle.chat(message).await
    }

    /// Snapshot an agent's state, bounded by the health timeout
    pub async fn get_state(&self, agent_id: &str) -> Result<AgentStateSnapshot, AgentError> {
        let handle = self
            .registry
            .lookup(agent_id)
            .await
            .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))?;
        handle.state(self.health_timeout).await
    }

    /// Probe one agent's liveness, bounded by the health timeout
    pub async fn health_check(&self, agent_id: &str) -> Result<(), AgentError> {
        let handle = self
            .registry
            .lookup(agent_id)
            .await
            .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))?;
        handle.health(self.health_timeout).await
    }

    /// All currently registered (id, handle) pairs
    pub async fn list_agents(&self) -> Vec<(String, WorkerHandle)> {
        self.registry.entries().await
    }

    pub async fn agent_count(&self) -> usize {
        self.registry.len().await
    }

    /// Per-agent report rows. Each worker is probed with the bounded
    /// timeout; an unresponsive one is reported without a footprint
    /// estimate instead of failing the whole call.
    pub async fn agent_info(&self) -> Vec<AgentInfo> {
        let entries = self.registry.entries().await;
        let probes = entries.into_iter().map(|(agent_id, handle)| async move {
            let instance_id = handle.instance_id().to_string();
            match handle.state(self.health_timeout).await {
                Ok(snapshot) => AgentInfo {
                    agent_id,
                    instance_id,
                    status: AgentStatus::Running,
                    approx_bytes: Some(snapshot.approx_bytes),
                },
                Err(_) => AgentInfo {
                    agent_id,
                    instance_id,
                    status: AgentStatus::Unresponsive,
                    approx_bytes: None,
                },
            }
        });
        let mut info = join_all(probes).await;
        info.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        info
    }

    /// Partition all registered agents into healthy and unhealthy. Probes
    /// run concurrently with a per-agent timeout, so one hung agent never
    /// stalls the sweep.
    pub async fn health_check_all(&self) -> HealthReport {
        let entries = self.registry.entries().await;
        let probes = entries.into_iter().map(|(agent_id, handle)| async move {
            let result = handle.health(self.health_timeout).await;
            (agent_id, result)
        });

        let mut report = HealthReport::default();
        for (agent_id, result) in join_all(probes).await {
            match result {
                Ok(()) => report.healthy.push(agent_id),
                Err(err) => report.unhealthy.push((agent_id, err.to_string())),
            }
        }
        report.healthy.sort();
        report.unhealthy.sort();
        report
    }

    /// Stop every registered agent, concurrently. Used on daemon shutdown.
    pub async fn stop_all(&self) {
        let entries = self.registry.entries().await;
        let count = entries.len();
        let stops = entries
            .into_iter()
            .map(|(_, handle)| async move { handle.shutdown(self.stop_grace).await });
        join_all(stops).await;
        tracing::info!(count = count, "Stopped all agents");
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_agent_absorbs_already_running() {
        let supervisor = Supervisor::new();
        let first = supervisor.start_agent(AgentConfig::new("a")).await.unwrap();
        let second = supervisor.start_agent(AgentConfig::new("a")).await.unwrap();

        assert_eq!(first.instance_id(), second.instance_id());
        assert_eq!(supervisor.agent_count().await, 1);
    }

    #[tokio::test]
    async fn test_start_agent_rejects_unknown_provider() {
        let supervisor = Supervisor::new();
        let mut config = AgentConfig::new("a");
        config.provider = "no-such-provider".to_string();

        let result = supervisor.start_agent(config).await;
        assert!(matches!(result, Err(AgentError::InvalidConfig(_))));
        assert_eq!(supervisor.agent_count().await, 0);
    }

    #[tokio::test]
    async fn test_start_agent_rejects_empty_id() {
        let supervisor = Supervisor::new();
        let result = supervisor.start_agent(AgentConfig::new("")).await;
        assert!(matches!(result, Err(AgentError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_stop_agent_absent_returns_not_found() {
        let supervisor = Supervisor::new();
        let result = supervisor.stop_agent("ghost").await;
        assert!(matches!(result, Err(AgentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_restart_absent_returns_not_found() {
        let supervisor = Supervisor::new();
        let result = supervisor
            .restart_agent("ghost", &ConfigOverrides::default())
            .await;
        assert!(matches!(result, Err(AgentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_chat_absent_returns_not_found() {
        let supervisor = Supervisor::new();
        let result = supervisor.chat("ghost", "hi").await;
        assert!(matches!(result, Err(AgentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_registered_provider_is_selectable() {
        let mut supervisor = Supervisor::new();
        supervisor.register_provider("echo2", ProviderHandle::new(EchoProvider));

        let mut config = AgentConfig::new("a");
        config.provider = "echo2".to_string();
        supervisor.start_agent(config).await.unwrap();

        let response = supervisor.chat("a", "ping").await.unwrap();
        assert_eq!(response, "echo: ping");
    }
}
