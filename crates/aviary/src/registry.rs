// ABOUTME: Concurrency-safe directory mapping agent identifiers to worker handles.
// ABOUTME: Atomic check-and-insert; idempotent, instance-guarded removal.

use crate::worker::WorkerHandle;
use aviary_core::AgentError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The only state shared across agents. Safe for concurrent register,
/// lookup, and deregister from callers and worker-termination monitors.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<HashMap<String, WorkerHandle>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a handle under its agent id. The check and the insert happen
    /// under one write lock, so two racing registrations for the same id
    /// resolve to exactly one winner.
    pub async fn register(&self, handle: WorkerHandle) -> Result<(), AgentError> {
        let mut map = self.inner.write().await;
        let agent_id = handle.agent_id().to_string();
        if map.contains_key(&agent_id) {
            return Err(AgentError::AlreadyRunning(agent_id));
        }
        map.insert(agent_id, handle);
        Ok(())
    }

    pub async fn lookup(&self, agent_id: &str) -> Option<WorkerHandle> {
        self.inner.read().await.get(agent_id).cloned()
    }

    /// Remove an entry. Removing an absent id is a no-op.
    pub async fn deregister(&self, agent_id: &str) {
        self.inner.write().await.remove(agent_id);
    }

    /// Remove an entry only while it still maps to the given instance.
    /// A stale monitor racing a restart must not evict the replacement
    /// worker registered under the same id.
    pub async fn deregister_instance(&self, agent_id: &str, instance_id: Uuid) {
        let mut map = self.inner.write().await;
        if map
            .get(agent_id)
            .is_some_and(|h| h.instance_id() == instance_id)
        {
            map.remove(agent_id);
        }
    }

    /// Point-in-time snapshot of all (id, handle) pairs. Never contains a
    /// duplicate id; a handle whose worker exits right after the snapshot
    /// answers NotFound on use.
    pub async fn entries(&self) -> Vec<(String, WorkerHandle)> {
        self.inner
            .read()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker;
    use aviary_core::telemetry::{NoopSink, SinkHandle};
    use aviary_core::{AgentConfig, PlaceholderProvider, ProviderHandle};

    async fn spawn_worker(registry: &Registry, agent_id: &str) -> WorkerHandle {
        worker::spawn(
            AgentConfig::new(agent_id),
            ProviderHandle::new(PlaceholderProvider),
            registry.clone(),
            SinkHandle::new(NoopSink),
            8,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = Registry::new();
        let handle = spawn_worker(&registry, "a").await;

        let found = registry.lookup("a").await.unwrap();
        assert_eq!(found.agent_id(), "a");
        assert_eq!(found.instance_id(), handle.instance_id());
        assert!(registry.lookup("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_register_fails() {
        let registry = Registry::new();
        let _handle = spawn_worker(&registry, "a").await;

        let result = worker::spawn(
            AgentConfig::new("a"),
            ProviderHandle::new(PlaceholderProvider),
            registry.clone(),
            SinkHandle::new(NoopSink),
            8,
        )
        .await;
        assert!(matches!(result, Err(AgentError::AlreadyRunning(_))));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_deregister_is_idempotent() {
        let registry = Registry::new();
        let _handle = spawn_worker(&registry, "a").await;

        registry.deregister("a").await;
        assert!(registry.lookup("a").await.is_none());

        // Absent ids are a no-op, not an error
        registry.deregister("a").await;
        registry.deregister("never-existed").await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_deregister_instance_requires_matching_instance() {
        let registry = Registry::new();
        let handle = spawn_worker(&registry, "a").await;

        registry.deregister_instance("a", Uuid::new_v4()).await;
        assert!(registry.lookup("a").await.is_some());

        registry.deregister_instance("a", handle.instance_id()).await;
        assert!(registry.lookup("a").await.is_none());
    }

    #[tokio::test]
    async fn test_entries_snapshot_has_no_duplicates() {
        let registry = Registry::new();
        let _a = spawn_worker(&registry, "a").await;
        let _b = spawn_worker(&registry, "b").await;

        let mut ids: Vec<String> = registry
            .entries()
            .await
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.len().await, 2);
    }
}
