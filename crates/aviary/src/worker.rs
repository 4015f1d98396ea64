// ABOUTME: Agent worker actor owning one agent's isolated state.
// ABOUTME: Command mailbox processed one at a time; monitor task handles crash-safe cleanup.

use crate::registry::Registry;
use aviary_core::telemetry::{SinkHandle, TelemetryEvent};
use aviary_core::types::{AgentConfig, AgentStateSnapshot, ChatMessage};
use aviary_core::{AgentError, ProviderHandle};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Commands a worker processes, strictly one at a time.
/// Every variant carries a oneshot so the caller observes completion exactly once.
enum Command {
    Chat {
        message: String,
        reply: oneshot::Sender<Result<String, AgentError>>,
    },
    GetState {
        reply: oneshot::Sender<AgentStateSnapshot>,
    },
    Health {
        reply: oneshot::Sender<()>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Opaque, cloneable handle addressing one live worker.
///
/// A terminated worker's handle stays valid to hold; operations on it
/// return `NotFound` promptly instead of blocking.
#[derive(Clone)]
pub struct WorkerHandle {
    agent_id: String,
    instance_id: Uuid,
    tx: mpsc::Sender<Command>,
    done: CancellationToken,
    abort: tokio::task::AbortHandle,
}

impl WorkerHandle {
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Unique per spawn; a restarted agent gets a fresh instance id
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// True once the worker has fully terminated and been deregistered
    pub fn is_terminated(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Send one chat message and wait for the response.
    ///
    /// May block for as long as the provider call takes. Returns `NotFound`
    /// if the worker is gone, `Provider` if the collaborator call failed.
    pub async fn chat(&self, message: impl Into<String>) -> Result<String, AgentError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Chat {
                message: message.into(),
                reply,
            })
            .await
            .map_err(|_| AgentError::NotFound(self.agent_id.clone()))?;
        rx.await
            .map_err(|_| AgentError::NotFound(self.agent_id.clone()))?
    }

    /// Snapshot the worker's state, waiting at most `wait`.
    pub async fn state(&self, wait: Duration) -> Result<AgentStateSnapshot, AgentError> {
        let op = async {
            let (reply, rx) = oneshot::channel();
            self.tx
                .send(Command::GetState { reply })
                .await
                .map_err(|_| AgentError::NotFound(self.agent_id.clone()))?;
            rx.await
                .map_err(|_| AgentError::NotFound(self.agent_id.clone()))
        };
        timeout(wait, op)
            .await
            .map_err(|_| AgentError::Timeout("state snapshot".to_string()))?
    }

    /// Probe liveness, waiting at most `wait`. A worker stuck in a long
    /// call never dequeues the probe, so the bound converts "deadlocked"
    /// into `Timeout` rather than a false healthy.
    pub async fn health(&self, wait: Duration) -> Result<(), AgentError> {
        let op = async {
            let (reply, rx) = oneshot::channel();
            self.tx
                .send(Command::Health { reply })
                .await
                .map_err(|_| AgentError::NotFound(self.agent_id.clone()))?;
            rx.await
                .map_err(|_| AgentError::NotFound(self.agent_id.clone()))
        };
        timeout(wait, op)
            .await
            .map_err(|_| AgentError::Timeout("health check".to_string()))?
    }

    /// Request graceful termination. Succeeds even when the worker is
    /// already gone; stopping something absent is not an error.
    pub async fn stop(&self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Stop { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Stop and wait for confirmed termination. Graceful within `grace`,
    /// then escalates to a forced kill. Returns once the monitor task has
    /// deregistered the worker.
    pub async fn shutdown(&self, grace: Duration) {
        let graceful = async {
            self.stop().await;
            self.done.cancelled().await;
        };
        if timeout(grace, graceful).await.is_err() {
            tracing::warn!(
                agent_id = %self.agent_id,
                grace_ms = grace.as_millis() as u64,
                "Graceful stop timed out, killing worker"
            );
            self.abort.abort();
            self.done.cancelled().await;
        }
    }

    /// Wait until the worker has terminated, without requesting it
    pub async fn terminated(&self) {
        self.done.cancelled().await;
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("agent_id", &self.agent_id)
            .field("instance_id", &self.instance_id)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

/// State owned exclusively by the worker task. Never shared; every
/// mutation happens inside the worker's own loop.
struct AgentState {
    agent_id: String,
    provider: String,
    tools: Vec<String>,
    memory: Option<String>,
    system_prompt: String,
    settings: HashMap<String, serde_json::Value>,
    conversation: Vec<ChatMessage>,
    context: HashMap<String, serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl AgentState {
    fn from_config(config: &AgentConfig) -> Self {
        let memory = config
            .settings
            .get("memory")
            .and_then(|v| v.as_str())
            .map(String::from);
        Self {
            agent_id: config.agent_id.clone(),
            provider: config.provider.clone(),
            tools: config.tools.clone(),
            memory,
            system_prompt: config.system_prompt.clone(),
            settings: config.settings.clone(),
            conversation: Vec::new(),
            context: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Best-effort footprint estimate of the state this worker owns
    fn approx_bytes(&self) -> u64 {
        let conversation: usize = self
            .conversation
            .iter()
            .map(|m| m.role.len() + m.content.len())
            .sum();
        let settings: usize = self
            .settings
            .iter()
            .map(|(k, v)| k.len() + v.to_string().len())
            .sum();
        let context: usize = self
            .context
            .iter()
            .map(|(k, v)| k.len() + v.to_string().len())
            .sum();
        let tools: usize = self.tools.iter().map(String::len).sum();
        (256 + self.system_prompt.len() + conversation + settings + context + tools) as u64
    }

    fn snapshot(&self) -> AgentStateSnapshot {
        AgentStateSnapshot {
            agent_id: self.agent_id.clone(),
            provider: self.provider.clone(),
            tools: self.tools.clone(),
            memory: self.memory.clone(),
            system_prompt: self.system_prompt.clone(),
            settings: self.settings.clone(),
            conversation: self.conversation.clone(),
            context: self.context.clone(),
            approx_bytes: self.approx_bytes(),
            created_at: self.created_at,
        }
    }
}

/// Create a worker for `config` and register it.
///
/// Registration is the atomic check-and-insert: on an identifier conflict
/// nothing observable was started and `AlreadyRunning` is returned. On
/// success the worker is addressable through the returned handle and a
/// monitor task guarantees deregistration on any exit path.
pub async fn spawn(
    config: AgentConfig,
    provider: ProviderHandle,
    registry: Registry,
    sink: SinkHandle,
    mailbox_capacity: usize,
) -> Result<WorkerHandle, AgentError> {
    if config.agent_id.trim().is_empty() {
        return Err(AgentError::InvalidConfig(
            "agent_id must not be empty".to_string(),
        ));
    }

    let instance_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
    let done = CancellationToken::new();

    let state = AgentState::from_config(&config);
    let provider_name = config.provider.clone();
    let task = tokio::spawn(run_worker(state, rx, provider, sink.clone()));

    let handle = WorkerHandle {
        agent_id: config.agent_id.clone(),
        instance_id,
        tx,
        done: done.clone(),
        abort: task.abort_handle(),
    };

    // The task has no observable effect until it is addressable, so
    // aborting it on a registration conflict leaves no trace.
    if let Err(err) = registry.register(handle.clone()).await {
        task.abort();
        return Err(err);
    }

    let monitor_registry = registry;
    let monitor_sink = sink.clone();
    let monitor_id = config.agent_id.clone();
    tokio::spawn(async move {
        let reason = match task.await {
            Ok(()) => "stopped",
            Err(err) if err.is_panic() => "crashed",
            Err(_) => "killed",
        };
        // Instance-guarded: a replacement worker registered under the
        // same id must not be evicted by this monitor.
        monitor_registry
            .deregister_instance(&monitor_id, instance_id)
            .await;
        if reason == "stopped" {
            tracing::info!(agent_id = %monitor_id, "Agent stopped");
        } else {
            tracing::warn!(agent_id = %monitor_id, reason = reason, "Agent terminated");
        }
        monitor_sink.emit(
            TelemetryEvent::new("agent.terminated")
                .metadata("agent_id", &monitor_id)
                .metadata("reason", reason),
        );
        done.cancel();
    });

    tracing::info!(
        agent_id = %config.agent_id,
        instance_id = %instance_id,
        provider = %provider_name,
        "Agent created"
    );
    sink.emit(
        TelemetryEvent::new("agent.created")
            .metadata("agent_id", &config.agent_id)
            .metadata("provider", &provider_name),
    );

    Ok(handle)
}

async fn run_worker(
    mut state: AgentState,
    mut rx: mpsc::Receiver<Command>,
    provider: ProviderHandle,
    sink: SinkHandle,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Chat { message, reply } => {
                let started = Instant::now();
                state.conversation.push(ChatMessage::user(message));
                let result = provider
                    .generate(&state.system_prompt, &state.conversation, &state.tools)
                    .await;
                let duration_ms = started.elapsed().as_secs_f64() * 1_000.0;

                match result {
                    Ok(response) => {
                        state.conversation.push(ChatMessage::assistant(&response));
                        sink.emit(
                            TelemetryEvent::new("agent.chat")
                                .measurement("duration_ms", duration_ms)
                                .metadata("agent_id", &state.agent_id)
                                .metadata("outcome", "ok"),
                        );
                        let _ = reply.send(Ok(response));
                    }
                    Err(err) => {
                        // Collaborator failure is returned, not fatal;
                        // the user turn stays in the conversation.
                        tracing::warn!(
                            agent_id = %state.agent_id,
                            error = %err,
                            "Provider call failed"
                        );
                        sink.emit(
                            TelemetryEvent::new("agent.chat")
                                .measurement("duration_ms", duration_ms)
                                .metadata("agent_id", &state.agent_id)
                                .metadata("outcome", "error"),
                        );
                        let _ = reply.send(Err(AgentError::Provider(err.to_string())));
                    }
                }
            }
            Command::GetState { reply } => {
                let _ = reply.send(state.snapshot());
            }
            Command::Health { reply } => {
                let _ = reply.send(());
            }
            Command::Stop { reply } => {
                let _ = reply.send(());
                break;
            }
        }
    }
    // Dropping the receiver fails any queued senders, so late callers
    // get NotFound instead of hanging.
    tracing::debug!(agent_id = %state.agent_id, "Worker loop exited");
}
