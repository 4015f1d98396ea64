// ABOUTME: aviary library with worker, registry, supervisor, and daemon modules.
// ABOUTME: Re-exports for programmatic use of the supervision layer.

pub mod daemon;
pub mod init;
pub mod registry;
pub mod supervisor;
pub mod worker;

pub use aviary_core::{
    AgentConfig, AgentError, AgentInfo, AgentStateSnapshot, AgentStatus, ChatMessage, Config,
    ConfigOverrides,
};
pub use daemon::{run_chat, run_daemon, ChatOptions, DaemonOptions};
pub use init::run_init;
pub use registry::Registry;
pub use supervisor::{HealthReport, Supervisor};
pub use worker::WorkerHandle;
