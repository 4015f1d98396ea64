// ABOUTME: Shared types and collaborator boundaries for the aviary workspace.
// ABOUTME: Re-exports config, errors, provider trait, telemetry, and agent types.

pub mod config;
pub mod error;
pub mod provider;
pub mod telemetry;
pub mod types;

pub use config::{Config, StartupAgent};
pub use error::AgentError;
pub use provider::{
    EchoProvider, PlaceholderProvider, Provider, ProviderHandle, PLACEHOLDER_RESPONSE,
};
pub use telemetry::{ChannelSink, NoopSink, SinkHandle, TelemetryEvent, TelemetrySink, TracingSink};
pub use types::{
    AgentConfig, AgentInfo, AgentStatus, AgentStateSnapshot, ChatMessage, ConfigOverrides,
};
