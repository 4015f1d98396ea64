// ABOUTME: Daemon loop: boot configured agents, periodic health sweep, clean shutdown.
// ABOUTME: Also hosts the one-shot chat path used by the CLI.

use crate::supervisor::Supervisor;
use anyhow::{Context, Result};
use aviary_core::{AgentConfig, Config};
use std::path::PathBuf;
use std::time::Duration;

/// Interval between fleet-wide health sweeps
const HEALTH_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Options for running the daemon
pub struct DaemonOptions {
    /// Path to configuration file
    pub config_path: Option<PathBuf>,
}

/// Options for a one-shot chat
pub struct ChatOptions {
    pub agent_id: String,
    pub message: String,
    /// Provider selector override
    pub provider: Option<String>,
    pub config_path: Option<PathBuf>,
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    Config::load(&path).context("No aviary config found. Run 'aviary init' first.")
}

/// Start every agent the config pre-declares
async fn start_configured_agents(supervisor: &Supervisor, config: &Config) -> Result<()> {
    for startup in &config.agents {
        let agent = config.agent_config(startup);
        let handle = supervisor.start_agent(agent).await?;
        tracing::info!(
            agent_id = %handle.agent_id(),
            instance_id = %handle.instance_id(),
            "Started agent"
        );
    }
    Ok(())
}

/// Run the supervision daemon until ctrl-c
pub async fn run_daemon(options: DaemonOptions) -> Result<()> {
    let config = load_config(options.config_path)?;
    let supervisor = Supervisor::from_config(&config);

    start_configured_agents(&supervisor, &config).await?;
    tracing::info!(count = supervisor.agent_count().await, "Fleet is up");

    let mut sweep = tokio::time::interval(HEALTH_SWEEP_INTERVAL);
    sweep.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            _ = sweep.tick() => {
                let report = supervisor.health_check_all().await;
                if report.unhealthy.is_empty() {
                    tracing::debug!(healthy = report.healthy.len(), "Health sweep clean");
                } else {
                    for (agent_id, reason) in &report.unhealthy {
                        tracing::warn!(agent_id = %agent_id, reason = %reason, "Agent unhealthy");
                    }
                }
            }
        }
    }

    supervisor.stop_all().await;
    Ok(())
}

/// Start one agent, send one message, print the reply, stop the agent
pub async fn run_chat(options: ChatOptions) -> Result<()> {
    let config = load_config(options.config_path).unwrap_or_default();
    let supervisor = Supervisor::from_config(&config);

    let mut agent = AgentConfig::new(&options.agent_id);
    agent.provider = options
        .provider
        .unwrap_or_else(|| config.default_provider.clone());
    agent.system_prompt = config.default_system_prompt.clone();

    supervisor.start_agent(agent).await?;
    let response = supervisor.chat(&options.agent_id, &options.message).await?;
    println!("{}", response);
    supervisor.stop_agent(&options.agent_id).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_configured_agents_boot_at_startup() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            default_provider = "echo"

            [[agents]]
            agent_id = "research"

            [[agents]]
            agent_id = "drafting"
            provider = "placeholder"
        "#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        let supervisor = Supervisor::from_config(&config);
        start_configured_agents(&supervisor, &config).await.unwrap();

        assert_eq!(supervisor.agent_count().await, 2);
        // The daemon default provider applies where the entry has none
        let response = supervisor.chat("research", "ping").await.unwrap();
        assert_eq!(response, "echo: ping");

        supervisor.stop_all().await;
    }

    #[tokio::test]
    async fn test_missing_config_is_an_error() {
        let result = load_config(Some(PathBuf::from("/nonexistent/aviary.toml")));
        assert!(result.is_err());
    }
}
