// ABOUTME: Error types for aviary agent operations
// ABOUTME: Typed taxonomy returned by workers, registry, and supervisor

use thiserror::Error;

/// Errors that can occur in agent lifecycle and call operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent not found: {0}")]
    NotFound(String),

    #[error("Agent already running: {0}")]
    AlreadyRunning(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl AgentError {
    /// True when the error means the identifier has no live worker
    pub fn is_not_found(&self) -> bool {
        matches!(self, AgentError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_found() {
        let err = AgentError::NotFound("research".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Agent not found"));
        assert!(display.contains("research"));
    }

    #[test]
    fn test_display_already_running() {
        let err = AgentError::AlreadyRunning("research".to_string());
        let display = format!("{}", err);
        assert!(display.contains("already running"));
        assert!(display.contains("research"));
    }

    #[test]
    fn test_display_timeout() {
        let err = AgentError::Timeout("health check".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Timed out"));
        assert!(display.contains("health check"));
    }

    #[test]
    fn test_display_provider() {
        let err = AgentError::Provider("rate limited".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Provider error"));
        assert!(display.contains("rate limited"));
    }

    #[test]
    fn test_display_invalid_config() {
        let err = AgentError::InvalidConfig("missing agent_id".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Invalid config"));
        assert!(display.contains("missing agent_id"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(AgentError::NotFound("a".to_string()).is_not_found());
        assert!(!AgentError::Timeout("a".to_string()).is_not_found());
    }
}
