// ABOUTME: Provider trait defining how aviary connects to LLM backends
// ABOUTME: Implementations: Placeholder (default stub), Echo (tests and demos)

use crate::types::ChatMessage;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Fixed response returned by the placeholder provider.
pub const PLACEHOLDER_RESPONSE: &str = "This is a placeholder response from the agent.";

/// A provider is an LLM adapter that turns a conversation into a response.
///
/// Generation may take arbitrarily long; callers that cannot tolerate that
/// must apply their own bound. Errors are returned, never panicked.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique name for this provider
    fn name(&self) -> &'static str;

    /// Produce a response for the conversation so far
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        tools: &[String],
    ) -> Result<String>;
}

/// Send+Sync handle to a provider
#[derive(Clone)]
pub struct ProviderHandle {
    provider: Arc<dyn Provider>,
}

impl ProviderHandle {
    pub fn new<P: Provider + 'static>(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Create from an existing Arc'd provider (allows keeping a reference to concrete type)
    pub fn new_from_arc<P: Provider + 'static>(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub fn name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        tools: &[String],
    ) -> Result<String> {
        self.provider.generate(system_prompt, messages, tools).await
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("name", &self.provider.name())
            .finish()
    }
}

/// Stub provider used when no real LLM backend is wired up.
/// Always returns the same fixed string.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderProvider;

#[async_trait]
impl Provider for PlaceholderProvider {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn generate(
        &self,
        _system_prompt: &str,
        _messages: &[ChatMessage],
        _tools: &[String],
    ) -> Result<String> {
        Ok(PLACEHOLDER_RESPONSE.to_string())
    }
}

/// Echoes the last user message back. Handy for exercising the chat path
/// without an API key.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoProvider;

#[async_trait]
impl Provider for EchoProvider {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn generate(
        &self,
        _system_prompt: &str,
        messages: &[ChatMessage],
        _tools: &[String],
    ) -> Result<String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(format!("echo: {}", last_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_returns_fixed_string() {
        let provider = PlaceholderProvider;
        let response = provider
            .generate("prompt", &[ChatMessage::user("hi")], &[])
            .await
            .unwrap();
        assert_eq!(response, PLACEHOLDER_RESPONSE);
    }

    #[tokio::test]
    async fn test_echo_returns_last_user_message() {
        let provider = EchoProvider;
        let messages = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("echo: first"),
            ChatMessage::user("second"),
        ];
        let response = provider.generate("prompt", &messages, &[]).await.unwrap();
        assert_eq!(response, "echo: second");
    }

    #[tokio::test]
    async fn test_handle_forwards_name_and_generate() {
        let handle = ProviderHandle::new(EchoProvider);
        assert_eq!(handle.name(), "echo");

        let response = handle
            .generate("prompt", &[ChatMessage::user("hello")], &[])
            .await
            .unwrap();
        assert_eq!(response, "echo: hello");
    }

    #[test]
    fn test_handle_debug_includes_name() {
        let handle = ProviderHandle::new(PlaceholderProvider);
        let debug = format!("{:?}", handle);
        assert!(debug.contains("placeholder"));
    }
}
