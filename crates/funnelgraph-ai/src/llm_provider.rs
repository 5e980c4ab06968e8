use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use funnelgraph_core::Result;

/// A single vendor-agnostic text-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// User-facing prompt text
    pub prompt: String,
    /// Optional system instruction constraining the output
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: Option<usize>,
    /// Temperature for sampling
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text content
    pub content: String,
    /// Model that produced the completion
    pub model: String,
    /// Tokens used in the prompt
    pub prompt_tokens: Option<usize>,
    /// Tokens generated in the completion
    pub completion_tokens: Option<usize>,
    /// Total tokens used in the request
    pub total_tokens: Option<usize>,
}

impl CompletionResponse {
    /// Total token count, reconstructed from the parts when the provider
    /// did not report it directly.
    pub fn tokens_used(&self) -> usize {
        self.total_tokens.unwrap_or_else(|| {
            self.prompt_tokens.unwrap_or(0) + self.completion_tokens.unwrap_or(0)
        })
    }
}

/// Capability interface every text-generation provider implements.
///
/// The orchestrator depends only on this trait; concrete adapters wrap
/// the actual HTTP calls to specific vendors.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Execute one completion request against the backing service.
    async fn execute(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// Check if the provider is reachable and ready.
    async fn is_available(&self) -> bool {
        true
    }

    /// Get the name of this provider
    fn provider_name(&self) -> &str;

    /// Get the model identifier
    fn model_name(&self) -> &str;
}

/// Static registration data for one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub enabled: bool,
    /// Lower values are tried first
    pub priority: i32,
    /// Successful dispatches allowed before the provider is excluded
    /// until the next usage reset
    pub rate_limit: u32,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>, priority: i32, rate_limit: u32) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            priority,
            rate_limit,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Point-in-time usage snapshot for one registered provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub name: String,
    pub enabled: bool,
    pub current_usage: u32,
    pub rate_limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_used_prefers_reported_total() {
        let response = CompletionResponse {
            content: "ok".to_string(),
            model: "m".to_string(),
            prompt_tokens: Some(10),
            completion_tokens: Some(5),
            total_tokens: Some(20),
        };
        assert_eq!(response.tokens_used(), 20);
    }

    #[test]
    fn test_tokens_used_sums_parts_when_total_missing() {
        let response = CompletionResponse {
            content: "ok".to_string(),
            model: "m".to_string(),
            prompt_tokens: Some(10),
            completion_tokens: Some(5),
            total_tokens: None,
        };
        assert_eq!(response.tokens_used(), 15);
    }

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("hello")
            .with_system_prompt("be terse")
            .with_max_tokens(64)
            .with_temperature(0.2);
        assert_eq!(request.prompt, "hello");
        assert_eq!(request.system_prompt.as_deref(), Some("be terse"));
        assert_eq!(request.max_tokens, Some(64));
    }
}
