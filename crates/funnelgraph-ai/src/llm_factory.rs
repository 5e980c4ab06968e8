use std::sync::Arc;
use std::time::Duration;

use funnelgraph_core::{AiConfig, FunnelGraphError, ProviderEntry, Result};

use crate::llm_provider::{LLMProvider, ProviderDescriptor};
use crate::ollama_provider::{OllamaConfig, OllamaProvider};
use crate::orchestrator::ProviderOrchestrator;

#[cfg(feature = "anthropic")]
use crate::anthropic_provider::{AnthropicConfig, AnthropicProvider};

#[cfg(feature = "openai-compatible")]
use crate::openai_compatible_provider::{OpenAICompatibleConfig, OpenAICompatibleProvider};

/// Factory for building provider adapters and orchestrators from
/// configuration.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Build an orchestrator with every configured provider registered,
    /// in configuration order.
    pub fn build_orchestrator(config: &AiConfig) -> Result<ProviderOrchestrator> {
        let orchestrator =
            ProviderOrchestrator::with_timeout(Duration::from_secs(config.dispatch_timeout_secs));

        for entry in &config.providers {
            let adapter = Self::create_adapter(entry)?;
            let descriptor = ProviderDescriptor {
                name: entry.name.clone(),
                enabled: entry.enabled,
                priority: entry.priority,
                rate_limit: entry.rate_limit,
            };
            orchestrator.register(descriptor, adapter);
        }

        Ok(orchestrator)
    }

    /// Create a provider adapter from one configuration entry.
    pub fn create_adapter(entry: &ProviderEntry) -> Result<Arc<dyn LLMProvider>> {
        let provider_name = entry.name.to_lowercase();

        match provider_name.as_str() {
            "ollama" => Self::create_ollama_adapter(entry),
            #[cfg(feature = "anthropic")]
            "anthropic" => Self::create_anthropic_adapter(entry),
            #[cfg(feature = "openai-compatible")]
            "lmstudio" => Self::create_lmstudio_adapter(entry),
            #[cfg(feature = "openai-compatible")]
            "openai-compatible" => Self::create_openai_compatible_adapter(entry),
            _ => Err(FunnelGraphError::InvalidOperation(format!(
                "Unsupported provider: {}. Available providers: ollama{}{}",
                provider_name,
                if cfg!(feature = "anthropic") {
                    ", anthropic"
                } else {
                    ""
                },
                if cfg!(feature = "openai-compatible") {
                    ", lmstudio, openai-compatible"
                } else {
                    ""
                }
            ))),
        }
    }

    fn create_ollama_adapter(entry: &ProviderEntry) -> Result<Arc<dyn LLMProvider>> {
        let mut config = OllamaConfig::default();
        if let Some(model) = &entry.model {
            config.model = model.clone();
        }
        if let Some(base_url) = &entry.base_url {
            config.base_url = base_url.clone();
        }
        config.timeout = Duration::from_secs(entry.timeout_secs);

        Ok(Arc::new(OllamaProvider::new(config)))
    }

    #[cfg(feature = "anthropic")]
    fn create_anthropic_adapter(entry: &ProviderEntry) -> Result<Arc<dyn LLMProvider>> {
        let api_key = entry
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                FunnelGraphError::InvalidOperation(
                    "Anthropic API key not found. Set 'api_key' in the provider entry \
                     or ANTHROPIC_API_KEY environment variable"
                        .to_string(),
                )
            })?;

        let config = AnthropicConfig {
            api_key,
            model: entry
                .model
                .clone()
                .unwrap_or_else(|| "claude-3-5-sonnet-20241022".to_string()),
            timeout_secs: entry.timeout_secs,
            max_retries: 3,
        };

        Ok(Arc::new(AnthropicProvider::new(config)?))
    }

    #[cfg(feature = "openai-compatible")]
    fn create_lmstudio_adapter(entry: &ProviderEntry) -> Result<Arc<dyn LLMProvider>> {
        let mut config = OpenAICompatibleConfig::lm_studio(
            entry
                .model
                .clone()
                .unwrap_or_else(|| "local-model".to_string()),
        );
        if let Some(base_url) = &entry.base_url {
            config.base_url = base_url.clone();
        }
        config.timeout_secs = entry.timeout_secs;

        Ok(Arc::new(OpenAICompatibleProvider::new(config)?))
    }

    #[cfg(feature = "openai-compatible")]
    fn create_openai_compatible_adapter(entry: &ProviderEntry) -> Result<Arc<dyn LLMProvider>> {
        let base_url = entry.base_url.clone().ok_or_else(|| {
            FunnelGraphError::InvalidOperation(
                "OpenAI-compatible base URL not found. Set 'base_url' in the provider entry"
                    .to_string(),
            )
        })?;
        let model = entry.model.clone().ok_or_else(|| {
            FunnelGraphError::InvalidOperation(
                "Model name is required for OpenAI-compatible provider".to_string(),
            )
        })?;

        let mut config =
            OpenAICompatibleConfig::custom(base_url, model, "openai-compatible".to_string());
        config.api_key = entry.api_key.clone();
        config.timeout_secs = entry.timeout_secs;

        Ok(Arc::new(OpenAICompatibleProvider::new(config)?))
    }

    /// Get a list of supported providers (based on enabled features)
    pub fn supported_providers() -> Vec<&'static str> {
        let mut providers = vec!["ollama"];

        #[cfg(feature = "openai-compatible")]
        providers.push("lmstudio");

        #[cfg(feature = "openai-compatible")]
        providers.push("openai-compatible");

        #[cfg(feature = "anthropic")]
        providers.push("anthropic");

        providers
    }
}
