use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info};

use funnelgraph_core::{FunnelGraphError, Result};

use crate::llm_provider::{CompletionRequest, CompletionResponse, LLMProvider};

const DEFAULT_MODEL: &str = "llama3.1:8b";
const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: usize = 2048;

/// Configuration for the local Ollama provider.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<usize>,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
}

/// Text-generation provider backed by a local Ollama daemon.
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check whether the daemon is up and serving the configured model.
    pub async fn check_availability(&self) -> Result<bool> {
        debug!("Checking Ollama availability at {}", self.config.base_url);

        let response = timeout(
            Duration::from_secs(5),
            self.client
                .get(format!("{}/api/tags", self.config.base_url))
                .send(),
        )
        .await
        .map_err(|_| FunnelGraphError::Timeout("Ollama availability check timeout".to_string()))?
        .map_err(|e| {
            FunnelGraphError::Network(format!("Ollama availability check failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let models: serde_json::Value = response.json().await.map_err(|_| {
            FunnelGraphError::Parse("Failed to parse Ollama models response".to_string())
        })?;

        let model_base = self.config.model.split(':').next().unwrap_or_default();
        let has_model = models["models"]
            .as_array()
            .map(|models| {
                models.iter().any(|model| {
                    model["name"]
                        .as_str()
                        .map(|name| name.starts_with(model_base))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);

        info!("Ollama model '{}' available: {}", self.config.model, has_model);
        Ok(has_model)
    }

    fn build_prompt(request: &CompletionRequest) -> String {
        match &request.system_prompt {
            Some(system) => format!(
                "{}\n\nUser: {}\n\nAssistant:",
                system, request.prompt
            ),
            None => format!("User: {}\n\nAssistant:", request.prompt),
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn execute(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let body = GenerateRequest {
            model: self.config.model.clone(),
            prompt: Self::build_prompt(request),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                num_predict: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            },
        };

        debug!("Sending generation request to Ollama model '{}'", self.config.model);

        let response = timeout(
            self.config.timeout,
            self.client
                .post(format!("{}/api/generate", self.config.base_url))
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| {
            FunnelGraphError::Timeout(format!(
                "Ollama request timeout after {:?}",
                self.config.timeout
            ))
        })?
        .map_err(|e| FunnelGraphError::Network(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FunnelGraphError::Provider(format!(
                "Ollama API error: {}",
                error_text
            )));
        }

        let data: GenerateResponse = response.json().await.map_err(|e| {
            FunnelGraphError::Parse(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(CompletionResponse {
            content: data.response,
            model: self.config.model.clone(),
            prompt_tokens: data.prompt_eval_count,
            completion_tokens: data.eval_count,
            total_tokens: None,
        })
    }

    async fn is_available(&self) -> bool {
        self.check_availability().await.unwrap_or(false)
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
