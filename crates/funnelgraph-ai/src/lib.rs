pub mod engine;
pub mod fallback;
pub mod llm_factory;
pub mod llm_provider;
pub mod ollama_provider;
pub mod orchestrator;
pub mod suggestion_schemas;
pub mod synthesizer;

// Cloud LLM providers
#[cfg(feature = "anthropic")]
pub mod anthropic_provider;
#[cfg(feature = "openai-compatible")]
pub mod openai_compatible_provider;

pub use engine::FunnelInsightEngine;
pub use fallback::fallback_suggestions;
pub use llm_factory::ProviderFactory;
pub use llm_provider::*;
pub use ollama_provider::{OllamaConfig, OllamaProvider};
pub use orchestrator::{DispatchResult, ProviderOrchestrator};
pub use suggestion_schemas::{parse_suggestions, suggestion_batch_schema, SuggestionBatch};
pub use synthesizer::SuggestionSynthesizer;
