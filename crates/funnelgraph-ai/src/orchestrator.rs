use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use funnelgraph_core::{FunnelGraphError, Result};

use crate::llm_provider::{CompletionRequest, LLMProvider, ProviderDescriptor, ProviderUsage};

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Successful outcome of one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub content: String,
    pub provider_name: String,
    pub tokens_used: usize,
}

struct RegisteredProvider {
    descriptor: ProviderDescriptor,
    adapter: Arc<dyn LLMProvider>,
    enabled: AtomicBool,
    usage: AtomicU32,
}

/// Tries registered providers in priority order until one succeeds.
///
/// Providers are attempted sequentially, never fanned out: a
/// lower-priority provider is only charged once every higher-priority
/// candidate has definitively failed. Usage counters are process-lifetime
/// state owned by this instance and reset only through
/// [`reset_usage`](Self::reset_usage). A provider is never retried within
/// a single dispatch; retry policy belongs to the caller.
pub struct ProviderOrchestrator {
    providers: RwLock<Vec<Arc<RegisteredProvider>>>,
    attempt_timeout: Duration,
}

impl Default for ProviderOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderOrchestrator {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_ATTEMPT_TIMEOUT)
    }

    /// `attempt_timeout` bounds each individual provider call; a timed-out
    /// call is treated like any other provider failure.
    pub fn with_timeout(attempt_timeout: Duration) -> Self {
        Self {
            providers: RwLock::new(Vec::new()),
            attempt_timeout,
        }
    }

    /// Register a provider. Registration order breaks priority ties.
    pub fn register(&self, descriptor: ProviderDescriptor, adapter: Arc<dyn LLMProvider>) {
        debug!(
            "Registered provider '{}' (priority {}, rate limit {})",
            descriptor.name, descriptor.priority, descriptor.rate_limit
        );
        let enabled = AtomicBool::new(descriptor.enabled);
        self.providers.write().push(Arc::new(RegisteredProvider {
            descriptor,
            adapter,
            enabled,
            usage: AtomicU32::new(0),
        }));
    }

    pub fn provider_count(&self) -> usize {
        self.providers.read().len()
    }

    /// Enable or disable a provider by name. Returns false when no
    /// provider with that name is registered.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let providers = self.providers.read();
        let mut found = false;
        for provider in providers.iter() {
            if provider.descriptor.name == name {
                provider.enabled.store(enabled, Ordering::Release);
                found = true;
            }
        }
        found
    }

    /// Dispatch a request through the provider chain.
    pub async fn dispatch(&self, request: &CompletionRequest) -> Result<DispatchResult> {
        self.dispatch_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Dispatch with caller-controlled cancellation. Cancellation is a
    /// hard stop: the in-flight attempt is abandoned and no further
    /// candidates are tried.
    pub async fn dispatch_with_cancellation(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult> {
        let request_id = Uuid::new_v4();

        // Snapshot under the read lock; the lock is never held across an
        // await point.
        let mut candidates: Vec<Arc<RegisteredProvider>> = self
            .providers
            .read()
            .iter()
            .filter(|p| {
                p.enabled.load(Ordering::Acquire)
                    && p.usage.load(Ordering::Acquire) < p.descriptor.rate_limit
            })
            .cloned()
            .collect();

        // Stable sort: ties keep registration order, so candidate order
        // is deterministic.
        candidates.sort_by_key(|p| p.descriptor.priority);

        if candidates.is_empty() {
            warn!("Dispatch {}: no eligible providers", request_id);
            return Err(FunnelGraphError::AllProvidersExhausted);
        }

        for provider in candidates {
            let name = provider.descriptor.name.as_str();
            debug!("Dispatch {}: trying provider '{}'", request_id, name);

            let attempt = timeout(self.attempt_timeout, provider.adapter.execute(request));
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Dispatch {} cancelled while trying '{}'", request_id, name);
                    return Err(FunnelGraphError::Cancelled);
                }
                outcome = attempt => outcome,
            };

            match outcome {
                Ok(Ok(response)) => {
                    provider.usage.fetch_add(1, Ordering::AcqRel);
                    info!(
                        "Dispatch {} fulfilled by '{}' ({} tokens)",
                        request_id,
                        name,
                        response.tokens_used()
                    );
                    let tokens_used = response.tokens_used();
                    return Ok(DispatchResult {
                        content: response.content,
                        provider_name: provider.descriptor.name.clone(),
                        tokens_used,
                    });
                }
                Ok(Err(e)) => {
                    warn!(
                        "Dispatch {}: provider '{}' failed: {}",
                        request_id, name, e
                    );
                }
                Err(_) => {
                    warn!(
                        "Dispatch {}: provider '{}' timed out after {:?}",
                        request_id, name, self.attempt_timeout
                    );
                }
            }
        }

        warn!("Dispatch {}: every candidate failed", request_id);
        Err(FunnelGraphError::AllProvidersExhausted)
    }

    /// Usage snapshot across all registered providers, in registration
    /// order.
    pub fn usage(&self) -> Vec<ProviderUsage> {
        self.providers
            .read()
            .iter()
            .map(|p| ProviderUsage {
                name: p.descriptor.name.clone(),
                enabled: p.enabled.load(Ordering::Acquire),
                current_usage: p.usage.load(Ordering::Acquire),
                rate_limit: p.descriptor.rate_limit,
            })
            .collect()
    }

    /// Zero every provider's usage counter. Idempotent; the only mutator
    /// of usage besides a successful dispatch.
    pub fn reset_usage(&self) {
        for provider in self.providers.read().iter() {
            provider.usage.store(0, Ordering::Release);
        }
        debug!("Provider usage counters reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_provider::CompletionResponse;
    use async_trait::async_trait;

    struct StaticProvider {
        name: String,
        reply: String,
        calls: AtomicU32,
    }

    impl StaticProvider {
        fn new(name: &str, reply: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                reply: reply.to_string(),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl LLMProvider for StaticProvider {
        async fn execute(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: "mock".to_string(),
                prompt_tokens: Some(10),
                completion_tokens: Some(7),
                total_tokens: None,
            })
        }

        fn provider_name(&self) -> &str {
            &self.name
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    struct FailingProvider {
        name: String,
        calls: AtomicU32,
    }

    impl FailingProvider {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl LLMProvider for FailingProvider {
        async fn execute(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FunnelGraphError::Network("connection refused".to_string()))
        }

        fn provider_name(&self) -> &str {
            &self.name
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    struct StallingProvider;

    #[async_trait]
    impl LLMProvider for StallingProvider {
        async fn execute(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("stalling provider should always be timed out")
        }

        fn provider_name(&self) -> &str {
            "stalling"
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    fn usage_of(orchestrator: &ProviderOrchestrator, name: &str) -> u32 {
        orchestrator
            .usage()
            .into_iter()
            .find(|u| u.name == name)
            .unwrap()
            .current_usage
    }

    #[tokio::test]
    async fn test_failover_skips_failed_provider_and_charges_winner() {
        let orchestrator = ProviderOrchestrator::new();
        let primary = FailingProvider::new("primary");
        let secondary = StaticProvider::new("secondary", "from secondary");
        orchestrator.register(ProviderDescriptor::new("primary", 1, 10), primary.clone());
        orchestrator.register(ProviderDescriptor::new("secondary", 2, 10), secondary.clone());

        let result = orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .unwrap();

        assert_eq!(result.provider_name, "secondary");
        assert_eq!(result.content, "from secondary");
        assert_eq!(result.tokens_used, 17);
        assert_eq!(usage_of(&orchestrator, "primary"), 0);
        assert_eq!(usage_of(&orchestrator, "secondary"), 1);
    }

    #[tokio::test]
    async fn test_success_short_circuits_later_providers() {
        let orchestrator = ProviderOrchestrator::new();
        let first = StaticProvider::new("first", "a");
        let second = StaticProvider::new("second", "b");
        orchestrator.register(ProviderDescriptor::new("first", 1, 10), first.clone());
        orchestrator.register(ProviderDescriptor::new("second", 2, 10), second.clone());

        let result = orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .unwrap();

        assert_eq!(result.provider_name, "first");
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_priority_ties_keep_registration_order() {
        let orchestrator = ProviderOrchestrator::new();
        orchestrator.register(
            ProviderDescriptor::new("alpha", 5, 10),
            StaticProvider::new("alpha", "a"),
        );
        orchestrator.register(
            ProviderDescriptor::new("beta", 5, 10),
            StaticProvider::new("beta", "b"),
        );

        let result = orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .unwrap();
        assert_eq!(result.provider_name, "alpha");
    }

    #[tokio::test]
    async fn test_rate_limited_provider_is_excluded() {
        let orchestrator = ProviderOrchestrator::new();
        let limited = StaticProvider::new("limited", "limited");
        let backup = StaticProvider::new("backup", "backup");
        orchestrator.register(ProviderDescriptor::new("limited", 1, 1), limited.clone());
        orchestrator.register(ProviderDescriptor::new("backup", 2, 10), backup.clone());

        let first = orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .unwrap();
        assert_eq!(first.provider_name, "limited");

        // The higher-priority provider hit its limit; the backup takes over.
        let second = orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .unwrap();
        assert_eq!(second.provider_name, "backup");
        assert_eq!(limited.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_usage_restores_eligibility() {
        let orchestrator = ProviderOrchestrator::new();
        orchestrator.register(
            ProviderDescriptor::new("only", 1, 1),
            StaticProvider::new("only", "ok"),
        );

        orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .unwrap();
        assert!(orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .is_err());

        orchestrator.reset_usage();
        assert_eq!(usage_of(&orchestrator, "only"), 0);
        assert!(orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_disabled_provider_is_excluded() {
        let orchestrator = ProviderOrchestrator::new();
        orchestrator.register(
            ProviderDescriptor::new("off", 1, 10).disabled(),
            StaticProvider::new("off", "nope"),
        );
        orchestrator.register(
            ProviderDescriptor::new("on", 2, 10),
            StaticProvider::new("on", "yes"),
        );

        let result = orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .unwrap();
        assert_eq!(result.provider_name, "on");

        orchestrator.set_enabled("off", true);
        let result = orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .unwrap();
        assert_eq!(result.provider_name, "off");
    }

    #[tokio::test]
    async fn test_empty_registry_is_all_providers_exhausted() {
        let orchestrator = ProviderOrchestrator::new();
        let err = orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, FunnelGraphError::AllProvidersExhausted));
    }

    #[tokio::test]
    async fn test_timeout_falls_through_to_next_candidate() {
        let orchestrator = ProviderOrchestrator::with_timeout(Duration::from_millis(20));
        orchestrator.register(
            ProviderDescriptor::new("slow", 1, 10),
            Arc::new(StallingProvider),
        );
        orchestrator.register(
            ProviderDescriptor::new("fast", 2, 10),
            StaticProvider::new("fast", "made it"),
        );

        let result = orchestrator
            .dispatch(&CompletionRequest::new("hi"))
            .await
            .unwrap();
        assert_eq!(result.provider_name, "fast");
        assert_eq!(usage_of(&orchestrator, "slow"), 0);
    }

    #[tokio::test]
    async fn test_cancellation_is_a_hard_stop() {
        let orchestrator = ProviderOrchestrator::new();
        orchestrator.register(
            ProviderDescriptor::new("slow", 1, 10),
            Arc::new(StallingProvider),
        );
        let fast = StaticProvider::new("fast", "never reached");
        orchestrator.register(ProviderDescriptor::new("fast", 2, 10), fast.clone());

        let cancel = CancellationToken::new();
        let request = CompletionRequest::new("hi");
        let dispatch = orchestrator.dispatch_with_cancellation(&request, &cancel);

        let err = tokio::join!(dispatch, async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        })
        .0
        .unwrap_err();

        assert!(matches!(err, FunnelGraphError::Cancelled));
        // Cancellation must not cascade into the remaining candidates.
        assert_eq!(fast.calls.load(Ordering::SeqCst), 0);
        assert_eq!(usage_of(&orchestrator, "slow"), 0);
    }
}
