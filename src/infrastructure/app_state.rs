use std::sync::Arc;

use crate::infrastructure::bot::decision_cache::DecisionCache;
use crate::infrastructure::bot::strategies::LlmBotStrategy;
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::services::{
    LlmService, OllamaConfig, OllamaService, OpenAiCompatibleService, OpenAiConfig,
};

/// Shared wiring for every match: configuration, the optional decision
/// provider and the decision cache
#[derive(Clone)]
pub struct AppState {
    pub config: EngineConfig,

    /// LLM service for bot decisions (optional)
    pub llm_service: Option<Arc<dyn LlmService>>,

    /// Provider decisions keyed by state fingerprint
    pub decision_cache: Arc<DecisionCache>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = EngineConfig::default();

        // Priority: OpenAI-compatible endpoint > Ollama > None
        let llm_service: Option<Arc<dyn LlmService>> = if std::env::var("LLM_API_BASE_URL").is_ok()
        {
            let service = OpenAiCompatibleService::new(OpenAiConfig::default());
            if service.health_check().await {
                tracing::info!("Chat completions LLM service initialized and available");
                Some(Arc::new(service))
            } else {
                tracing::warn!("LLM_API_BASE_URL set but not reachable - LLM bots will use fallback");
                None
            }
        } else if std::env::var("OLLAMA_BASE_URL").is_ok()
            || std::env::var("ENABLE_LLM_BOTS").is_ok()
        {
            let service = OllamaService::new(OllamaConfig::default());
            if service.health_check().await {
                tracing::info!("Ollama LLM service initialized and available");
                Some(Arc::new(service))
            } else {
                tracing::warn!("Ollama configured but not available - LLM bots will use fallback");
                None
            }
        } else {
            tracing::info!("LLM service not configured - LLM bots will use fallback strategy");
            None
        };

        Ok(Self::with_service(config, llm_service))
    }

    /// Wire explicit parts, e.g. a mock provider in tests
    pub fn with_service(config: EngineConfig, llm_service: Option<Arc<dyn LlmService>>) -> Self {
        let decision_cache = Arc::new(DecisionCache::new(
            config.decision_cache_ttl,
            config.decision_cache_capacity,
        ));
        Self {
            config,
            llm_service,
            decision_cache,
        }
    }

    /// Provider-backed strategy sharing this state's cache
    pub fn llm_strategy(&self) -> LlmBotStrategy {
        LlmBotStrategy::new(self.llm_service.clone(), Some(self.decision_cache.clone()))
            .with_max_attempts(self.config.provider_max_attempts)
            .with_attempt_timeout(self.config.provider_attempt_timeout)
    }
}
