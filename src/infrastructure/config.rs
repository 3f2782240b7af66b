//! Engine configuration read from the environment

use std::str::FromStr;
use std::time::Duration;

use crate::infrastructure::bot::strategies::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DEFAULT_THREAT_THRESHOLD,
};

/// Tunables for bot decisions
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Upper bound on one bot decision, provider retries included
    pub ai_timeout: Duration,
    /// Provider attempts before falling back to the heuristic
    pub provider_max_attempts: u32,
    /// Timeout of a single provider call
    pub provider_attempt_timeout: Duration,
    pub hard_threat_threshold: f64,
    pub decision_cache_ttl: Duration,
    pub decision_cache_capacity: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let ai_timeout_ms = env_or("LANDLORD_AI_TIMEOUT_MS", 2000u64);
        let provider_max_attempts =
            env_or("LANDLORD_PROVIDER_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS).max(1);
        let attempt_ms = env_or(
            "LANDLORD_PROVIDER_ATTEMPT_TIMEOUT_MS",
            DEFAULT_ATTEMPT_TIMEOUT.as_millis() as u64,
        );
        Self {
            ai_timeout: Duration::from_millis(ai_timeout_ms),
            provider_max_attempts,
            provider_attempt_timeout: Duration::from_millis(attempt_ms),
            hard_threat_threshold: env_or(
                "LANDLORD_HARD_THREAT_THRESHOLD",
                DEFAULT_THREAT_THRESHOLD,
            ),
            decision_cache_ttl: Duration::from_secs(env_or(
                "LANDLORD_DECISION_CACHE_TTL_SECS",
                300u64,
            )),
            decision_cache_capacity: env_or("LANDLORD_DECISION_CACHE_CAPACITY", 256u64),
        }
    }
}

impl EngineConfig {
    /// Deadline for a provider-backed decision: every attempt plus the
    /// heuristic fallback has to fit
    pub fn provider_deadline(&self) -> Duration {
        let attempts = self.provider_attempt_timeout * self.provider_max_attempts;
        attempts.max(self.ai_timeout) + self.ai_timeout
    }
}
