/*!
 * Core translation service implementation.
 *
 * `TranslationService` performs exactly one backend call per `call`: it takes
 * a permit from the run-wide admission gate, applies the request timeout,
 * records statistics and paces the next call while still holding the permit.
 */

use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::{Provider, TranslationRequest};

use super::concurrency::AdmissionGate;
use super::stats::StatsStore;

/// One-call-at-a-time access to the translation backend
#[derive(Debug, Clone)]
pub struct TranslationService {
    provider: Arc<dyn Provider>,
    gate: AdmissionGate,
    stats: StatsStore,
    source_language: String,
    target_language: String,
    model: String,
    timeout: Duration,
    rate_limit_delay: Duration,
}

impl TranslationService {
    /// Create a service from the run configuration
    pub fn new(provider: Arc<dyn Provider>, gate: AdmissionGate, stats: StatsStore, config: &Config) -> Self {
        Self {
            provider,
            gate,
            stats,
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            model: config.translation.model.clone(),
            timeout: Duration::from_secs(config.translation.timeout_secs),
            rate_limit_delay: Duration::from_millis(config.translation.rate_limit_delay_ms),
        }
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the pause after each call
    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    /// Translate `text` with a single backend call.
    ///
    /// The gate permit is held for the request and the following pause, and is
    /// released on success, failure and timeout alike.
    pub async fn call(&self, text: &str) -> Result<String, TranslationError> {
        let _permit = self.gate.acquire().await?;

        let request = TranslationRequest::new(text, &self.source_language, &self.target_language, &self.model);
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.provider.translate(request)).await;

        let result = match outcome {
            Ok(Ok(response)) => {
                let translated = response.translated_text.trim().to_string();
                self.stats.record(text, &translated);
                if translated.is_empty() && !text.trim().is_empty() {
                    Err(TranslationError::EmptyTranslation)
                } else {
                    Ok(translated)
                }
            }
            Ok(Err(e)) => Err(TranslationError::from(e)),
            Err(_) => Err(TranslationError::from(ProviderError::Timeout(self.timeout))),
        };

        match &result {
            Ok(_) => debug!(
                "{} call finished in {:?} ({} chars)",
                self.provider.name(),
                start.elapsed(),
                text.chars().count()
            ),
            Err(e) => warn!("{} call failed after {:?}: {}", self.provider.name(), start.elapsed(), e),
        }

        if !self.rate_limit_delay.is_zero() {
            tokio::time::sleep(self.rate_limit_delay).await;
        }

        result
    }
}
