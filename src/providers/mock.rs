/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock backend that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds, tagging every joined part
 * - `MockProvider::merging_separators()` - Succeeds but drops the separators
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::fail_on(..)` - Fails only for texts containing a substring
 * - `MockProvider::slow(..)` - Succeeds after a delay
 * - `MockProvider::intermittent(..)` - Fails every Nth request
 *
 * Every request is counted and logged, and the highest number of requests in
 * flight at once is tracked.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{Provider, TranslationRequest, TranslationResponse};

/// Separator as it appears between joined texts
const SENTINEL: &str = "§§§";

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Succeeds but joins all parts without separators
    MergesSeparators,
    /// Always fails with an error
    Failing,
    /// Fails when the request text contains the given substring
    FailOn(String),
    /// Returns an empty translation
    Empty,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Simulates slow response (for timeout and concurrency testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of requests received, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Texts of all requests received, in arrival order
    requests: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    /// Custom translation of a single part (optional)
    custom_response: Option<fn(&str, &TranslationRequest) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that does not preserve separators
    pub fn merging_separators() -> Self {
        Self::new(MockBehavior::MergesSeparators)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that fails on texts containing `needle`
    pub fn fail_on(needle: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailOn(needle.into()))
    }

    /// Create a mock that returns empty translations
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Create a mock that answers after `delay_ms` milliseconds
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom translation for each joined part
    pub fn with_custom_response(mut self, generator: fn(&str, &TranslationRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// The translation the working mock produces for a single text
    pub fn expected_translation(text: &str, target_lang: &str) -> String {
        format!("[{}] {}", target_lang, text.trim())
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts of all requests received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Highest number of requests that were being served at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn translate_part(&self, part: &str, request: &TranslationRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(part.trim(), request),
            None => Self::expected_translation(part, &request.target_lang),
        }
    }

    fn translate_joined(&self, request: &TranslationRequest) -> String {
        request
            .text
            .split(SENTINEL)
            .map(|part| self.translate_part(part, request))
            .collect::<Vec<_>>()
            .join(&format!(" {} ", SENTINEL))
    }

    async fn respond(&self, count: usize, request: &TranslationRequest) -> Result<String, ProviderError> {
        match &self.behavior {
            MockBehavior::Working => Ok(self.translate_joined(request)),

            MockBehavior::MergesSeparators => Ok(request
                .text
                .split(SENTINEL)
                .map(|part| self.translate_part(part, request))
                .collect::<Vec<_>>()
                .join(" ")),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::FailOn(needle) => {
                if request.text.contains(needle.as_str()) {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated failure for text containing '{}'", needle),
                        status_code: 502,
                    })
                } else {
                    Ok(self.translate_joined(request))
                }
            }

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.translate_joined(request))
                }
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(self.translate_joined(request))
            }
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn translate(&self, request: TranslationRequest) -> Result<TranslationResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.text.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Yield so concurrent callers overlap even without a delay
        tokio::task::yield_now().await;
        let result = self.respond(count, &request).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.map(|translated_text| TranslationResponse { translated_text })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
