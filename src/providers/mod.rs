/*!
 * Translation backend clients.
 *
 * - `tilmoch`: HTTP client for the Tilmoch translation API
 * - `mock`: configurable in-process backend used by tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Body of one translation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationRequest {
    /// Text to translate
    pub text: String,
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
    /// Backend model name
    pub model: String,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            model: model.into(),
        }
    }
}

/// Answer of one translation call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranslationResponse {
    pub translated_text: String,
}

/// Common trait for translation backends
///
/// The backend is a black box: it receives one text and returns one text. It
/// is not trusted to preserve separators, so callers validate what comes back.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate a single request
    async fn translate(&self, request: TranslationRequest) -> Result<TranslationResponse, ProviderError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

pub mod mock;
pub mod tilmoch;
