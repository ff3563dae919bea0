/*!
 * Client for the Tilmoch translation API.
 *
 * `POST {endpoint}` with `{text, source_lang, target_lang, model}` and the key
 * in the `Authorization` header; the answer carries `translated_text`.
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Provider, TranslationRequest, TranslationResponse};

/// Tilmoch client for the translation endpoint
#[derive(Debug, Clone)]
pub struct Tilmoch {
    /// HTTP client for API requests
    client: Client,
    /// Credential sent verbatim in the `Authorization` header
    api_key: String,
    /// Full URL of the translate endpoint
    endpoint: String,
    timeout: Duration,
}

impl Tilmoch {
    /// Create a new client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Provider for Tilmoch {
    async fn translate(&self, request: TranslationRequest) -> Result<TranslationResponse, ProviderError> {
        debug!("Tilmoch request: {} chars", request.text.chars().count());

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout)
                } else if e.is_connect() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Tilmoch API error ({}): {}", status, message);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
                _ => ProviderError::ApiError {
                    status_code: status.as_u16(),
                    message,
                },
            });
        }

        response
            .json::<TranslationResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    fn name(&self) -> &str {
        "tilmoch"
    }
}
