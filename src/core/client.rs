//! Async translation client for the public translate endpoint

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::TranslationRequest;

/// A translation backend: text in, translated text out
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a single request
    async fn translate(&self, request: &TranslationRequest) -> Result<String>;
}

/// HTTP client for the `translate_a/single` endpoint.
///
/// One attempt per request; failures are reported, never retried.
#[derive(Debug, Clone)]
pub struct AsyncTranslator {
    client: reqwest::Client,
    config: Arc<TranslatorConfig>,
}

impl AsyncTranslator {
    /// Create a new async translator
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Send actual HTTP request
    async fn send_request(&self, request: &TranslationRequest) -> Result<String> {
        let response = self
            .client
            .get(&self.config.api_endpoint)
            .query(&[
                ("client", self.config.client_id.as_str()),
                ("sl", request.source_lang.as_str()),
                ("tl", request.target_lang.as_str()),
                ("dt", "t"),
                ("q", request.text.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslationError::TimeoutError
                } else {
                    TranslationError::NetworkError {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslationError::InvalidResponseError {
                message: e.to_string(),
            })?;

        Ok(extract_translation(&json))
    }
}

#[async_trait]
impl Translator for AsyncTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String> {
        debug!(
            "Translating {} chars ({} -> {})",
            request.text.chars().count(),
            request.source_lang,
            request.target_lang
        );

        let result = self.send_request(request).await;
        if let Err(e) = &result {
            warn!("Translation request failed: {}", e);
        }
        result
    }
}

/// Join the translated segments of a `translate_a/single` payload.
///
/// The payload is `[[["seg", "orig", ...], ...], ...]`. Anything that does
/// not match that shape contributes nothing, so a malformed body yields "".
pub fn extract_translation(json: &serde_json::Value) -> String {
    json.get(0)
        .and_then(|segments| segments.as_array())
        .map(|segments| {
            segments
                .iter()
                .filter_map(|segment| segment.get(0).and_then(|s| s.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}
