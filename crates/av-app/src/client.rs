//! Client for the external image-generation service.
//!
//! One synchronous HTTP call per request. Retry policy, if any, belongs
//! to the caller.

mod schemas;

use std::fmt;
use std::time::Duration;

use serde_json::Value;

use av_core::prompt::GenerationRequest;

use crate::error::GenerateError;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// API key held in memory for the duration of a run.
///
/// Sent per-invocation as a request header, never persisted. `Debug` is
/// redacted so the key cannot leak through error or log formatting.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(redacted)")
    }
}

/// The seam between the render pipeline and whatever produces images.
pub trait ImageBackend {
    fn generate(&self, request: &GenerationRequest, api_key: &ApiKey)
    -> Result<Vec<u8>, GenerateError>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Generation endpoint with a `{model}` placeholder.
    pub generate_endpoint: String,
    /// Model-listing endpoint.
    pub models_endpoint: String,
    /// Applies to the whole request/response cycle of each call.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            generate_endpoint:
                "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
                    .to_string(),
            models_endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Gemini-backed [`ImageBackend`].
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    config: ClientConfig,
}

impl GeminiClient {
    pub fn new(config: ClientConfig) -> Result<Self, GenerateError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerateError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Raw model listing from the provider, for the caller to inspect.
    pub fn list_models(&self, api_key: &ApiKey) -> Result<Value, GenerateError> {
        let response = self
            .http
            .get(&self.config.models_endpoint)
            .header(API_KEY_HEADER, api_key.reveal())
            .send()
            .map_err(|e| GenerateError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(schemas::classify_http_failure(status.as_u16(), &body));
        }
        response
            .json()
            .map_err(|e| GenerateError::ResponseFormat(format!("model listing is not valid JSON: {e}")))
    }
}

impl ImageBackend for GeminiClient {
    fn generate(
        &self,
        request: &GenerationRequest,
        api_key: &ApiKey,
    ) -> Result<Vec<u8>, GenerateError> {
        let url = self.config.generate_endpoint.replace("{model}", &request.model_id);
        log::debug!(
            "posting generation request to model {} ({} reference part(s))",
            request.model_id,
            request.references.len()
        );

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key.reveal())
            .json(&schemas::generate_content_body(request))
            .send()
            .map_err(|e| GenerateError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(schemas::classify_http_failure(status.as_u16(), &body));
        }

        let value: Value = response
            .json()
            .map_err(|e| GenerateError::ResponseFormat(format!("response is not valid JSON: {e}")))?;
        schemas::extract_image_bytes(&value)
    }
}
