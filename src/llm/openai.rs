//! OpenAI-compatible text generation provider.
//!
//! Connects to any endpoint that implements the OpenAI Chat Completions API,
//! including local models and proxy gateways.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::provider::{GenerateRequest, TextGenerate};

/// Provider name constant to avoid magic strings.
const PROVIDER_NAME: &str = "openai_compatible";

/// OpenAI-compatible Chat Completions provider.
pub struct OpenAiTextProvider {
    client: Client,
    config: LlmConfig,
}

impl OpenAiTextProvider {
    /// Create a new provider from configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("Failed to build reqwest client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    /// Construct API URL for a given path. Strips trailing `/v1` from the
    /// base URL to avoid double `/v1` issues.
    fn api_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        format!("{}/v1/{}", base, path.trim_start_matches('/'))
    }

    /// Add Authorization header if an API key is configured.
    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key.as_ref() {
            Some(key) => request.header("Authorization", format!("Bearer {}", key.expose_secret())),
            None => request,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextGenerate for OpenAiTextProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, req: GenerateRequest) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = req.system {
            messages.push(ApiMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ApiMessage {
            role: "user",
            content: req.prompt,
        });

        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        };

        let url = self.api_url("chat/completions");
        tracing::debug!("Sending completion request to {}", url);

        let request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        let request = self.add_auth_header(request);

        let response = request.send().await?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(LlmError::AuthFailed {
                    provider: PROVIDER_NAME.to_string(),
                });
            }
            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited {
                    provider: PROVIDER_NAME.to_string(),
                    retry_after: None,
                });
            }
            return Err(LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!(
                    "HTTP {}: {}",
                    status,
                    crate::llm::truncate_body(&response_text, 200)
                ),
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&response_text).map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: format!(
                    "JSON parse error: {}. Raw: {}",
                    e,
                    crate::llm::truncate_body(&response_text, 200)
                ),
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: "response contained no choices".to_string(),
            })?;

        Ok(content)
    }
}
