//! Gemini-style image analysis provider.
//!
//! Sends a profile-derived text prompt plus inline base64 image data to a
//! `generateContent` endpoint and returns the free-text analysis.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::VisionConfig;
use crate::error::LlmError;
use crate::llm::provider::{ImageAnalyze, ImageSource};

const PROVIDER_NAME: &str = "gemini";

/// Gemini `generateContent` vision provider.
pub struct GeminiVisionProvider {
    client: Client,
    config: VisionConfig,
}

impl GeminiVisionProvider {
    /// Create a new provider. Fails if no API key is configured.
    pub fn new(config: VisionConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() {
            return Err(LlmError::NotConfigured {
                provider: PROVIDER_NAME.to_string(),
            });
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("Failed to build reqwest client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Guess the image MIME type from the file extension.
    fn mime_type(path: &str) -> &'static str {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".webp") {
            "image/webp"
        } else {
            "image/jpeg"
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    #[serde(rename_all = "camelCase")]
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl ImageAnalyze for GeminiVisionProvider {
    async fn describe(&self, images: &[ImageSource], context: &str) -> Result<String, LlmError> {
        let mut parts = vec![Part::Text(context.to_string())];
        for image in images {
            let bytes =
                tokio::fs::read(&image.path)
                    .await
                    .map_err(|e| LlmError::RequestFailed {
                        provider: PROVIDER_NAME.to_string(),
                        reason: format!("Failed to read image {}: {}", image.path, e),
                    })?;
            parts.push(Part::InlineData {
                mime_type: Self::mime_type(&image.path).to_string(),
                data: BASE64.encode(&bytes),
            });
        }

        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| LlmError::NotConfigured {
                provider: PROVIDER_NAME.to_string(),
            })?;

        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            if status.as_u16() == 401 || status.as_u16() == 403 {
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

        let parsed: GenerateContentResponse =
            serde_json::from_str(&response_text).map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("JSON parse error: {}", e),
            })?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: "response contained no text candidates".to_string(),
            });
        }

        Ok(text)
    }
}
