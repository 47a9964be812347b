//! Collaborator traits for text generation and image analysis.

use async_trait::async_trait;

use crate::error::LlmError;

/// Request for a single-shot text completion.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Optional system framing for the completion.
    pub system: Option<String>,
    /// The templated prompt body.
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    /// Create a request with just a prompt body.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the system framing.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Trait for single-shot text generation.
///
/// Used for query preparation, answer generation, helpfulness judgment,
/// query rewriting, profile summarization and final message composition.
/// Judgment prompts must request a constrained output space; callers parse
/// the reply strictly and treat anything unexpected as a negative verdict.
#[async_trait]
pub trait TextGenerate: Send + Sync {
    /// The model name this generator targets.
    fn model_name(&self) -> &str;

    /// Complete a templated prompt into free text.
    async fn complete(&self, request: GenerateRequest) -> Result<String, LlmError>;
}

/// An image handed to the vision collaborator.
#[derive(Debug, Clone)]
pub struct ImageSource {
    /// Filesystem path to the image.
    pub path: String,
}

impl ImageSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Trait for free-text image analysis.
///
/// Optional collaborator: pipelines must degrade gracefully when no images
/// are supplied or no analyzer is configured.
#[async_trait]
pub trait ImageAnalyze: Send + Sync {
    /// Describe a set of images against a profile-derived context prompt.
    async fn describe(&self, images: &[ImageSource], context: &str) -> Result<String, LlmError>;
}
