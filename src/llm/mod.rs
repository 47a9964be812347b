//! Collaborator integrations for text generation and image analysis.
//!
//! The pipelines only ever see the [`TextGenerate`] and [`ImageAnalyze`]
//! traits; concrete providers are wired up once at startup.

mod gemini;
mod openai;
mod provider;
pub mod retry;

pub use gemini::GeminiVisionProvider;
pub use openai::OpenAiTextProvider;
pub use provider::{GenerateRequest, ImageAnalyze, ImageSource, TextGenerate};
pub use retry::RetryPolicy;

use std::sync::Arc;

use crate::config::{LlmConfig, VisionConfig};
use crate::error::LlmError;

/// Truncate an error body to at most `max` bytes without splitting a
/// character. Provider error bodies can carry arbitrary UTF-8.
pub(crate) fn truncate_body(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Create the text-generation collaborator from configuration.
pub fn create_text_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerate>, LlmError> {
    let provider = OpenAiTextProvider::new(config.clone())?;
    tracing::info!(
        "Using OpenAI-compatible text generator (base_url: {}, model: {})",
        config.base_url,
        config.model
    );
    Ok(Arc::new(provider))
}

/// Create the image-analysis collaborator, if one is configured.
///
/// Returns `None` when no API key is set; the hobby pipeline then skips its
/// photo step rather than failing.
pub fn create_image_analyzer(
    config: &VisionConfig,
) -> Result<Option<Arc<dyn ImageAnalyze>>, LlmError> {
    if !config.is_enabled() {
        tracing::info!("No vision API key configured; photo analysis disabled");
        return Ok(None);
    }
    let provider = GeminiVisionProvider::new(config.clone())?;
    tracing::info!(
        "Using Gemini image analyzer (base_url: {}, model: {})",
        config.base_url,
        config.model
    );
    Ok(Some(Arc::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::truncate_body;

    #[test]
    fn error_body_truncation_respects_char_boundaries() {
        // A 300-byte body of 3-byte characters; byte 200 falls mid-character.
        let body = "한".repeat(100);
        let truncated = truncate_body(&body, 200);
        assert!(truncated.len() <= 200);
        assert_eq!(truncated.len() % 3, 0);
        assert!(body.starts_with(truncated));
    }

    #[test]
    fn short_bodies_pass_through_untouched() {
        assert_eq!(truncate_body("rate limited", 200), "rate limited");
        assert_eq!(truncate_body("", 200), "");
    }

    #[test]
    fn ascii_bodies_truncate_at_the_limit() {
        let body = "x".repeat(500);
        assert_eq!(truncate_body(&body, 200).len(), 200);
    }
}
