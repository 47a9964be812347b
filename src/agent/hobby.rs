//! The hobby recommendation pipeline: survey normalization, optional photo
//! analysis, deterministic scoring, then message composition.
//!
//! Only the catalog is load-bearing: a failed catalog load aborts the
//! request. Every LLM step degrades to a deterministic rendering instead.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::agent::{prompts, StepBudget};
use crate::catalog::CatalogStore;
use crate::config::AgentConfig;
use crate::error::{Error, ValidationError};
use crate::llm::retry::RetryPolicy;
use crate::llm::{GenerateRequest, ImageAnalyze, ImageSource, TextGenerate};
use crate::profile::{interest_vector, normalize_profile, NormalizedProfile, SurveyResponses};
use crate::scoring::{Recommendation, ScoringContext, ScoringEngine};

/// A hobby recommendation request, parsed from the payload.
///
/// The survey may sit at the top level or nested under `hobby_info`.
#[derive(Debug, Clone)]
pub struct HobbyRequest {
    pub survey: SurveyResponses,
    pub context: ScoringContext,
    pub photos: Vec<ImageSource>,
}

impl HobbyRequest {
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let root = value.get("hobby_info").unwrap_or(value);
        let survey_value = root
            .get("survey")
            .ok_or_else(|| ValidationError::MissingField {
                field: "survey".to_string(),
            })?;
        let survey = SurveyResponses::from_value(survey_value)?;

        let context = root
            .get("user_context")
            .map(ScoringContext::from_value)
            .unwrap_or_default();

        let photos = root
            .get("photos")
            .and_then(Value::as_array)
            .map(|paths| {
                paths
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ImageSource::new)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            survey,
            context,
            photos,
        })
    }
}

/// The pipeline's result: the user-facing message plus the ranked list it
/// was composed from.
#[derive(Debug, Clone, Serialize)]
pub struct HobbyAnswer {
    pub message: String,
    pub recommendations: Vec<Recommendation>,
}

pub struct HobbyPipeline {
    llm: Arc<dyn TextGenerate>,
    vision: Option<Arc<dyn ImageAnalyze>>,
    catalog: Arc<dyn CatalogStore>,
    engine: ScoringEngine,
    config: AgentConfig,
    retry: RetryPolicy,
}

impl HobbyPipeline {
    pub fn new(
        config: &AgentConfig,
        llm: Arc<dyn TextGenerate>,
        vision: Option<Arc<dyn ImageAnalyze>>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            llm,
            vision,
            catalog,
            engine: ScoringEngine::new(),
            config: config.clone(),
            retry: RetryPolicy::new(config.retry_attempts, config.retry_backoff),
        }
    }

    pub async fn run(
        &self,
        request: &HobbyRequest,
        budget: &StepBudget,
    ) -> Result<HobbyAnswer, Error> {
        let profile = normalize_profile(&request.survey);
        let interests = interest_vector(&request.survey);

        let summary = self.summarize_profile(&profile, budget).await;
        let photo_insight = self.analyze_photos(&request.photos, &summary, budget).await;

        let catalog = self.catalog.load()?;
        let recommendations = self.engine.recommend(
            &interests,
            &catalog,
            &request.context,
            self.config.top_k_hobbies,
            self.config.rescale_scores,
        );
        tracing::debug!("Scored {} hobby recommendations", recommendations.len());

        let message = self
            .compose_message(&summary, photo_insight.as_deref(), &recommendations, budget)
            .await;

        Ok(HobbyAnswer {
            message,
            recommendations,
        })
    }

    /// Summarize the normalized profile, degrading to a fixed line when the
    /// generator is unavailable or the step budget is spent.
    async fn summarize_profile(&self, profile: &NormalizedProfile, budget: &StepBudget) -> String {
        let fallback = || "Profile derived from the survey responses.".to_string();

        if budget.consume().is_err() {
            return fallback();
        }
        let profile_json = match serde_json::to_string_pretty(profile) {
            Ok(json) => json,
            Err(_) => return fallback(),
        };
        let prompt = prompts::profile_summary(&profile_json);
        let result = self
            .retry
            .run("profile summarization", || {
                self.llm
                    .complete(GenerateRequest::new(prompt.clone()).with_temperature(0.3))
            })
            .await;
        match result {
            Ok(summary) => summary.trim().to_string(),
            Err(e) => {
                tracing::warn!("Profile summarization failed, using fallback: {e}");
                fallback()
            }
        }
    }

    /// Run photo analysis when a vision collaborator is configured and the
    /// request carries photos. Any failure degrades to no insight.
    async fn analyze_photos(
        &self,
        photos: &[ImageSource],
        profile_summary: &str,
        budget: &StepBudget,
    ) -> Option<String> {
        let vision = self.vision.as_ref()?;
        if photos.is_empty() {
            return None;
        }
        if budget.consume().is_err() {
            return None;
        }

        let context = prompts::photo_context(profile_summary);
        let result = self
            .retry
            .run("photo analysis", || vision.describe(photos, &context))
            .await;
        match result {
            Ok(insight) => Some(insight.trim().to_string()),
            Err(e) => {
                tracing::warn!("Photo analysis failed, continuing without it: {e}");
                None
            }
        }
    }

    /// Compose the final message, degrading to a deterministic rendering of
    /// the ranked list when the generator is unavailable.
    async fn compose_message(
        &self,
        profile_summary: &str,
        photo_insight: Option<&str>,
        recommendations: &[Recommendation],
        budget: &StepBudget,
    ) -> String {
        if recommendations.is_empty() {
            return "No hobby in the catalog fits the given constraints.".to_string();
        }
        if budget.consume().is_err() {
            return render_recommendations(recommendations);
        }

        let recs_json = match serde_json::to_string_pretty(recommendations) {
            Ok(json) => json,
            Err(_) => return render_recommendations(recommendations),
        };
        let prompt = prompts::hobby_message(profile_summary, photo_insight, &recs_json);
        let result = self
            .retry
            .run("hobby message composition", || {
                self.llm
                    .complete(GenerateRequest::new(prompt.clone()).with_temperature(0.6))
            })
            .await;
        match result {
            Ok(message) => message.trim().to_string(),
            Err(e) => {
                tracing::warn!("Message composition failed, using plain rendering: {e}");
                render_recommendations(recommendations)
            }
        }
    }
}

/// Plain-text rendering of the ranked list, used when no generator is
/// available.
fn render_recommendations(recommendations: &[Recommendation]) -> String {
    let mut out = String::from("Recommended hobbies:\n");
    for rec in recommendations {
        out.push_str(&format!(
            "{}. {} ({})\n",
            rec.rank + 1,
            rec.name,
            rec.reason
        ));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn request_requires_a_survey() {
        let err = HobbyRequest::from_value(&json!({"user_context": {}})).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { ref field } if field == "survey"));
    }

    #[test]
    fn survey_can_nest_under_hobby_info() {
        let request = HobbyRequest::from_value(&json!({
            "hobby_info": {
                "survey": {"1": 3, "2": 2},
                "user_context": {"monthly_budget": 80.0},
                "photos": ["/tmp/a.jpg"],
            }
        }))
        .unwrap();
        assert_eq!(request.survey.get("1"), Some(3));
        assert_eq!(request.context.monthly_budget, Some(80.0));
        assert_eq!(request.photos.len(), 1);
    }

    #[test]
    fn absent_context_disables_all_filters() {
        let request = HobbyRequest::from_value(&json!({"survey": {"1": 1}})).unwrap();
        assert_eq!(request.context.monthly_budget, None);
        assert_eq!(request.context.offline_ok, None);
    }

    #[test]
    fn plain_rendering_lists_every_item() {
        let recs = vec![
            Recommendation {
                rank: 0,
                hobby_id: "h1".to_string(),
                name: "Pottery".to_string(),
                short_desc: String::new(),
                avg_cost_month: None,
                avg_session_time_hours: None,
                tags: vec![],
                score_base: 0.8,
                score_total: 0.9,
                score_scaled: Some(100.0),
                reason: "growth & mastery".to_string(),
            },
            Recommendation {
                rank: 1,
                hobby_id: "h2".to_string(),
                name: "Sketching".to_string(),
                short_desc: String::new(),
                avg_cost_month: None,
                avg_session_time_hours: None,
                tags: vec![],
                score_base: 0.7,
                score_total: 0.7,
                score_scaled: Some(78.0),
                reason: "new experiences".to_string(),
            },
        ];
        let text = render_recommendations(&recs);
        assert_eq!(
            text,
            "Recommended hobbies:\n1. Pottery (growth & mastery)\n2. Sketching (new experiences)"
        );
    }
}
