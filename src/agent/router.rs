//! Request classification into a closed set of task labels.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::agent::{prompts, StepBudget};
use crate::config::{AgentConfig, RouterStrategy};
use crate::error::RouteError;
use crate::llm::{GenerateRequest, TextGenerate};
use crate::llm::retry::RetryPolicy;

/// The closed set of task categories. Dispatch over these is exhaustive;
/// there is no fallthrough label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    MeetingMatching,
    HobbyRecommendation,
    GeneralSearch,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [
        TaskKind::MeetingMatching,
        TaskKind::HobbyRecommendation,
        TaskKind::GeneralSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::MeetingMatching => "meeting_matching",
            TaskKind::HobbyRecommendation => "hobby_recommendation",
            TaskKind::GeneralSearch => "general_search",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meeting_matching" => Ok(TaskKind::MeetingMatching),
            "hobby_recommendation" => Ok(TaskKind::HobbyRecommendation),
            "general_search" => Ok(TaskKind::GeneralSearch),
            other => Err(RouteError::Unroutable {
                label: other.to_string(),
            }),
        }
    }
}

/// Classifies an incoming payload into a [`TaskKind`].
///
/// The structural strategy inspects payload keys and is fully deterministic.
/// The LLM strategy asks the text generator for a closed-label reply and
/// normalizes it before validation; an unrecognized label is an error, not
/// a silent default.
pub struct Router {
    strategy: RouterStrategy,
    llm: Arc<dyn TextGenerate>,
    retry: RetryPolicy,
}

impl Router {
    pub fn new(config: &AgentConfig, llm: Arc<dyn TextGenerate>) -> Self {
        Self {
            strategy: config.router_strategy,
            llm,
            retry: RetryPolicy::new(config.retry_attempts, config.retry_backoff),
        }
    }

    pub async fn classify(
        &self,
        payload: &Value,
        budget: &StepBudget,
    ) -> Result<TaskKind, crate::error::Error> {
        let kind = match self.strategy {
            RouterStrategy::Structural => Self::classify_structural(payload)?,
            RouterStrategy::Llm => self.classify_llm(payload, budget).await?,
        };
        tracing::debug!("Routed request to {kind}");
        Ok(kind)
    }

    /// Deterministic classification by structural markers.
    fn classify_structural(payload: &Value) -> Result<TaskKind, RouteError> {
        let has = |key: &str| payload.get(key).is_some();

        if has("survey") || has("hobby_info") {
            return Ok(TaskKind::HobbyRecommendation);
        }
        if has("title") && has("description") {
            return Ok(TaskKind::MeetingMatching);
        }
        if has("query") {
            return Ok(TaskKind::GeneralSearch);
        }
        Err(RouteError::NoMarkers)
    }

    async fn classify_llm(
        &self,
        payload: &Value,
        budget: &StepBudget,
    ) -> Result<TaskKind, crate::error::Error> {
        budget.consume()?;

        let labels: Vec<&str> = TaskKind::ALL.iter().map(|k| k.as_str()).collect();
        let preview = preview_payload(payload);
        let prompt = prompts::route(&preview, &labels);

        let raw = self
            .retry
            .run("router classification", || {
                self.llm
                    .complete(GenerateRequest::new(prompt.clone()).with_temperature(0.0))
            })
            .await
            .map_err(RouteError::Llm)?;

        Ok(normalize_label(&raw).parse()?)
    }
}

/// Trim, lowercase and strip quoting characters from a raw label reply.
fn normalize_label(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '.'))
        .trim()
        .to_lowercase()
}

/// Render a compact payload preview for the classification prompt, with
/// long string values truncated.
fn preview_payload(payload: &Value) -> String {
    const MAX_LEN: usize = 500;
    let mut preview = payload.to_string();
    if preview.len() > MAX_LEN {
        let mut end = MAX_LEN;
        while !preview.is_char_boundary(end) {
            end -= 1;
        }
        preview.truncate(end);
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn title_and_description_route_to_meeting_matching() {
        for _ in 0..10 {
            let payload = json!({"title": "Board games night", "description": "Weekly games"});
            let kind = Router::classify_structural(&payload).unwrap();
            assert_eq!(kind, TaskKind::MeetingMatching);
        }
    }

    #[test]
    fn survey_key_routes_to_hobby_recommendation() {
        let payload = json!({"survey": {"1": 3}, "title": "ignored"});
        let kind = Router::classify_structural(&payload).unwrap();
        assert_eq!(kind, TaskKind::HobbyRecommendation);
    }

    #[test]
    fn bare_query_routes_to_general_search() {
        let payload = json!({"query": "what is a good beginner telescope"});
        let kind = Router::classify_structural(&payload).unwrap();
        assert_eq!(kind, TaskKind::GeneralSearch);
    }

    #[test]
    fn unmarked_payload_is_unroutable() {
        let payload = json!({"foo": 1});
        let err = Router::classify_structural(&payload).unwrap_err();
        assert!(matches!(err, RouteError::NoMarkers));
    }

    #[test]
    fn label_normalization_strips_quotes_and_case() {
        assert_eq!(normalize_label("  \"Meeting_Matching\" \n"), "meeting_matching");
        assert_eq!(normalize_label("`general_search`."), "general_search");
    }

    #[test]
    fn unknown_label_is_an_error_not_a_default() {
        let err: Result<TaskKind, _> = normalize_label("poetry_review").parse();
        assert!(matches!(err, Err(RouteError::Unroutable { .. })));
    }
}
