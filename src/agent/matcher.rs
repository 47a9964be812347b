//! The meeting matcher: an iterative retrieve-generate-critique loop.
//!
//! The loop runs as an explicit state machine with a bounded rewrite count.
//! An exhausted loop returns the canonical empty answer instead of a
//! low-confidence one. Collaborator failures degrade inside the loop
//! (empty candidates, unhelpful verdict) rather than aborting the request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::{prompts, StepBudget};
use crate::config::{AgentConfig, HelpfulnessStrategy};
use crate::error::ValidationError;
use crate::llm::retry::RetryPolicy;
use crate::llm::{GenerateRequest, TextGenerate};
use crate::search::{Document, SimilaritySearch};

/// A meeting the user wants to create, parsed from the request payload.
#[derive(Debug, Clone)]
pub struct MeetingRequest {
    pub title: String,
    pub description: String,
    pub time: Option<String>,
    pub location: Option<String>,
}

impl MeetingRequest {
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let field = |key: &str| -> Result<String, ValidationError> {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ValidationError::MissingField {
                    field: key.to_string(),
                })
        };
        let optional = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            title: field("title")?,
            description: field("description")?,
            time: optional("time"),
            location: optional("location"),
        })
    }

    /// The initial retrieval query: structured fields joined into one line.
    pub fn search_query(&self) -> String {
        let mut parts = vec![self.title.as_str(), self.description.as_str()];
        if let Some(time) = &self.time {
            parts.push(time);
        }
        if let Some(location) = &self.location {
            parts.push(location);
        }
        parts.join(" ")
    }

    fn summary(&self) -> String {
        let mut s = format!("Title: {}\nDescription: {}", self.title, self.description);
        if let Some(time) = &self.time {
            s.push_str(&format!("\nTime: {time}"));
        }
        if let Some(location) = &self.location {
            s.push_str(&format!("\nLocation: {location}"));
        }
        s
    }
}

/// Reference to one recommended existing meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// The structured answer of the matcher loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAnswer {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<MatchRef>,
}

impl Default for MatchAnswer {
    fn default() -> Self {
        Self::empty()
    }
}

impl MatchAnswer {
    /// The canonical empty answer returned when the loop gives up.
    pub fn empty() -> Self {
        Self {
            summary: String::new(),
            recommendations: Vec::new(),
        }
    }

    /// Code-based helpfulness: any recommendation at all counts.
    pub fn is_helpful(&self) -> bool {
        !self.recommendations.is_empty()
    }
}

/// Loop states. Every transition consumes one step of the global budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    PrepareQuery,
    Retrieve,
    Generate,
    CheckHelpfulness,
    RewriteQuery,
    Terminate,
}

/// Working memory for one matcher invocation. Owned exclusively by the loop
/// and discarded at termination.
#[derive(Debug, Default)]
struct RequestState {
    query: String,
    candidates: Vec<Document>,
    answer: MatchAnswer,
    helpful: bool,
    rewrites: u32,
}

/// The self-critique retrieval loop for meeting matching.
pub struct MeetingMatcher {
    llm: Arc<dyn TextGenerate>,
    search: Arc<dyn SimilaritySearch>,
    config: AgentConfig,
    retry: RetryPolicy,
}

impl MeetingMatcher {
    pub fn new(
        config: &AgentConfig,
        llm: Arc<dyn TextGenerate>,
        search: Arc<dyn SimilaritySearch>,
    ) -> Self {
        Self {
            llm,
            search,
            config: config.clone(),
            retry: RetryPolicy::new(config.retry_attempts, config.retry_backoff),
        }
    }

    /// Run the loop to completion. Always yields a well-formed answer; the
    /// only fallback is the canonical empty one.
    pub async fn run(&self, request: &MeetingRequest, budget: &StepBudget) -> MatchAnswer {
        let mut state = RequestState::default();
        let mut step = Step::PrepareQuery;

        loop {
            if budget.consume().is_err() {
                tracing::warn!(
                    "Matcher hit the global step ceiling at {step:?}; returning empty answer"
                );
                return MatchAnswer::empty();
            }

            step = match step {
                Step::PrepareQuery => {
                    state.query = request.search_query();
                    Step::Retrieve
                }
                Step::Retrieve => {
                    state.candidates = self.retrieve(&state.query).await;
                    Step::Generate
                }
                Step::Generate => {
                    state.answer = self.generate(request, &state.candidates).await;
                    Step::CheckHelpfulness
                }
                Step::CheckHelpfulness => {
                    state.helpful = self.check_helpfulness(request, &state.answer).await;
                    if state.helpful {
                        Step::Terminate
                    } else if state.rewrites >= self.config.max_rewrites {
                        tracing::debug!(
                            "Rewrite bound of {} exhausted; returning empty answer",
                            self.config.max_rewrites
                        );
                        state.answer = MatchAnswer::empty();
                        Step::Terminate
                    } else {
                        Step::RewriteQuery
                    }
                }
                Step::RewriteQuery => {
                    state.query = self.rewrite(&state.query).await;
                    state.rewrites += 1;
                    Step::Retrieve
                }
                Step::Terminate => return state.answer,
            };
        }
    }

    /// Retrieve candidates for the current query. A failed search degrades
    /// to an empty candidate set.
    async fn retrieve(&self, query: &str) -> Vec<Document> {
        let result = self
            .retry
            .run("candidate retrieval", || {
                self.search.query(
                    query,
                    self.config.score_threshold,
                    self.config.top_k,
                )
            })
            .await;
        match result {
            Ok(docs) => {
                tracing::debug!("Retrieved {} candidates", docs.len());
                docs
            }
            Err(e) => {
                tracing::warn!("Retrieval failed, continuing with no candidates: {e}");
                Vec::new()
            }
        }
    }

    /// Generate the structured answer. With no candidates there is nothing
    /// to recommend, so the answer is empty without a generation call. A
    /// generation or parse failure also degrades to the empty answer, which
    /// the code-based check then treats as unhelpful.
    async fn generate(&self, request: &MeetingRequest, candidates: &[Document]) -> MatchAnswer {
        if candidates.is_empty() {
            return MatchAnswer::empty();
        }

        let prompt = prompts::generate_answer(&request.summary(), candidates);
        let result = self
            .retry
            .run("answer generation", || {
                self.llm.complete(
                    GenerateRequest::new(prompt.clone())
                        .with_system(prompts::GENERATE_SYSTEM)
                        .with_temperature(0.2),
                )
            })
            .await;

        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Answer generation failed: {e}");
                return MatchAnswer::empty();
            }
        };

        match parse_answer(&raw) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Generated answer was not valid JSON: {e}");
                MatchAnswer::empty()
            }
        }
    }

    /// Judge the answer. The code-based strategy is deterministic; the LLM
    /// judge accepts only the exact word "helpful" after normalization, and
    /// a failed judge call counts as unhelpful.
    async fn check_helpfulness(&self, request: &MeetingRequest, answer: &MatchAnswer) -> bool {
        match self.config.helpfulness {
            HelpfulnessStrategy::CodeBased => answer.is_helpful(),
            HelpfulnessStrategy::LlmJudge => {
                if !answer.is_helpful() {
                    return false;
                }
                let answer_json = match serde_json::to_string(answer) {
                    Ok(json) => json,
                    Err(_) => return false,
                };
                let prompt = prompts::judge_helpfulness(&request.summary(), &answer_json);
                let result = self
                    .retry
                    .run("helpfulness judgment", || {
                        self.llm.complete(
                            GenerateRequest::new(prompt.clone())
                                .with_temperature(0.0)
                                .with_max_tokens(8),
                        )
                    })
                    .await;
                match result {
                    Ok(raw) => raw.trim().to_lowercase() == "helpful",
                    Err(e) => {
                        tracing::warn!("Helpfulness judgment failed, treating as unhelpful: {e}");
                        false
                    }
                }
            }
        }
    }

    /// Ask for a different query. On failure the current query is kept; the
    /// rewrite counter still advances so the loop stays bounded.
    async fn rewrite(&self, query: &str) -> String {
        let prompt = prompts::rewrite_query(query);
        let result = self
            .retry
            .run("query rewrite", || {
                self.llm
                    .complete(GenerateRequest::new(prompt.clone()).with_temperature(0.7))
            })
            .await;
        match result {
            Ok(rewritten) => {
                let rewritten = rewritten.trim().trim_matches('"').to_string();
                if rewritten.is_empty() {
                    query.to_string()
                } else {
                    rewritten
                }
            }
            Err(e) => {
                tracing::warn!("Query rewrite failed, reusing previous query: {e}");
                query.to_string()
            }
        }
    }
}

/// Parse a strictly-typed JSON answer out of the raw completion, tolerating
/// markdown code fences around it.
fn parse_answer(raw: &str) -> Result<MatchAnswer, serde_json::Error> {
    serde_json::from_str(strip_code_fences(raw))
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn request_requires_title_and_description() {
        let err = MeetingRequest::from_value(&json!({"title": "Chess night"})).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { ref field } if field == "description"));
    }

    #[test]
    fn search_query_joins_present_fields() {
        let request = MeetingRequest::from_value(&json!({
            "title": "Chess night",
            "description": "Casual blitz games",
            "location": "Mapo-gu",
        }))
        .unwrap();
        assert_eq!(request.search_query(), "Chess night Casual blitz games Mapo-gu");
    }

    #[test]
    fn parse_answer_accepts_fenced_json() {
        let raw = "```json\n{\"summary\": \"ok\", \"recommendations\": [{\"id\": \"m1\", \"title\": \"t\"}]}\n```";
        let answer = parse_answer(raw).unwrap();
        assert_eq!(answer.summary, "ok");
        assert_eq!(answer.recommendations.len(), 1);
    }

    #[test]
    fn parse_answer_defaults_missing_fields() {
        let answer = parse_answer("{\"summary\": \"only a summary\"}").unwrap();
        assert!(answer.recommendations.is_empty());
    }

    #[test]
    fn parse_answer_rejects_prose() {
        assert!(parse_answer("Sure! Here are some meetings you might like.").is_err());
    }

    #[test]
    fn canonical_empty_answer_shape() {
        let json = serde_json::to_string(&MatchAnswer::empty()).unwrap();
        assert_eq!(json, r#"{"summary":"","recommendations":[]}"#);
    }
}
