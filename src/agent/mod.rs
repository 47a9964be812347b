//! The agent orchestrator: routing, pipelines and the global step ceiling.

mod hobby;
mod matcher;
pub mod prompts;
mod router;

pub use hobby::{HobbyAnswer, HobbyPipeline, HobbyRequest};
pub use matcher::{MatchAnswer, MatchRef, MeetingMatcher, MeetingRequest};
pub use router::{Router, TaskKind};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::catalog::CatalogStore;
use crate::config::AgentConfig;
use crate::error::{AgentError, Error, Result};
use crate::llm::retry::RetryPolicy;
use crate::llm::{GenerateRequest, ImageAnalyze, TextGenerate};
use crate::search::SimilaritySearch;

/// Per-request ceiling on pipeline steps, counted across routing, loop
/// transitions and collaborator calls. Independent of the matcher loop's
/// own rewrite bound.
#[derive(Debug)]
pub struct StepBudget {
    limit: u32,
    used: AtomicU32,
}

impl StepBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: AtomicU32::new(0),
        }
    }

    /// Spend one step. Fails once the ceiling is reached.
    pub fn consume(&self) -> std::result::Result<(), AgentError> {
        let used = self.used.fetch_add(1, Ordering::Relaxed);
        if used >= self.limit {
            return Err(AgentError::StepCeilingExceeded { limit: self.limit });
        }
        Ok(())
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::Relaxed).min(self.limit)
    }
}

/// The top-level agent. Holds read-only collaborators and dispatches each
/// request through the router to exactly one pipeline; all per-request
/// state lives in the pipelines' own working memory.
pub struct Agent {
    router: Router,
    matcher: MeetingMatcher,
    hobby: HobbyPipeline,
    llm: Arc<dyn TextGenerate>,
    config: AgentConfig,
    retry: RetryPolicy,
}

impl Agent {
    pub fn new(
        config: &AgentConfig,
        llm: Arc<dyn TextGenerate>,
        search: Arc<dyn SimilaritySearch>,
        vision: Option<Arc<dyn ImageAnalyze>>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            router: Router::new(config, llm.clone()),
            matcher: MeetingMatcher::new(config, llm.clone(), search),
            hobby: HobbyPipeline::new(config, llm.clone(), vision, catalog),
            llm,
            config: config.clone(),
            retry: RetryPolicy::new(config.retry_attempts, config.retry_backoff),
        }
    }

    /// Process one request payload into a final answer string.
    ///
    /// Routing is exhaustive over [`TaskKind`]; each label maps to exactly
    /// one pipeline.
    pub async fn invoke(&self, payload: &Value) -> Result<String> {
        let budget = StepBudget::new(self.config.max_steps);
        let kind = self.router.classify(payload, &budget).await?;

        let answer = match kind {
            TaskKind::MeetingMatching => {
                let request = MeetingRequest::from_value(payload)?;
                let answer = self.matcher.run(&request, &budget).await;
                serde_json::to_string(&answer)
                    .map_err(|e| Error::Agent(AgentError::Internal {
                        reason: e.to_string(),
                    }))?
            }
            TaskKind::HobbyRecommendation => {
                let request = HobbyRequest::from_value(payload)?;
                let answer = self.hobby.run(&request, &budget).await?;
                answer.message
            }
            TaskKind::GeneralSearch => self.general_search(payload, &budget).await?,
        };

        tracing::debug!("Request completed in {} steps as {kind}", budget.used());
        Ok(answer)
    }

    /// Plain single-shot answer for general questions. No safe fallback
    /// exists here, so generator failures surface to the caller.
    async fn general_search(&self, payload: &Value, budget: &StepBudget) -> Result<String> {
        let query = payload
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| crate::error::ValidationError::MissingField {
                field: "query".to_string(),
            })?;

        budget.consume()?;
        let prompt = prompts::general_search(query);
        let answer = self
            .retry
            .run("general search", || {
                self.llm
                    .complete(GenerateRequest::new(prompt.clone()).with_temperature(0.4))
            })
            .await?;
        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_budget_enforces_its_limit() {
        let budget = StepBudget::new(3);
        assert!(budget.consume().is_ok());
        assert!(budget.consume().is_ok());
        assert!(budget.consume().is_ok());
        let err = budget.consume().unwrap_err();
        assert!(matches!(err, AgentError::StepCeilingExceeded { limit: 3 }));
        assert_eq!(budget.used(), 3);
    }

    #[test]
    fn zero_budget_rejects_the_first_step() {
        let budget = StepBudget::new(0);
        assert!(budget.consume().is_err());
    }
}
