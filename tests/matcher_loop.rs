//! End-to-end tests of the matcher loop against scripted collaborators.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{candidate, ScriptedGenerator, ScriptedSearch};
use moit_agent::agent::{MatchAnswer, MeetingMatcher, MeetingRequest, StepBudget};
use moit_agent::config::{AgentConfig, HelpfulnessStrategy};

fn test_config() -> AgentConfig {
    AgentConfig {
        retry_backoff: Duration::from_millis(1),
        ..AgentConfig::default()
    }
}

fn judge_config() -> AgentConfig {
    AgentConfig {
        helpfulness: HelpfulnessStrategy::LlmJudge,
        ..test_config()
    }
}

fn meeting_request() -> MeetingRequest {
    MeetingRequest::from_value(&json!({
        "title": "Weekend hiking crew",
        "description": "Easy trails around the city, beginners welcome",
    }))
    .unwrap()
}

#[tokio::test]
async fn empty_retrieval_exhausts_rewrites_and_returns_canonical_empty_answer() {
    let config = test_config();
    // One rewrite reply per allowed rewrite; no generation calls happen
    // because the candidate set is always empty.
    let llm = ScriptedGenerator::new(&["mountain walking group", "outdoor trekking meetup"]);
    let search = ScriptedSearch::always_empty();
    let matcher = MeetingMatcher::new(&config, llm.clone(), search.clone());

    let budget = StepBudget::new(config.max_steps);
    let answer = matcher.run(&meeting_request(), &budget).await;

    assert_eq!(answer, MatchAnswer::empty());
    assert_eq!(
        serde_json::to_string(&answer).unwrap(),
        r#"{"summary":"","recommendations":[]}"#
    );
    // retry_bound + 1 retrievals, no more.
    assert_eq!(search.queries(), config.max_rewrites as usize + 1);
    // Only the rewrite prompts hit the generator.
    assert_eq!(llm.calls(), config.max_rewrites as usize);
}

#[tokio::test]
async fn helpful_first_answer_means_one_retrieval_and_one_generation() {
    let config = test_config();
    let llm = ScriptedGenerator::new(&[
        r#"{"summary": "A very similar hiking meeting exists.", "recommendations": [{"id": "m1", "title": "Trail buddies"}]}"#,
    ]);
    let search = ScriptedSearch::new(vec![vec![candidate("m1", "Trail buddies")]]);
    let matcher = MeetingMatcher::new(&config, llm.clone(), search.clone());

    let budget = StepBudget::new(config.max_steps);
    let answer = matcher.run(&meeting_request(), &budget).await;

    assert_eq!(answer.recommendations.len(), 1);
    assert_eq!(answer.recommendations[0].id, "m1");
    assert_eq!(search.queries(), 1);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn unparseable_generation_triggers_a_rewrite_then_succeeds() {
    let config = test_config();
    let llm = ScriptedGenerator::new(&[
        "Sure, here are some meetings you might enjoy!",
        "hiking groups near me",
        r#"{"summary": "Found one.", "recommendations": [{"id": "m2", "title": "Sunday summit"}]}"#,
    ]);
    let search = ScriptedSearch::new(vec![
        vec![candidate("m1", "Trail buddies")],
        vec![candidate("m2", "Sunday summit")],
    ]);
    let matcher = MeetingMatcher::new(&config, llm.clone(), search.clone());

    let budget = StepBudget::new(config.max_steps);
    let answer = matcher.run(&meeting_request(), &budget).await;

    assert_eq!(answer.recommendations[0].id, "m2");
    assert_eq!(search.queries(), 2);
}

#[tokio::test]
async fn judge_verdict_is_case_folded_and_trimmed() {
    let config = judge_config();
    let llm = ScriptedGenerator::new(&[
        r#"{"summary": "One match.", "recommendations": [{"id": "m1", "title": "Trail buddies"}]}"#,
        "  HELPFUL \n",
    ]);
    let search = ScriptedSearch::new(vec![vec![candidate("m1", "Trail buddies")]]);
    let matcher = MeetingMatcher::new(&config, llm.clone(), search.clone());

    let budget = StepBudget::new(config.max_steps);
    let answer = matcher.run(&meeting_request(), &budget).await;

    assert_eq!(answer.recommendations[0].id, "m1");
    assert_eq!(search.queries(), 1);
    // One generation plus one judge call.
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn judge_prose_reply_counts_as_unhelpful_and_triggers_a_rewrite() {
    let config = judge_config();
    let llm = ScriptedGenerator::new(&[
        r#"{"summary": "Maybe.", "recommendations": [{"id": "m1", "title": "Trail buddies"}]}"#,
        "That looks like a lovely answer to me!",
        "hiking groups near me",
        r#"{"summary": "Found one.", "recommendations": [{"id": "m2", "title": "Sunday summit"}]}"#,
        "helpful",
    ]);
    let search = ScriptedSearch::new(vec![
        vec![candidate("m1", "Trail buddies")],
        vec![candidate("m2", "Sunday summit")],
    ]);
    let matcher = MeetingMatcher::new(&config, llm.clone(), search.clone());

    let budget = StepBudget::new(config.max_steps);
    let answer = matcher.run(&meeting_request(), &budget).await;

    assert_eq!(answer.recommendations[0].id, "m2");
    assert_eq!(search.queries(), 2);
    assert_eq!(llm.calls(), 5);
}

#[tokio::test]
async fn failed_judge_call_counts_as_unhelpful_and_loop_still_terminates() {
    let config = judge_config();
    // Only the generation reply is scripted; the judge call and every later
    // generator call fail, so each verdict degrades to unhelpful.
    let llm = ScriptedGenerator::new(&[
        r#"{"summary": "One match.", "recommendations": [{"id": "m1", "title": "Trail buddies"}]}"#,
    ]);
    let search = ScriptedSearch::new(vec![vec![candidate("m1", "Trail buddies")]]);
    let matcher = MeetingMatcher::new(&config, llm, search.clone());

    let budget = StepBudget::new(config.max_steps);
    let answer = matcher.run(&meeting_request(), &budget).await;

    assert_eq!(answer, MatchAnswer::empty());
    assert_eq!(search.queries(), config.max_rewrites as usize + 1);
}

#[tokio::test]
async fn step_ceiling_forces_empty_answer() {
    let config = test_config();
    let llm = ScriptedGenerator::new(&[]);
    let search = ScriptedSearch::always_empty();
    let matcher = MeetingMatcher::new(&config, llm, search.clone());

    // Enough budget for the prepare and retrieve transitions only.
    let budget = StepBudget::new(2);
    let answer = matcher.run(&meeting_request(), &budget).await;

    assert_eq!(answer, MatchAnswer::empty());
    assert!(search.queries() <= 1);
}
