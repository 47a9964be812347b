//! Orchestrator-level tests: routing, dispatch and degraded pipelines.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{candidate, ScriptedGenerator, ScriptedSearch};
use moit_agent::agent::{Agent, Router, StepBudget, TaskKind};
use moit_agent::catalog::JsonCatalogStore;
use moit_agent::config::{AgentConfig, RouterStrategy};
use moit_agent::error::{Error, RouteError};

const CATALOG_JSON: &str = r#"[
    {
        "hobby_id": "pottery",
        "name": "Pottery",
        "short_desc": "Wheel throwing and hand building",
        "openness_alignment": 0.7,
        "conscientiousness_alignment": 0.6,
        "autonomy_alignment": 0.8,
        "competence_alignment": 0.9,
        "activity_energy": 0.4,
        "commitment_depth": 0.6,
        "avg_cost_month": 60.0,
        "social_mode": "solo",
        "monetizable": true
    },
    {
        "hobby_id": "climbing",
        "name": "Indoor climbing",
        "short_desc": "Bouldering at a local gym",
        "openness_alignment": 0.6,
        "competence_alignment": 0.8,
        "activity_energy": 0.9,
        "avg_cost_month": 90.0,
        "social_mode": "parallel",
        "needs_offline": true
    }
]"#;

fn test_config() -> AgentConfig {
    AgentConfig {
        retry_backoff: Duration::from_millis(1),
        ..AgentConfig::default()
    }
}

fn agent_with(
    llm: Arc<common::ScriptedGenerator>,
    search: Arc<common::ScriptedSearch>,
    catalog_json: &str,
) -> (Agent, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, catalog_json).unwrap();
    let catalog = Arc::new(JsonCatalogStore::new(&path));
    let agent = Agent::new(&test_config(), llm, search, None, catalog);
    (agent, dir)
}

#[tokio::test]
async fn meeting_payload_dispatches_to_the_matcher() {
    let llm = ScriptedGenerator::new(&[
        r#"{"summary": "One match.", "recommendations": [{"id": "m1", "title": "Trail buddies"}]}"#,
    ]);
    let search = ScriptedSearch::new(vec![vec![candidate("m1", "Trail buddies")]]);
    let (agent, _dir) = agent_with(llm, search, CATALOG_JSON);

    let answer = agent
        .invoke(&json!({
            "title": "Weekend hiking crew",
            "description": "Easy trails, beginners welcome",
        }))
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&answer).unwrap();
    assert_eq!(parsed["recommendations"][0]["id"], "m1");
}

#[tokio::test]
async fn hobby_payload_scores_and_degrades_to_plain_rendering() {
    // An empty script makes every generator step fail, so the pipeline has
    // to fall back to its deterministic message.
    let llm = ScriptedGenerator::new(&[]);
    let search = ScriptedSearch::always_empty();
    let (agent, _dir) = agent_with(llm, search, CATALOG_JSON);

    let answer = agent
        .invoke(&json!({
            "survey": {"Q6": 4, "Q8": 5, "Q10": 4},
            "user_context": {"monthly_budget": 70.0},
        }))
        .await
        .unwrap();

    // The over-budget climbing gym is filtered out; pottery survives.
    assert!(answer.contains("Pottery"), "answer: {answer}");
    assert!(!answer.contains("climbing"), "answer: {answer}");
}

#[tokio::test]
async fn hobby_payload_with_no_affordable_items_is_not_an_error() {
    let llm = ScriptedGenerator::new(&[]);
    let search = ScriptedSearch::always_empty();
    let (agent, _dir) = agent_with(llm, search, CATALOG_JSON);

    let answer = agent
        .invoke(&json!({
            "survey": {"Q6": 4},
            "user_context": {"monthly_budget": 10.0},
        }))
        .await
        .unwrap();

    assert!(answer.contains("No hobby"), "answer: {answer}");
}

#[tokio::test]
async fn missing_catalog_is_a_fatal_catalog_error() {
    let llm = ScriptedGenerator::new(&[]);
    let search = ScriptedSearch::always_empty();
    let catalog = Arc::new(JsonCatalogStore::new("/nonexistent/catalog.json"));
    let agent = Agent::new(&test_config(), llm, search, None, catalog);

    let err = agent
        .invoke(&json!({"survey": {"Q6": 3}}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Catalog(_)));
    assert_eq!(err.code(), "catalog_unavailable");
}

#[tokio::test]
async fn unmarked_payload_is_unroutable() {
    let llm = ScriptedGenerator::new(&[]);
    let search = ScriptedSearch::always_empty();
    let (agent, _dir) = agent_with(llm, search, CATALOG_JSON);

    let err = agent.invoke(&json!({"foo": "bar"})).await.unwrap_err();
    assert!(matches!(err, Error::Route(_)));
    assert_eq!(err.code(), "unroutable_request");
}

#[tokio::test]
async fn llm_router_normalizes_a_quoted_label() {
    let config = AgentConfig {
        router_strategy: RouterStrategy::Llm,
        ..test_config()
    };
    let llm = ScriptedGenerator::new(&["  \"Meeting_Matching\"\n"]);
    let router = Router::new(&config, llm);

    let budget = StepBudget::new(config.max_steps);
    let kind = router
        .classify(&json!({"anything": "goes"}), &budget)
        .await
        .unwrap();
    assert_eq!(kind, TaskKind::MeetingMatching);
}

#[tokio::test]
async fn llm_router_rejects_an_unrecognized_label() {
    let config = AgentConfig {
        router_strategy: RouterStrategy::Llm,
        ..test_config()
    };
    let llm = ScriptedGenerator::new(&["poetry_review"]);
    let router = Router::new(&config, llm);

    let budget = StepBudget::new(config.max_steps);
    let err = router
        .classify(&json!({"anything": "goes"}), &budget)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Route(RouteError::Unroutable { ref label }) if label == "poetry_review"
    ));
}

#[tokio::test]
async fn general_query_goes_straight_to_the_generator() {
    let llm = ScriptedGenerator::new(&["A reflector around 150mm aperture is a good start."]);
    let search = ScriptedSearch::always_empty();
    let (agent, _dir) = agent_with(llm.clone(), search, CATALOG_JSON);

    let answer = agent
        .invoke(&json!({"query": "what is a good beginner telescope"}))
        .await
        .unwrap();
    assert!(answer.contains("reflector"));
    assert_eq!(llm.calls(), 1);
}
