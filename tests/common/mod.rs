//! Scripted collaborators shared by the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use moit_agent::error::{LlmError, SearchError};
use moit_agent::llm::{GenerateRequest, TextGenerate};
use moit_agent::search::{Document, SimilaritySearch};

/// Text generator that replays a scripted sequence of replies. An exhausted
/// script fails with a non-transient error.
pub struct ScriptedGenerator {
    replies: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerate for ScriptedGenerator {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: GenerateRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self.replies.lock().unwrap();
        replies.pop().ok_or_else(|| LlmError::RequestFailed {
            provider: "scripted".to_string(),
            reason: "script exhausted".to_string(),
        })
    }
}

/// Search collaborator that replays scripted result sets per query call.
/// Once the script runs out, further queries return nothing.
pub struct ScriptedSearch {
    results: Mutex<Vec<Vec<Document>>>,
    queries: AtomicUsize,
}

impl ScriptedSearch {
    pub fn new(results: Vec<Vec<Document>>) -> Arc<Self> {
        let mut reversed = results;
        reversed.reverse();
        Arc::new(Self {
            results: Mutex::new(reversed),
            queries: AtomicUsize::new(0),
        })
    }

    pub fn always_empty() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimilaritySearch for ScriptedSearch {
    async fn query(
        &self,
        _text: &str,
        _threshold: f32,
        _k: usize,
    ) -> Result<Vec<Document>, SearchError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let mut results = self.results.lock().unwrap();
        Ok(results.pop().unwrap_or_default())
    }

    async fn upsert(
        &self,
        _id: &str,
        _text: &str,
        _metadata: Map<String, Value>,
    ) -> Result<(), SearchError> {
        Ok(())
    }

    async fn delete(&self, _id: &str) -> Result<(), SearchError> {
        Ok(())
    }
}

/// A retrieval candidate with id/title metadata.
pub fn candidate(id: &str, title: &str) -> Document {
    let mut meta = Map::new();
    meta.insert("id".to_string(), Value::String(id.to_string()));
    meta.insert("title".to_string(), Value::String(title.to_string()));
    Document::new(format!("{title}: an existing meeting"), meta)
}
