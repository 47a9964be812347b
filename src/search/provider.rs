//! Similarity-search collaborator trait and result types.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::SearchError;

/// A retrieval result: opaque text plus metadata.
///
/// Consumed, never mutated; lives for one loop iteration set.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Fetch a string metadata field, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Trait for the vector similarity-search collaborator.
///
/// `query` supports a score-threshold filter and top-k limiting. The upsert
/// and delete operations maintain the index as meetings are created and
/// removed on the platform.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// Find up to `k` documents similar to `text` with score >= `threshold`.
    async fn query(
        &self,
        text: &str,
        threshold: f32,
        k: usize,
    ) -> Result<Vec<Document>, SearchError>;

    /// Insert or replace a document in the index.
    async fn upsert(
        &self,
        id: &str,
        text: &str,
        metadata: Map<String, Value>,
    ) -> Result<(), SearchError>;

    /// Remove a document from the index.
    async fn delete(&self, id: &str) -> Result<(), SearchError>;
}
