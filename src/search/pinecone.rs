//! Vector index client (Pinecone-style REST API).
//!
//! Queries are vectorized through an OpenAI-compatible embeddings endpoint,
//! then matched against the index with score-threshold filtering and top-k
//! limiting. Upsert and delete maintain the index.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SearchConfig;
use crate::error::{LlmError, SearchError};
use crate::search::provider::{Document, SimilaritySearch};

const EMBED_PROVIDER: &str = "embeddings";

/// Pinecone-style vector index backed by an embeddings endpoint.
pub struct PineconeSearch {
    client: Client,
    config: SearchConfig,
}

impl PineconeSearch {
    /// Create a new client from configuration.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SearchError::QueryFailed {
                index: config.index_name.clone(),
                reason: format!("Failed to build reqwest client: {}", e),
            })?;
        Ok(Self { client, config })
    }

    fn index_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.index_host.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn index_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key.as_ref() {
            Some(key) => request.header("Api-Key", key.expose_secret().to_string()),
            None => request,
        }
    }

    /// Vectorize `text` through the embeddings endpoint.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a str,
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedEntry>,
        }

        #[derive(Deserialize)]
        struct EmbedEntry {
            embedding: Vec<f32>,
        }

        let base = self.config.embed_base_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        let url = format!("{}/v1/embeddings", base);

        let mut request = self.client.post(&url).json(&EmbedRequest {
            model: &self.config.embed_model,
            input: text,
        });
        if let Some(key) = self.config.embed_api_key.as_ref() {
            request = request.header("Authorization", format!("Bearer {}", key.expose_secret()));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited {
                    provider: EMBED_PROVIDER.to_string(),
                    retry_after: None,
                });
            }
            return Err(LlmError::RequestFailed {
                provider: EMBED_PROVIDER.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let parsed: EmbedResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|e| e.embedding)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: EMBED_PROVIDER.to_string(),
                reason: "embeddings response contained no data".to_string(),
            })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    vectors: Vec<UpsertVector>,
}

#[derive(Debug, Serialize)]
struct UpsertVector {
    id: String,
    values: Vec<f32>,
    metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest {
    ids: Vec<String>,
}

#[async_trait]
impl SimilaritySearch for PineconeSearch {
    async fn query(
        &self,
        text: &str,
        threshold: f32,
        k: usize,
    ) -> Result<Vec<Document>, SearchError> {
        let vector = self.embed(text).await?;

        let request = self.client.post(self.index_url("query")).json(&QueryRequest {
            vector,
            top_k: k,
            include_metadata: true,
        });
        let response = self.index_auth(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::QueryFailed {
                index: self.config.index_name.clone(),
                reason: format!("HTTP {}", status),
            });
        }

        let parsed: QueryResponse = response.json().await?;
        let documents = parsed
            .matches
            .into_iter()
            .filter(|m| m.score >= threshold)
            .take(k)
            .map(|m| {
                // The document body travels in metadata under "content";
                // the rest (meeting_id, title, ...) stays alongside it.
                let content = m
                    .metadata
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Document::new(content, m.metadata)
            })
            .collect();

        Ok(documents)
    }

    async fn upsert(
        &self,
        id: &str,
        text: &str,
        metadata: Map<String, Value>,
    ) -> Result<(), SearchError> {
        let values = self.embed(text).await?;

        let mut metadata = metadata;
        metadata.insert("content".to_string(), Value::String(text.to_string()));

        let request = self
            .client
            .post(self.index_url("vectors/upsert"))
            .json(&UpsertRequest {
                vectors: vec![UpsertVector {
                    id: id.to_string(),
                    values,
                    metadata,
                }],
            });
        let response = self.index_auth(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::UpsertFailed {
                index: self.config.index_name.clone(),
                id: id.to_string(),
                reason: format!("HTTP {}", status),
            });
        }
        tracing::info!("Upserted meeting {} into index {}", id, self.config.index_name);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), SearchError> {
        let request = self
            .client
            .post(self.index_url("vectors/delete"))
            .json(&DeleteRequest {
                ids: vec![id.to_string()],
            });
        let response = self.index_auth(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::DeleteFailed {
                index: self.config.index_name.clone(),
                id: id.to_string(),
                reason: format!("HTTP {}", status),
            });
        }
        tracing::info!("Deleted meeting {} from index {}", id, self.config.index_name);
        Ok(())
    }
}
