//! Error types for the agent server.

use std::time::Duration;

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Routing error: {0}")]
    Route(#[from] RouteError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

impl Error {
    /// Stable machine-readable code for the HTTP error body.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Llm(_) => "generation_unavailable",
            Error::Search(_) => "search_unavailable",
            Error::Catalog(_) => "catalog_unavailable",
            Error::Route(_) => "unroutable_request",
            Error::Agent(_) => "internal_error",
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed or missing request input. Reported to the caller, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Text-generation collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} is not configured")]
    NotConfigured { provider: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether the failure is a transient transport problem worth a bounded
    /// retry. Application-level errors (auth, bad response) are not retried.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect(),
            LlmError::RateLimited { .. } => true,
            _ => false,
        }
    }
}

/// Similarity-search collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Query against index {index} failed: {reason}")]
    QueryFailed { index: String, reason: String },

    #[error("Upsert into index {index} failed for id {id}: {reason}")]
    UpsertFailed {
        index: String,
        id: String,
        reason: String,
    },

    #[error("Delete from index {index} failed for id {id}: {reason}")]
    DeleteFailed {
        index: String,
        id: String,
        reason: String,
    },

    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SearchError {
    /// Transient transport failures eligible for a bounded retry.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Http(e) => e.is_timeout() || e.is_connect(),
            SearchError::Embedding(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Catalog load errors. Fatal for the request: there is no safe fallback
/// for a recommendation computed against no catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {path}")]
    NotFound { path: String },

    #[error("Failed to parse catalog {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("IO error reading catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// Router classification errors.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Unrecognized route label: {label:?}")]
    Unroutable { label: String },

    #[error("Request payload carries no routable markers")]
    NoMarkers,

    #[error("Router LLM call failed: {0}")]
    Llm(#[from] LlmError),
}

/// Orchestrator-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Global step ceiling of {limit} exceeded")]
    StepCeilingExceeded { limit: u32 },

    #[error("Internal agent failure: {reason}")]
    Internal { reason: String },
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;
