//! Configuration for the agent server.
//!
//! Everything is env-driven (with `.env` support via dotenvy). Collaborator
//! credentials are held as [`SecretString`] so they never end up in logs.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Main configuration for the agent.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub vision: VisionConfig,
    pub search: SearchConfig,
    pub catalog: CatalogConfig,
    pub agent: AgentConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            server: ServerConfig::from_env()?,
            llm: LlmConfig::from_env()?,
            vision: VisionConfig::from_env()?,
            search: SearchConfig::from_env()?,
            catalog: CatalogConfig::from_env()?,
            agent: AgentConfig::from_env()?,
        })
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address, e.g. "127.0.0.1:8080".
    pub bind: String,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind: optional_env("SERVER_BIND")?.unwrap_or_else(|| "127.0.0.1:8080".to_string()),
        })
    }
}

/// Text-generation collaborator configuration (OpenAI-compatible endpoint).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub request_timeout: Duration,
}

impl LlmConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: optional_env("LLM_BASE_URL")?
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            api_key: optional_env("LLM_API_KEY")?.map(SecretString::from),
            model: optional_env("LLM_MODEL")?.unwrap_or_else(|| "gpt-4o-mini".to_string()),
            request_timeout: Duration::from_secs(parse_optional_env("LLM_TIMEOUT_SECS", 120u64)?),
        })
    }
}

/// Image-analysis collaborator configuration.
///
/// Optional: when no API key is set the photo step of the hobby pipeline is
/// skipped and the pipeline runs on survey data alone.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
}

impl VisionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: optional_env("VISION_BASE_URL")?
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            api_key: optional_env("VISION_API_KEY")?.map(SecretString::from),
            model: optional_env("VISION_MODEL")?
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
        })
    }

    /// Whether an image-analysis collaborator is available at all.
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Similarity-search collaborator configuration (vector index + embeddings).
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Vector index query host, e.g. "https://meetings-abc123.svc.pinecone.io".
    pub index_host: String,
    pub index_name: String,
    pub api_key: Option<SecretString>,
    /// Embedding endpoint (OpenAI-compatible) used to vectorize queries.
    pub embed_base_url: String,
    pub embed_api_key: Option<SecretString>,
    pub embed_model: String,
    pub request_timeout: Duration,
}

impl SearchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            index_host: require_env("SEARCH_INDEX_HOST")?,
            index_name: optional_env("SEARCH_INDEX_NAME")?
                .unwrap_or_else(|| "meetings".to_string()),
            api_key: optional_env("SEARCH_API_KEY")?.map(SecretString::from),
            embed_base_url: optional_env("EMBED_BASE_URL")?
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            embed_api_key: optional_env("EMBED_API_KEY")?.map(SecretString::from),
            embed_model: optional_env("EMBED_MODEL")?
                .unwrap_or_else(|| "text-embedding-3-large".to_string()),
            request_timeout: Duration::from_secs(parse_optional_env(
                "SEARCH_TIMEOUT_SECS",
                30u64,
            )?),
        })
    }
}

/// Hobby catalog configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            path: PathBuf::from(
                optional_env("CATALOG_PATH")?
                    .unwrap_or_else(|| "data/hobby_catalog.json".to_string()),
            ),
        })
    }
}

/// How the router classifies an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterStrategy {
    /// Inspect structural markers in the payload (deterministic, default).
    Structural,
    /// Ask the text generator for a closed-label classification.
    Llm,
}

/// How the self-critique loop judges a generated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpfulnessStrategy {
    /// Non-empty recommendations count as helpful (deterministic, default).
    CodeBased,
    /// Ask the text generator for a binary verdict, parsed strictly.
    LlmJudge,
}

/// Pipeline tuning and safety ceilings.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Minimum similarity score for retrieved candidates.
    pub score_threshold: f32,
    /// Maximum candidates per retrieval.
    pub top_k: usize,
    /// Query rewrites allowed before the loop gives up.
    pub max_rewrites: u32,
    /// Global collaborator-call ceiling per request (defense in depth,
    /// independent of the loop's own bound).
    pub max_steps: u32,
    /// Retry attempts for transient collaborator transport failures.
    pub retry_attempts: u32,
    /// Fixed backoff between retry attempts.
    pub retry_backoff: Duration,
    pub router_strategy: RouterStrategy,
    pub helpfulness: HelpfulnessStrategy,
    /// How many hobbies the scoring engine returns.
    pub top_k_hobbies: usize,
    /// Rescale hobby scores to 0-100 relative to the returned set.
    pub rescale_scores: bool,
}

impl AgentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let router_strategy = match optional_env("ROUTER_STRATEGY")?.as_deref() {
            None | Some("structural") => RouterStrategy::Structural,
            Some("llm") => RouterStrategy::Llm,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "ROUTER_STRATEGY".to_string(),
                    message: format!("unknown strategy {other:?} (expected structural or llm)"),
                });
            }
        };

        let helpfulness = match optional_env("MATCHER_HELPFULNESS")?.as_deref() {
            None | Some("code") => HelpfulnessStrategy::CodeBased,
            Some("llm") => HelpfulnessStrategy::LlmJudge,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "MATCHER_HELPFULNESS".to_string(),
                    message: format!("unknown strategy {other:?} (expected code or llm)"),
                });
            }
        };

        Ok(Self {
            score_threshold: parse_optional_env("MATCHER_SCORE_THRESHOLD", 0.75f32)?,
            top_k: parse_optional_env("MATCHER_TOP_K", 2usize)?,
            max_rewrites: parse_optional_env("MATCHER_MAX_REWRITES", 2u32)?,
            max_steps: parse_optional_env("AGENT_MAX_STEPS", 15u32)?,
            retry_attempts: parse_optional_env("COLLABORATOR_RETRY_ATTEMPTS", 3u32)?,
            retry_backoff: Duration::from_millis(parse_optional_env(
                "COLLABORATOR_RETRY_BACKOFF_MS",
                500u64,
            )?),
            router_strategy,
            helpfulness,
            top_k_hobbies: parse_optional_env("HOBBY_TOP_K", 10usize)?,
            rescale_scores: parse_optional_env("HOBBY_RESCALE_SCORES", true)?,
        })
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.75,
            top_k: 2,
            max_rewrites: 2,
            max_steps: 15,
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            router_strategy: RouterStrategy::Structural,
            helpfulness: HelpfulnessStrategy::CodeBased,
            top_k_hobbies: 10,
            rescale_scores: true,
        }
    }
}

/// Read an env var, treating empty values as unset.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!(
            "failed to read {key}: {e}"
        ))),
    }
}

/// Read a required env var.
pub(crate) fn require_env(key: &str) -> Result<String, ConfigError> {
    optional_env(key)?.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an env var into `T`, falling back to `default` when unset.
pub(crate) fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key)? {
        Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{e}"),
        }),
        None => Ok(default),
    }
}
