//! Hobby catalog: static, reloadable tabular data.
//!
//! The catalog is loaded read-only per scoring request. The loader is
//! deliberately lenient: missing or null fields decode to type-appropriate
//! defaults (false / empty string / 0.0) instead of failing the request.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::error::CatalogError;

/// How a hobby is practiced socially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialMode {
    Solo,
    Parallel,
    Community,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Where a hobby takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Indoor,
    Outdoor,
    Online,
    Any,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A candidate recommendable hobby with fixed scoring attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItem {
    pub hobby_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub short_desc: String,

    // Alignment scores in [0,1] against the user interest vector.
    #[serde(default, deserialize_with = "null_default")]
    pub openness_alignment: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub conscientiousness_alignment: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub autonomy_alignment: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub competence_alignment: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub activity_energy: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub commitment_depth: f64,

    // Cost/time constraints.
    #[serde(default, deserialize_with = "null_opt")]
    pub avg_cost_month: Option<f64>,
    #[serde(default, deserialize_with = "null_opt")]
    pub avg_session_time_hours: Option<f64>,

    #[serde(default, deserialize_with = "null_default")]
    pub social_mode: SocialMode,
    #[serde(default, deserialize_with = "null_default")]
    pub location_type: LocationType,
    #[serde(default, deserialize_with = "null_default")]
    pub monetizable: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub online_available: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub needs_offline: bool,

    #[serde(default, deserialize_with = "null_default")]
    pub tags: Vec<String>,
}

/// Decode `null` (or a missing field, via `default`) as the type default.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode `null` as `None` while keeping the field optional.
fn null_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// Trait for loading the hobby catalog.
pub trait CatalogStore: Send + Sync {
    /// Load the full catalog in file order.
    fn load(&self) -> Result<Vec<CatalogItem>, CatalogError>;
}

/// JSON-file-backed catalog store.
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        if !self.path.exists() {
            return Err(CatalogError::NotFound {
                path: self.path.display().to_string(),
            });
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let items: Vec<CatalogItem> =
            serde_json::from_str(&raw).map_err(|e| CatalogError::Parse {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!("Loaded {} catalog items from {}", items.len(), self.path.display());
        Ok(items)
    }
}

/// Create the catalog store from configuration.
pub fn create_catalog_store(config: &crate::config::CatalogConfig) -> Arc<dyn CatalogStore> {
    Arc::new(JsonCatalogStore::new(&config.path))
}
