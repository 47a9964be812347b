//! Similarity search over the meeting index.

mod pinecone;
mod provider;

pub use pinecone::PineconeSearch;
pub use provider::{Document, SimilaritySearch};

use std::sync::Arc;

use crate::config::SearchConfig;
use crate::error::SearchError;

/// Create the similarity-search collaborator from configuration.
pub fn create_similarity_search(
    config: &SearchConfig,
) -> Result<Arc<dyn SimilaritySearch>, SearchError> {
    let search = PineconeSearch::new(config.clone())?;
    tracing::info!(
        "Using vector index {} at {}",
        config.index_name,
        config.index_host
    );
    Ok(Arc::new(search))
}
