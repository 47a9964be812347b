//! Deterministic hobby scoring: hard filters, weighted cosine similarity,
//! additive bonuses, ranking and per-item explanations.

mod engine;
mod explain;

pub use engine::{Recommendation, ScoringContext, ScoringEngine};
