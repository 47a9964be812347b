//! Multi-agent recommendation server.
//!
//! Routes requests to one of three pipelines: a self-critique retrieval
//! loop for meeting matching, a deterministic scoring pipeline for hobby
//! recommendation, and a plain generator call for general questions.

pub mod agent;
pub mod catalog;
pub mod config;
pub mod error;
pub mod llm;
pub mod profile;
pub mod scoring;
pub mod search;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
