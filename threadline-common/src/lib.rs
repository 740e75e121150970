//! Common types shared across Threadline crates.
//!
//! This crate defines the shared error type, the provider-agnostic LLM
//! configuration, and centralised `tracing` initialisation. It is kept
//! lightweight so every other crate can depend on it without pulling in
//! heavy transitive costs.
//!
//! # Overview
//!
//! - [`LlmConfig`]: provider selection for the summarization backend
//! - [`observability`]: logging initialisation shared by binaries and tests
//! - [`ThreadlineError`] and [`Result`]: shared error handling

use serde::{Deserialize, Serialize};

pub mod observability;

/// Configuration for the LLM provider used for thread summaries.
///
/// Concrete client implementations live in the `threadline-llm` crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LlmConfig {
    OpenAi {
        api_key: String,
        model: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    None,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::None
    }
}

/// Error types used across the Threadline system.
#[derive(thiserror::Error, Debug)]
pub enum ThreadlineError {
    /// The aggregator client failed to complete a fetch.
    #[error("Aggregator error: {0}")]
    Aggregator(String),

    /// The LLM backend failed to produce a usable response.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure while materializing or reading thread records.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient alias for results that use [`ThreadlineError`].
pub type Result<T> = std::result::Result<T, ThreadlineError>;
