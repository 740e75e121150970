//! Provider-agnostic LLM integration for Threadline.
//!
//! Exposes the common [`traits::LlmClient`] interface, the OpenAI-compatible
//! chat-completions client, and the [`summarizer::Summarizer`] that turns
//! persisted conversation records into natural-language summaries.
//! [`ensure_llm_ready`] builds a client from a
//! [`threadline_common::LlmConfig`].

pub mod openai;
pub mod summarizer;
pub mod traits;

use std::sync::Arc;

use openai::OpenAiClient;
use threadline_common::{LlmConfig, Result, ThreadlineError};
use traits::LlmClient;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Build the configured LLM client.
pub fn ensure_llm_ready(config: &LlmConfig) -> Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        LlmConfig::OpenAi {
            api_key,
            model,
            base_url,
        } => {
            let client = match base_url {
                Some(base) => OpenAiClient::with_base_url(api_key.clone(), model.clone(), base),
                None => OpenAiClient::new(api_key.clone(), model.clone()),
            }
            .map_err(|e| ThreadlineError::Config(e.to_string()))?;
            Ok(Arc::new(client))
        }
        LlmConfig::None => Err(ThreadlineError::Config("No LLM configured".to_string())),
    }
}
