//! Conversation summaries over any [`LlmClient`].
//!
//! The summarizer never fails: completion errors are logged and replaced by
//! fixed placeholder strings so a batch run keeps moving through the
//! remaining conversation files.

use std::sync::Arc;

use crate::traits::{LlmClient, LlmError};

/// Returned when the completion endpoint refuses or fails.
pub const API_ERROR_PLACEHOLDER: &str = "Error from language model API.";
/// Returned when the endpoint answers with an undecodable or empty shape.
pub const MALFORMED_PLACEHOLDER: &str = "Error: malformed model response.";

const SYSTEM_PROMPT: &str = "You are a helpful analyst summarizing tweet conversations. \
     Your answers should be short and focus on the nature of the debate.";

const SUMMARY_TEMPERATURE: f32 = 0.7;
const SUMMARY_MAX_TOKENS: u32 = 500;

pub struct Summarizer {
    client: Arc<dyn LlmClient>,
}

impl Summarizer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Summarize one conversation record's text.
    pub async fn summarize(&self, conversation: &str) -> String {
        let prompt = build_prompt(conversation);

        match self
            .client
            .generate(
                &prompt,
                Some(SYSTEM_PROMPT),
                Some(SUMMARY_MAX_TOKENS),
                Some(SUMMARY_TEMPERATURE),
            )
            .await
        {
            Ok(resp) => resp.text,
            Err(LlmError::Malformed(err)) => {
                tracing::error!(error = %err, "model response had an unexpected shape");
                MALFORMED_PLACEHOLDER.to_string()
            }
            Err(err) => {
                tracing::error!(error = %err, "completion request failed");
                API_ERROR_PLACEHOLDER.to_string()
            }
        }
    }
}

fn build_prompt(conversation: &str) -> String {
    format!(
        "\nYou are an assistant analyzing a Twitter conversation that may contain controversy or debate.\n\
         Below is a chronological list of tweets in the conversation (including author info).\n\n\
         Conversation:\n{conversation}\n\n\
         Your tasks:\n\
         1. Identify if there is a heated debate, mild disagreement, or a general controversy.\n\
         2. Summarize the key points of contention or disagreement.\n\
         3. Note any strong sentiment (anger, insults, intense disagreement, etc.) or unusual politeness.\n\
         4. Provide a short, concise summary of the conversation's tone and content.\n"
    )
}
