use crate::traits::{LlmClient, LlmError, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use threadline_http::{HttpClient, HttpError, RequestOpts, RetryPolicy};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: Option<u32>,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, model, OPENAI_API_BASE)
    }

    /// Point the client at an OpenAI-compatible endpoint (gateways, mocks).
    pub fn with_base_url(api_key: String, model: String, base_url: &str) -> Result<Self, LlmError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let client = HttpClient::new(&base)
            .map_err(|e| LlmError::Config(format!("HttpClient init failed: {e}")))?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system".into(),
                content: system.into(),
            });
        }
        messages.push(ChatMessage {
            role: "user".into(),
            content: prompt.into(),
        });

        let req = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: temperature.unwrap_or(1.0),
            max_tokens,
        };

        // Completion calls are not retried; rate-limit patience belongs to
        // the aggregator path, not this one.
        let opts = RequestOpts {
            auth: Some(threadline_http::Auth::Bearer(&self.api_key)),
            retry: Some(RetryPolicy {
                max_retries: 0,
                ..RetryPolicy::default()
            }),
            ..Default::default()
        };

        let resp: ChatCompletionResponse = self
            .client
            .post_json_opts("chat/completions", &req, opts)
            .await
            .map_err(http_to_llm)?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Malformed("response contained no choices".into()))?;

        Ok(LlmResponse {
            text,
            model: resp.model,
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_llm(e: HttpError) -> LlmError {
    match e {
        HttpError::Decode(err, snippet) => {
            LlmError::Malformed(format!("{err}, body_snippet: {snippet}"))
        }
        other => LlmError::Api(other.to_string()),
    }
}
