//! HTTP client for an OpenAI-compatible chat-completions service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use spl_core::LlmConfig;

use crate::{
    retry::RetryPolicy,
    traits::CompletionProvider,
    AdapterError, AdapterResult,
};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Chat-completions client with bounded timeout and a single retry.
pub struct CompletionClient {
    config: LlmConfig,
    client: Client,
    retry: RetryPolicy,
}

impl CompletionClient {
    pub fn new(config: LlmConfig) -> AdapterResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AdapterError::ConnectionError(e.to_string()))?;

        Ok(Self {
            config,
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send(&self, prompt: &str, temperature: f32, max_tokens: u32) -> AdapterResult<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 503 {
            return Err(AdapterError::ServiceUnavailable(format!(
                "completion service returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(AdapterError::RequestFailed(format!(
                "completion service returned {}",
                status
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AdapterError::InvalidResponse("response had no choices".into()))?;

        debug!(chars = content.len(), "Completion received");
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl CompletionProvider for CompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> AdapterResult<String> {
        self.retry
            .execute(|| self.send(prompt, temperature, max_tokens))
            .await
    }
}
