use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatProvider, ChatRequest, ChatResponse, UsageMetadata};

/// Remote chat provider speaking the Azure OpenAI chat-completions wire format.
///
/// The endpoint is derived from the resource base URL, deployment identifier and
/// API version: `{base}/openai/deployments/{deployment}/chat/completions?api-version={v}`.
pub struct RemoteChatProvider {
    api_url: String,
    api_key: String,
    deployment: String,
    api_version: String,
    default_timeout: Duration,
    default_max_tokens: usize,
    default_temperature: f32,
    default_top_p: f32,
    client: reqwest::Client,
}

impl RemoteChatProvider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: api_version.into(),
            default_timeout: Duration::from_secs(30),
            default_max_tokens: super::DEFAULT_MAX_TOKENS,
            default_temperature: super::DEFAULT_TEMPERATURE,
            default_top_p: super::DEFAULT_TOP_P,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_defaults(
        mut self,
        timeout_secs: u64,
        max_tokens: usize,
        temperature: f32,
        top_p: f32,
    ) -> Self {
        self.default_timeout = Duration::from_secs(timeout_secs);
        self.default_max_tokens = max_tokens;
        self.default_temperature = temperature;
        self.default_top_p = top_p;
        self
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.api_url.trim_end_matches('/'),
            self.deployment
        )
    }
}

#[async_trait::async_trait]
impl ChatProvider for RemoteChatProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        let timeout = request
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let max_tokens = request.max_tokens.unwrap_or(self.default_max_tokens);
        let temperature = request.temperature.unwrap_or(self.default_temperature);
        let top_p = request.top_p.unwrap_or(self.default_top_p);

        // Build the chat-completions request: system message first, then user
        let req_body = ChatCompletionRequest {
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: request.system,
                },
                Message {
                    role: "user".to_string(),
                    content: request.user,
                },
            ],
            temperature,
            top_p,
            max_tokens,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        // Make HTTP request with timeout
        let response = tokio::time::timeout(
            timeout,
            self.client
                .post(self.completions_url())
                .query(&[("api-version", self.api_version.as_str())])
                .header("api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .json(&req_body)
                .send(),
        )
        .await
        .context("chat completion request timed out")?
        .context("chat completion HTTP request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("chat completion API error {}: {}", status, body);
        }

        let resp_body: ChatCompletionResponse = response
            .json()
            .await
            .context("failed to parse chat completion response")?;

        let choice = resp_body
            .choices
            .first()
            .context("chat completion response has no choices")?;

        let usage = resp_body.usage.unwrap_or_default();
        let usage = UsageMetadata {
            prompt_tokens: usage.prompt_tokens.unwrap_or(0),
            completion_tokens: usage.completion_tokens.unwrap_or(0),
            total_tokens: usage.total_tokens.unwrap_or(0),
        };

        Ok(ChatResponse {
            content: choice.message.content.trim().to_string(),
            usage,
            model: resp_body
                .model
                .unwrap_or_else(|| self.deployment.clone()),
        })
    }
}

// Chat-completions API request/response structures
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<Message>,
    temperature: f32,
    top_p: f32,
    max_tokens: usize,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<usize>,
    #[serde(default)]
    completion_tokens: Option<usize>,
    #[serde(default)]
    total_tokens: Option<usize>,
}
