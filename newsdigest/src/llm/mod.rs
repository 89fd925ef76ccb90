use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Default sampling parameters shared by every call site.
/// Individual requests may override them, but the routes never do.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_MAX_TOKENS: usize = 800;

/// Core trait for chat-completion providers (remote or stubbed in tests)
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a system + user instruction pair and return the single completion
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// Request structure for a chat completion
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_seconds: None,
        }
    }
}

impl From<crate::prompts::PromptSpec> for ChatRequest {
    fn from(spec: crate::prompts::PromptSpec) -> Self {
        ChatRequest::new(spec.system, spec.user)
    }
}

/// Response from a chat completion, content trimmed of surrounding whitespace
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata reported by the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

pub mod remote;
