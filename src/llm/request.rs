//! Chat-completion request payload.

use serde::Serialize;

use crate::commit::{CommitFormat, build_system_prompt, build_user_prompt};
use crate::config::ProviderConfig;

pub const TEMPERATURE: f32 = 0.5;

/// Token budget used while reasoning is disabled.
pub const REASONING_DISABLED_MAX_TOKENS: u32 = 300;

/// Token budget when the provider cannot disable reasoning and no
/// `max_tokens` is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// The two knobs the retry policy adjusts between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestShape {
    pub disable_reasoning: bool,
    pub max_tokens: u32,
}

impl RequestShape {
    /// Providers that have not been probed, or are known to accept it, get
    /// `disable_reasoning` with a small budget.
    pub fn for_provider(provider: &ProviderConfig) -> Self {
        if provider.can_disable_reasoning == Some(false) {
            Self {
                disable_reasoning: false,
                max_tokens: provider.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            }
        } else {
            Self {
                disable_reasoning: true,
                max_tokens: REASONING_DISABLED_MAX_TOKENS,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_reasoning: Option<bool>,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(provider: &ProviderConfig, format: CommitFormat, diff: &str) -> Self {
        let shape = RequestShape::for_provider(provider);
        Self {
            model: provider.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: build_system_prompt(format),
                },
                ChatMessage {
                    role: "user",
                    content: build_user_prompt(diff),
                },
            ],
            temperature: TEMPERATURE,
            stream: true,
            disable_reasoning: shape.disable_reasoning.then_some(true),
            max_tokens: shape.max_tokens,
        }
    }

    pub fn shape(&self) -> RequestShape {
        RequestShape {
            disable_reasoning: self.disable_reasoning == Some(true),
            max_tokens: self.max_tokens,
        }
    }
}
