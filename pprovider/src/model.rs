//! Provider catalogue plus provider-agnostic request and message types.
//!
//! ```rust
//! use pprovider::{CompletionRequest, ProviderErrorKind, ProviderKind};
//!
//! let provider = ProviderKind::from_secret_name("OPENAI_API_KEY").expect("known secret");
//! assert_eq!(provider, ProviderKind::OpenAi);
//! assert_eq!(provider.default_model(), "gpt-4");
//!
//! let err = CompletionRequest::from_prompt("", "hi").validate().unwrap_err();
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Google,
    Mistral,
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        Self::Anthropic,
        Self::OpenAi,
        Self::Google,
        Self::Mistral,
        Self::OpenRouter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Mistral => "mistral",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Name of the persistent secret holding this provider's API key.
    pub fn secret_name(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Google => "GOOGLE_API_KEY",
            Self::Mistral => "MISTRAL_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    /// Derives the provider from a secret name by its leading `_`-separated segment.
    pub fn from_secret_name(name: &str) -> Option<Self> {
        let prefix = name.split('_').next()?;
        prefix.to_ascii_lowercase().parse().ok()
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-opus-20240229",
            Self::OpenAi => "gpt-4",
            Self::Google => "gemini-pro",
            Self::Mistral => "mistral-large",
            Self::OpenRouter => "openrouter/auto",
        }
    }

    pub fn available_models(&self) -> &'static [&'static str] {
        match self {
            Self::Anthropic => &["claude-3-opus-20240229", "claude-3-sonnet-20240229"],
            Self::OpenAi => &["gpt-4", "gpt-3.5-turbo"],
            Self::Google => &["gemini-pro"],
            Self::Mistral => &[
                "mistral-large",
                "mistral-medium",
                "mistral-small",
                "mistral-tiny",
            ],
            Self::OpenRouter => &["openrouter/auto"],
        }
    }

    pub fn supports_model(&self, model: &str) -> bool {
        self.available_models().contains(&model)
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "google" | "gemini" => Ok(Self::Google),
            "mistral" => Ok(Self::Mistral),
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(ProviderError::invalid_request(format!(
                "unknown provider '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(ProviderError::invalid_request(format!(
                "unknown message role '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
        }
    }

    pub fn from_prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(model, vec![Message::user(prompt)])
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::model_required());
        }

        match self.messages.last() {
            None => Err(ProviderError::invalid_request(
                "at least one message is required",
            )),
            Some(last) if last.content.trim().is_empty() => Err(ProviderError::invalid_request(
                "prompt must not be empty",
            )),
            Some(_) => match self.max_tokens {
                Some(0) => Err(ProviderError::invalid_request(
                    "max_tokens must be greater than zero",
                )),
                _ => Ok(()),
            },
        }
    }
}
