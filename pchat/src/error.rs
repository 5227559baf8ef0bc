//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use pprovider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    Provider,
    NoActiveConversation,
    NotFound,
    Storage,
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    /// The underlying provider failure, including HTTP status and raw body when present.
    pub provider_error: Option<ProviderError>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider_error: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn no_active_conversation() -> Self {
        Self::new(
            ChatErrorKind::NoActiveConversation,
            "no active conversation; start a new conversation first",
        )
    }

    pub fn not_found(id: &str) -> Self {
        Self::new(ChatErrorKind::NotFound, format!("conversation {id} not found"))
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Storage, message)
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Export, message)
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.provider_error
            .as_ref()
            .map(|error| error as &(dyn Error + 'static))
    }
}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        Self {
            kind: ChatErrorKind::Provider,
            message: value.to_string(),
            provider_error: Some(value),
        }
    }
}
