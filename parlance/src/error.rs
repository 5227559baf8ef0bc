use std::error::Error;
use std::fmt::{Display, Formatter};

use pchat::ChatError;
use pprovider::{CredentialError, ProviderError};

use crate::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbenchErrorKind {
    Config,
    Credential,
    InvalidRequest,
    Provider,
    Chat,
    Dispatch,
}

#[derive(Debug, Clone)]
pub struct WorkbenchError {
    pub kind: WorkbenchErrorKind,
    pub message: String,
    pub chat_error: Option<ChatError>,
    pub provider_error: Option<ProviderError>,
}

impl WorkbenchError {
    pub fn new(kind: WorkbenchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            chat_error: None,
            provider_error: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(WorkbenchErrorKind::Config, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(WorkbenchErrorKind::InvalidRequest, message)
    }

    pub fn unsupported_model(provider: pprovider::ProviderKind, model: &str) -> Self {
        Self::invalid_request(format!("unsupported model '{model}' for {provider}"))
    }
}

impl Display for WorkbenchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for WorkbenchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Some(error) = &self.chat_error {
            return Some(error);
        }
        self.provider_error
            .as_ref()
            .map(|error| error as &(dyn Error + 'static))
    }
}

impl From<CredentialError> for WorkbenchError {
    fn from(error: CredentialError) -> Self {
        Self::new(WorkbenchErrorKind::Credential, error.to_string())
    }
}

impl From<ProviderError> for WorkbenchError {
    fn from(error: ProviderError) -> Self {
        Self {
            kind: WorkbenchErrorKind::Provider,
            message: error.message.clone(),
            chat_error: None,
            provider_error: Some(error),
        }
    }
}

impl From<ChatError> for WorkbenchError {
    fn from(error: ChatError) -> Self {
        Self {
            kind: WorkbenchErrorKind::Chat,
            message: error.message.clone(),
            chat_error: Some(error),
            provider_error: None,
        }
    }
}

impl From<DispatchError> for WorkbenchError {
    fn from(error: DispatchError) -> Self {
        Self::new(WorkbenchErrorKind::Dispatch, error.to_string())
    }
}
