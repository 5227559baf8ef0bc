//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use pprovider::{ProviderError, ProviderErrorKind};
//!
//! let missing = ProviderError::model_required();
//! assert_eq!(missing.kind, ProviderErrorKind::InvalidRequest);
//!
//! let failed = ProviderError::status(500, "{\"error\":\"boom\"}", "boom");
//! assert_eq!(failed.status, Some(500));
//! assert!(failed.retryable);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Authentication,
    InvalidRequest,
    Status,
    ResponseShape,
    Timeout,
    Transport,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// Whether a caller-side retry could plausibly succeed. The client itself never retries.
    pub retryable: bool,
    pub status: Option<u16>,
    pub body: Option<String>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            status: None,
            body: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message, false)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn model_required() -> Self {
        Self::invalid_request("model is required")
    }

    /// Non-2xx HTTP response. The raw body is always preserved.
    pub fn status(status: u16, body: impl Into<String>, message: impl Into<String>) -> Self {
        let retryable = status == 408 || status == 429 || status >= 500;
        Self {
            kind: ProviderErrorKind::Status,
            message: message.into(),
            retryable,
            status: Some(status),
            body: Some(body.into()),
        }
    }

    pub fn response_shape(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ResponseShape, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{:?} ({status}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::{ProviderError, ProviderErrorKind};

    #[test]
    fn status_errors_keep_code_and_body() {
        let error = ProviderError::status(503, "down for maintenance", "service unavailable");
        assert_eq!(error.kind, ProviderErrorKind::Status);
        assert_eq!(error.body.as_deref(), Some("down for maintenance"));
        assert_eq!(error.to_string(), "Status (503): service unavailable");
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!ProviderError::status(401, "", "unauthorized").retryable);
        assert!(ProviderError::status(429, "", "slow down").retryable);
    }
}
