//! Credential values, the active provider configuration, and credential errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::ProviderKind;

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub provider: ProviderKind,
    pub secret: SecretString,
}

impl Credential {
    pub fn new(provider: ProviderKind, secret: impl Into<String>) -> Self {
        Self {
            provider,
            secret: SecretString::new(secret),
        }
    }

    pub fn api_key(&self) -> &str {
        self.secret.expose()
    }
}

/// The provider configuration threaded through provider calls.
///
/// Built once by [`crate::CredentialResolver`] and passed explicitly to the
/// chat and edit layers rather than read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConfig {
    pub credential: Credential,
    pub model: String,
}

impl ActiveConfig {
    pub fn new(credential: Credential, model: impl Into<String>) -> Self {
        Self {
            credential,
            model: model.into(),
        }
    }

    pub fn for_default_model(credential: Credential) -> Self {
        let model = credential.provider.default_model();
        Self::new(credential, model)
    }

    pub fn provider(&self) -> ProviderKind {
        self.credential.provider
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialErrorKind {
    NoCredentialAvailable,
    InvalidSecret,
    Storage,
}

/// One failed secret lookup recorded during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub secret_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialError {
    pub kind: CredentialErrorKind,
    pub message: String,
    pub lookups: Vec<LookupFailure>,
}

impl CredentialError {
    pub fn new(kind: CredentialErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            lookups: Vec::new(),
        }
    }

    pub fn no_credential_available(lookups: Vec<LookupFailure>) -> Self {
        let tried = lookups
            .iter()
            .map(|lookup| format!("{}: {}", lookup.secret_name, lookup.reason))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            kind: CredentialErrorKind::NoCredentialAvailable,
            message: format!("no valid API keys found. Tried:\n{tried}"),
            lookups,
        }
    }

    pub fn invalid_secret(message: impl Into<String>) -> Self {
        Self::new(CredentialErrorKind::InvalidSecret, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(CredentialErrorKind::Storage, message)
    }
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for CredentialError {}

#[cfg(test)]
mod tests {
    use super::{ActiveConfig, Credential, CredentialError, LookupFailure, SecretString};
    use crate::ProviderKind;

    #[test]
    fn secret_debug_output_is_redacted() {
        let secret = SecretString::new("sk-live-123");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");

        let credential = Credential::new(ProviderKind::OpenAi, "sk-live-123");
        assert!(!format!("{credential:?}").contains("sk-live-123"));
    }

    #[test]
    fn default_model_follows_provider() {
        let config =
            ActiveConfig::for_default_model(Credential::new(ProviderKind::Google, "g-key"));
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.provider(), ProviderKind::Google);
    }

    #[test]
    fn no_credential_error_lists_every_lookup() {
        let error = CredentialError::no_credential_available(vec![
            LookupFailure {
                secret_name: "ANTHROPIC_API_KEY".to_string(),
                reason: "not set".to_string(),
            },
            LookupFailure {
                secret_name: "OPENAI_API_KEY".to_string(),
                reason: "empty value".to_string(),
            },
        ]);

        assert!(error.message.contains("ANTHROPIC_API_KEY: not set"));
        assert!(error.message.contains("OPENAI_API_KEY: empty value"));
        assert_eq!(error.lookups.len(), 2);
    }
}
