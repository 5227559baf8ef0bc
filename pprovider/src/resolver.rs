//! Credential discovery over a prioritized list of provider secret names.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pprovider::{CredentialResolver, InMemorySecretStore, ProviderKind};
//!
//! let store = InMemorySecretStore::new().with_secret("OPENAI_API_KEY", "x");
//! let resolver = CredentialResolver::new(Arc::new(store)).with_env_export(false);
//!
//! let active = resolver.resolve().expect("openai key present");
//! assert_eq!(active.provider(), ProviderKind::OpenAi);
//! ```

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use crate::secrets::export_to_process_env;
use crate::{
    ActiveConfig, Credential, CredentialError, LookupFailure, ProviderKind, SecretStore,
};

pub const DEFAULT_PROVIDER_PRIORITY: [ProviderKind; 5] = ProviderKind::ALL;

const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Notification published after a credential is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretChange {
    pub secret_name: String,
    pub provider: ProviderKind,
}

/// Resolves and owns the process's active provider configuration.
///
/// Resolution and saves must come from one logical owner at a time; concurrent
/// resolution is not coordinated beyond the interior lock.
#[derive(Debug)]
pub struct CredentialResolver {
    store: Arc<dyn SecretStore>,
    priority: Vec<ProviderKind>,
    export_env: bool,
    active: RwLock<Option<Arc<ActiveConfig>>>,
    changes: broadcast::Sender<SecretChange>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            store,
            priority: DEFAULT_PROVIDER_PRIORITY.to_vec(),
            export_env: true,
            active: RwLock::new(None),
            changes,
        }
    }

    pub fn with_priority(mut self, priority: Vec<ProviderKind>) -> Self {
        self.priority = priority;
        self
    }

    /// Controls whether resolved and saved secrets are mirrored into the process environment.
    pub fn with_env_export(mut self, export_env: bool) -> Self {
        self.export_env = export_env;
        self
    }

    pub fn priority(&self) -> &[ProviderKind] {
        &self.priority
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SecretChange> {
        self.changes.subscribe()
    }

    pub fn active(&self) -> Option<Arc<ActiveConfig>> {
        self.active.read().ok().and_then(|active| active.clone())
    }

    /// Walks the priority list and activates the first provider with a usable secret.
    pub fn resolve(&self) -> Result<Arc<ActiveConfig>, CredentialError> {
        let mut lookups = Vec::new();

        for provider in &self.priority {
            let secret_name = provider.secret_name();
            let value = match self.store.get(secret_name) {
                Ok(Some(value)) if !value.trim().is_empty() => value,
                Ok(Some(_)) => {
                    lookups.push(lookup_failure(secret_name, "empty value"));
                    continue;
                }
                Ok(None) => {
                    lookups.push(lookup_failure(secret_name, "not set"));
                    continue;
                }
                Err(error) => {
                    lookups.push(lookup_failure(secret_name, error.message));
                    continue;
                }
            };

            if self.export_env {
                export_to_process_env(secret_name, &value);
            }

            let provider = ProviderKind::from_secret_name(secret_name).unwrap_or(*provider);
            let config = Arc::new(ActiveConfig::for_default_model(Credential::new(
                provider, value,
            )));
            self.set_active(Arc::clone(&config))?;

            tracing::info!(
                phase = "credentials",
                event = "resolved",
                provider = %provider,
                secret = secret_name,
                model = %config.model
            );
            return Ok(config);
        }

        tracing::error!(
            phase = "credentials",
            event = "unresolved",
            attempts = lookups.len()
        );
        Err(CredentialError::no_credential_available(lookups))
    }

    /// Persists a provider secret and refreshes the active configuration when it is affected.
    pub fn save_credential(
        &self,
        provider: ProviderKind,
        secret: &str,
    ) -> Result<(), CredentialError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(CredentialError::invalid_secret(format!(
                "{} must not be empty",
                provider.secret_name()
            )));
        }

        let secret_name = provider.secret_name();
        self.store.set(secret_name, secret)?;
        if self.export_env {
            export_to_process_env(secret_name, secret);
        }

        if let Some(current) = self.active()
            && current.provider() == provider
        {
            let refreshed = ActiveConfig::new(Credential::new(provider, secret), &current.model);
            self.set_active(Arc::new(refreshed))?;
        }

        tracing::info!(
            phase = "credentials",
            event = "saved",
            provider = %provider,
            secret = secret_name
        );

        // No subscribers is not an error.
        let _ = self.changes.send(SecretChange {
            secret_name: secret_name.to_string(),
            provider,
        });
        Ok(())
    }

    /// Replaces the model of the active configuration.
    pub fn select_model(&self, model: &str) -> Result<Arc<ActiveConfig>, CredentialError> {
        let Some(current) = self.active() else {
            return Err(CredentialError::no_credential_available(Vec::new()));
        };
        let updated = Arc::new(current.as_ref().clone().with_model(model));
        self.set_active(Arc::clone(&updated))?;
        Ok(updated)
    }

    fn set_active(&self, config: Arc<ActiveConfig>) -> Result<(), CredentialError> {
        let mut active = self
            .active
            .write()
            .map_err(|_| CredentialError::storage("active configuration lock poisoned"))?;
        *active = Some(config);
        Ok(())
    }
}

fn lookup_failure(secret_name: &str, reason: impl Into<String>) -> LookupFailure {
    LookupFailure {
        secret_name: secret_name.to_string(),
        reason: reason.into(),
    }
}
