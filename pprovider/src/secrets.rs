//! Persistent per-user secret stores keyed by provider secret name.
//!
//! ```rust
//! use pprovider::{InMemorySecretStore, SecretStore};
//!
//! let store = InMemorySecretStore::new();
//! store.set("OPENAI_API_KEY", "sk-test").unwrap();
//! assert_eq!(store.get("OPENAI_API_KEY").unwrap().as_deref(), Some("sk-test"));
//! assert_eq!(store.get("GOOGLE_API_KEY").unwrap(), None);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::CredentialError;

pub trait SecretStore: Send + Sync + std::fmt::Debug {
    /// Returns `Ok(None)` when the secret is not set.
    fn get(&self, name: &str) -> Result<Option<String>, CredentialError>;

    fn set(&self, name: &str, value: &str) -> Result<(), CredentialError>;

    fn remove(&self, name: &str) -> Result<bool, CredentialError>;
}

#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut secrets) = self.secrets.lock() {
            secrets.insert(name.into(), value.into());
        }
        self
    }
}

impl SecretStore for InMemorySecretStore {
    fn get(&self, name: &str) -> Result<Option<String>, CredentialError> {
        let secrets = self
            .secrets
            .lock()
            .map_err(|_| CredentialError::storage("secret store lock poisoned"))?;
        Ok(secrets.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), CredentialError> {
        let mut secrets = self
            .secrets
            .lock()
            .map_err(|_| CredentialError::storage("secret store lock poisoned"))?;
        secrets.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<bool, CredentialError> {
        let mut secrets = self
            .secrets
            .lock()
            .map_err(|_| CredentialError::storage("secret store lock poisoned"))?;
        Ok(secrets.remove(name).is_some())
    }
}

/// Reads and writes secrets through the current process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretStore;

impl SecretStore for EnvSecretStore {
    fn get(&self, name: &str) -> Result<Option<String>, CredentialError> {
        match std::env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(error) => Err(CredentialError::storage(format!(
                "environment variable {name} is unreadable: {error}"
            ))),
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<(), CredentialError> {
        export_to_process_env(name, value);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<bool, CredentialError> {
        let existed = std::env::var_os(name).is_some();
        // SAFETY: secret mutation is serialized by the single credential owner.
        unsafe {
            std::env::remove_var(name);
        }
        Ok(existed)
    }
}

/// JSON file of `{ "SECRET_NAME": "value" }`, shared by every process of the user.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let bytes = fs::read(&self.path).map_err(|error| {
            CredentialError::storage(format!(
                "failed to read secret store {}: {error}",
                self.path.display()
            ))
        })?;
        serde_json::from_slice(&bytes).map_err(|error| {
            CredentialError::storage(format!(
                "secret store {} is corrupt: {error}",
                self.path.display()
            ))
        })
    }

    fn save(&self, secrets: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        let bytes = serde_json::to_vec_pretty(secrets).map_err(|error| {
            CredentialError::storage(format!("failed to serialize secret store: {error}"))
        })?;
        write_atomic(&self.path, &bytes)
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, name: &str) -> Result<Option<String>, CredentialError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| CredentialError::storage("secret store lock poisoned"))?;
        Ok(self.load()?.remove(name))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), CredentialError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| CredentialError::storage("secret store lock poisoned"))?;
        let mut secrets = self.load()?;
        secrets.insert(name.to_string(), value.to_string());
        self.save(&secrets)
    }

    fn remove(&self, name: &str) -> Result<bool, CredentialError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| CredentialError::storage("secret store lock poisoned"))?;
        let mut secrets = self.load()?;
        let removed = secrets.remove(name).is_some();
        if removed {
            self.save(&secrets)?;
        }
        Ok(removed)
    }
}

pub(crate) fn export_to_process_env(name: &str, value: &str) {
    // SAFETY: secret mutation is serialized by the single credential owner.
    unsafe {
        std::env::set_var(name, value);
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CredentialError> {
    let Some(parent) = path.parent() else {
        return Err(CredentialError::storage(
            "secret store file missing parent directory",
        ));
    };
    fs::create_dir_all(parent).map_err(|error| {
        CredentialError::storage(format!("failed to create secret store directory: {error}"))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        CredentialError::storage(format!("failed to write temporary secret file: {error}"))
    })?;
    restrict_permissions(&tmp)?;

    fs::rename(&tmp, path).map_err(|error| {
        CredentialError::storage(format!("failed to finalize secret store file: {error}"))
    })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), CredentialError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|error| {
        CredentialError::storage(format!("failed to restrict secret file permissions: {error}"))
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), CredentialError> {
    Ok(())
}
