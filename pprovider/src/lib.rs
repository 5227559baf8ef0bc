//! Provider layer: credential resolution, secret storage, and per-provider HTTP adapters.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pprovider::{
//!     CompletionRequest, CredentialResolver, InMemorySecretStore, ProviderClient, ProviderKind,
//!     ReqwestTransport,
//! };
//!
//! let store = InMemorySecretStore::new().with_secret("MISTRAL_API_KEY", "m-key");
//! let resolver = CredentialResolver::new(Arc::new(store)).with_env_export(false);
//! let active = resolver.resolve().expect("mistral key present");
//! assert_eq!(active.provider(), ProviderKind::Mistral);
//! assert_eq!(active.model, "mistral-large");
//!
//! let _client = ProviderClient::new(Arc::new(ReqwestTransport::new(reqwest::Client::new())));
//! let request = CompletionRequest::from_prompt(&active.model, "hello");
//! assert!(request.validate().is_ok());
//! ```

pub mod adapters;
pub mod client;
pub mod credentials;
pub mod error;
pub mod hooks;
pub mod model;
pub mod prelude;
pub mod resolver;
pub mod secrets;
pub mod transport;

pub type ProviderFuture<'a, T> = pcommon::BoxFuture<'a, T>;

pub use adapters::{
    AdapterRegistry, AnthropicAdapter, ChatCompletionsAdapter, GoogleAdapter, ProviderAdapter,
};
pub use client::ProviderClient;
pub use credentials::{
    ActiveConfig, Credential, CredentialError, CredentialErrorKind, LookupFailure, SecretString,
};
pub use error::{ProviderError, ProviderErrorKind};
pub use hooks::{NoopOperationHooks, ProviderOperationHooks};
pub use model::{CompletionRequest, Message, ProviderKind, Role};
pub use resolver::{CredentialResolver, DEFAULT_PROVIDER_PRIORITY, SecretChange};
pub use secrets::{EnvSecretStore, FileSecretStore, InMemorySecretStore, SecretStore};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
