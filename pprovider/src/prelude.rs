//! Common `pprovider` imports for downstream crates.

pub use crate::{
    ActiveConfig, CompletionRequest, Credential, CredentialError, CredentialErrorKind,
    CredentialResolver, Message, NoopOperationHooks, ProviderClient, ProviderError,
    ProviderErrorKind, ProviderKind, ProviderOperationHooks, Role, SecretChange, SecretStore,
};
pub use pcommon::BoxFuture;
