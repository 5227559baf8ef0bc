//! Operational hook contracts for provider calls.

use std::time::Duration;

use crate::{ProviderError, ProviderKind};

pub trait ProviderOperationHooks: Send + Sync {
    fn on_request_start(&self, _provider: ProviderKind, _operation: &str) {}

    fn on_success(&self, _provider: ProviderKind, _operation: &str, _elapsed: Duration) {}

    fn on_failure(
        &self,
        _provider: ProviderKind,
        _operation: &str,
        _elapsed: Duration,
        _error: &ProviderError,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProviderOperationHooks for NoopOperationHooks {}
