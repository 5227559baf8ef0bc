use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use pedit::{EditError, EditPhase, EditSessionHooks};
use pprovider::{ProviderError, ProviderKind, ProviderOperationHooks};

/// Wraps provider hooks so a panicking observer never takes a request down with it.
pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_request_start(&self, provider: ProviderKind, operation: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_request_start(provider, operation)
        }));
    }

    fn on_success(&self, provider: ProviderKind, operation: &str, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, operation, elapsed)
        }));
    }

    fn on_failure(
        &self,
        provider: ProviderKind,
        operation: &str,
        elapsed: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(provider, operation, elapsed, error)
        }));
    }
}

pub struct SafeEditHooks<H> {
    inner: H,
}

impl<H> SafeEditHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> EditSessionHooks for SafeEditHooks<H>
where
    H: EditSessionHooks,
{
    fn on_phase_start(&self, phase: EditPhase) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_phase_start(phase)));
    }

    fn on_session_success(&self, files_changed: usize, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_session_success(files_changed, elapsed)
        }));
    }

    fn on_session_failure(&self, error: &EditError, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_session_failure(error, elapsed)
        }));
    }
}
