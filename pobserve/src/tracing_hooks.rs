//! Tracing-based hooks for provider calls and edit sessions.
//!
//! ```rust
//! use pobserve::TracingObservabilityHooks;
//! use pedit::EditSessionHooks;
//!
//! fn accepts_edit_hooks(_hooks: &dyn EditSessionHooks) {}
//!
//! accepts_edit_hooks(&TracingObservabilityHooks);
//! ```

use std::time::Duration;

use pedit::{EditError, EditPhase, EditSessionHooks};
use pprovider::{ProviderError, ProviderKind, ProviderOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_request_start(&self, provider: ProviderKind, operation: &str) {
        tracing::info!(
            phase = "provider",
            event = "request_start",
            provider = %provider,
            operation
        );
    }

    fn on_success(&self, provider: ProviderKind, operation: &str, elapsed: Duration) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_failure(
        &self,
        provider: ProviderKind,
        operation: &str,
        elapsed: Duration,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            status = error.status,
            error = %error
        );
    }
}

impl EditSessionHooks for TracingObservabilityHooks {
    fn on_phase_start(&self, phase: EditPhase) {
        tracing::info!(phase = "edit_session", event = "phase_start", edit_phase = ?phase);
    }

    fn on_session_success(&self, files_changed: usize, elapsed: Duration) {
        tracing::info!(
            phase = "edit_session",
            event = "session_success",
            files_changed,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_session_failure(&self, error: &EditError, elapsed: Duration) {
        tracing::error!(
            phase = "edit_session",
            event = "session_failure",
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }
}
