//! Metrics-based hooks for provider calls and edit sessions.
//!
//! ```rust
//! use pobserve::MetricsObservabilityHooks;
//! use pprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! accepts_provider_hooks(&MetricsObservabilityHooks);
//! ```

use std::time::Duration;

use pedit::{EditError, EditPhase, EditSessionHooks};
use pprovider::{ProviderError, ProviderKind, ProviderOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_request_start(&self, provider: ProviderKind, operation: &str) {
        metrics::counter!(
            "parlance_provider_request_start_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_success(&self, provider: ProviderKind, operation: &str, elapsed: Duration) {
        metrics::counter!(
            "parlance_provider_success_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "parlance_provider_request_duration_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_failure(
        &self,
        provider: ProviderKind,
        operation: &str,
        elapsed: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "parlance_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parlance_provider_request_duration_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl EditSessionHooks for MetricsObservabilityHooks {
    fn on_phase_start(&self, phase: EditPhase) {
        metrics::counter!("parlance_edit_phase_start_total", "phase" => format!("{:?}", phase))
            .increment(1);
    }

    fn on_session_success(&self, files_changed: usize, elapsed: Duration) {
        metrics::counter!("parlance_edit_session_success_total").increment(1);
        metrics::histogram!("parlance_edit_files_changed").record(files_changed as f64);
        metrics::histogram!("parlance_edit_session_duration_seconds", "status" => "success")
            .record(elapsed.as_secs_f64());
    }

    fn on_session_failure(&self, error: &EditError, elapsed: Duration) {
        metrics::counter!(
            "parlance_edit_session_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("parlance_edit_session_duration_seconds", "status" => "failure")
            .record(elapsed.as_secs_f64());
    }
}
