//! Runtime hook contracts for observing edit-session phases.
//!
//! ```rust
//! use pedit::{EditSessionHooks, NoopEditSessionHooks};
//!
//! fn accepts_hooks(_hooks: &dyn EditSessionHooks) {}
//!
//! accepts_hooks(&NoopEditSessionHooks);
//! ```

use std::time::Duration;

use crate::{EditError, EditPhase};

pub trait EditSessionHooks: Send + Sync {
    fn on_phase_start(&self, _phase: EditPhase) {}

    fn on_session_success(&self, _files_changed: usize, _elapsed: Duration) {}

    fn on_session_failure(&self, _error: &EditError, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEditSessionHooks;

impl EditSessionHooks for NoopEditSessionHooks {}
