//! Edit-session error kinds and the engine-boundary error.
//!
//! ```rust
//! use pedit::{EditError, EditErrorKind};
//!
//! let err = EditError::git_operation_failed();
//! assert_eq!(err.kind, EditErrorKind::GitOperationFailed);
//! assert!(err.detail.as_deref().unwrap_or_default().contains("git repository"));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const GIT_FAILURE_MESSAGE: &str = "Git operation failed";
pub const GIT_FAILURE_HINT: &str =
    "Make sure the files are in a valid git repository and you have the necessary permissions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditErrorKind {
    InvalidRequest,
    FileNotFound,
    NoValidFiles,
    GitOperationFailed,
    EngineFailure,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditError {
    pub kind: EditErrorKind,
    pub message: String,
    /// Longer user-facing explanation, when one exists.
    pub detail: Option<String>,
}

impl EditError {
    pub fn new(kind: EditErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(EditErrorKind::InvalidRequest, message)
    }

    pub fn file_not_found(path: &Path) -> Self {
        Self::new(
            EditErrorKind::FileNotFound,
            format!("File not found: {}", path.display()),
        )
    }

    /// Lists the files excluded by sensitive-path markers in the detail.
    pub fn no_valid_files(skipped: &[PathBuf]) -> Self {
        let mut detail = "All selected files were skipped or invalid".to_string();
        for path in skipped {
            detail.push_str(&format!("\nSkipped: {}", path.display()));
        }
        Self::new(EditErrorKind::NoValidFiles, "No valid files to edit").with_detail(detail)
    }

    pub fn git_operation_failed() -> Self {
        Self::new(EditErrorKind::GitOperationFailed, GIT_FAILURE_MESSAGE)
            .with_detail(GIT_FAILURE_HINT)
    }

    pub fn engine_failure(message: impl Into<String>) -> Self {
        Self::new(EditErrorKind::EngineFailure, message)
    }

    pub fn busy() -> Self {
        Self::new(
            EditErrorKind::Busy,
            "another edit request is already being processed",
        )
    }
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for EditError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// The engine reported a version-control failure.
    Git,
    Launch,
    Exit,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn git(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Git, message)
    }

    pub fn launch(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Launch, message)
    }

    pub fn exit(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Exit, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Other, message)
    }

    /// Structured kind first; engines that cannot classify fall back to a text match.
    pub fn is_git_failure(&self) -> bool {
        self.kind == EngineErrorKind::Git || self.message.to_lowercase().contains("git")
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::{EngineError, EngineErrorKind};

    #[test]
    fn git_failures_are_detected_by_kind_or_text() {
        assert!(EngineError::git("push rejected").is_git_failure());
        assert!(EngineError::exit("fatal: not a Git repository").is_git_failure());
        assert!(!EngineError::exit("model overloaded").is_git_failure());
        assert_eq!(EngineError::launch("x").kind, EngineErrorKind::Launch);
    }
}
