//! Code-edit sessions over an external coding-assistant engine.
//!
//! A session validates the requested files, composes one instruction, hands it
//! to the engine for a single attempt, and always leaves the engine with no
//! tracked files afterwards.
//!
//! ```rust
//! use std::path::PathBuf;
//!
//! use pedit::{compose_instruction, is_sensitive};
//!
//! let instruction = compose_instruction("add logging", &[PathBuf::from("/src/app.py")]);
//! assert!(instruction.contains("- app.py"));
//! assert!(is_sensitive(&PathBuf::from("/src/.env")));
//! ```

mod aider;
mod engine;
mod error;
mod hooks;
mod session;

pub mod prelude {
    pub use crate::{
        CodeEditEngine, CodeEditRequest, CodeEditResult, CodeEditSession, EditError,
        EditErrorKind, EditPhase, EditSessionHooks, ModelPair, SharedEditSession,
    };
}

pub use aider::{AiderCliEngine, DEFAULT_AIDER_BINARY, parse_transcript};
pub use engine::{CodeEditEngine, ConsoleCapture, EngineEdit, EngineOutput, ModelPair};
pub use error::{
    EditError, EditErrorKind, EngineError, EngineErrorKind, GIT_FAILURE_HINT, GIT_FAILURE_MESSAGE,
};
pub use hooks::{EditSessionHooks, NoopEditSessionHooks};
pub use session::{
    CodeEditRequest, CodeEditResult, CodeEditSession, EditFailure, EditPhase, EditSuccess,
    FileEdit, NO_CHANGES_MESSAGE, SENSITIVE_PATH_MARKERS, SharedEditSession, ValidatedFiles,
    compose_instruction, is_sensitive, validate_files,
};
