//! The narrow boundary to an external coding-assistant engine.

use std::path::{Path, PathBuf};

use crate::EngineError;

/// Main editing model plus the optional helper model used for summaries and commit messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPair {
    pub main: String,
    pub weak: Option<String>,
}

impl ModelPair {
    pub fn new(main: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            weak: None,
        }
    }

    pub fn with_weak(mut self, weak: impl Into<String>) -> Self {
        self.weak = Some(weak.into());
        self
    }
}

/// One edit the engine applied, naming the file it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEdit {
    pub file: PathBuf,
    /// Diff or replacement content; empty when the engine only reported the file.
    pub content: String,
}

impl EngineEdit {
    pub fn new(file: impl AsRef<Path>, content: impl Into<String>) -> Self {
        Self {
            file: file.as_ref().to_path_buf(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    pub edits: Vec<EngineEdit>,
    pub summary: Option<String>,
    pub tool_output: Option<String>,
}

/// Accumulates everything the engine prints during a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleCapture {
    chunks: Vec<String>,
}

impl ConsoleCapture {
    pub fn print(&mut self, text: impl Into<String>) {
        self.chunks.push(text.into());
    }

    pub fn output(&self) -> String {
        self.chunks.concat()
    }

    pub fn last_output(&self) -> Option<&str> {
        self.chunks.last().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}

/// A coding-assistant engine driven for one edit attempt at a time.
///
/// Implementations own their tracked-file state; callers must invoke
/// [`CodeEditEngine::clear_files`] once a request finishes, whatever its outcome.
pub trait CodeEditEngine: Send + std::fmt::Debug {
    fn initialize(&mut self, models: &ModelPair) -> Result<(), EngineError>;

    fn run(&mut self, instruction: &str, files: &[PathBuf]) -> Result<EngineOutput, EngineError>;

    fn clear_files(&mut self);

    fn tracked_files(&self) -> &[PathBuf];

    fn console_output(&self) -> String;

    fn clear_console(&mut self);
}
