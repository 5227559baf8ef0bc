//! The edit-session controller: validate, dispatch once, collect.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Instant;

use pcommon::normalize_text;

use crate::{
    CodeEditEngine, EditError, EditSessionHooks, EngineError, EngineOutput, ModelPair,
    NoopEditSessionHooks,
};

/// Path fragments that exclude a file from editing.
pub const SENSITIVE_PATH_MARKERS: [&str; 4] = [".git", ".env", "venv", "__pycache__"];

pub const NO_CHANGES_MESSAGE: &str = "No changes were needed.";

const GUIDELINES: &str = "\
Please make the changes needed while following these guidelines:
1. Show the changes in diff format
2. Only modify the specified files
3. Keep the changes minimal and focused
4. Preserve existing code style
5. Add comments for complex changes
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    Idle,
    Validating,
    Dispatching,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEditRequest {
    pub instruction: String,
    pub files: Vec<PathBuf>,
    pub models: ModelPair,
}

impl CodeEditRequest {
    pub fn new(instruction: impl Into<String>, files: Vec<PathBuf>, models: ModelPair) -> Self {
        Self {
            instruction: instruction.into(),
            files,
            models,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    pub file: PathBuf,
    pub diff_or_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSuccess {
    pub edits: Vec<FileEdit>,
    pub message: String,
    /// Distinct files touched, in first-edit order.
    pub files_changed: Vec<PathBuf>,
    pub console_output: String,
    pub skipped_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFailure {
    pub error: EditError,
    pub console_output: String,
    pub skipped_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeEditResult {
    Success(EditSuccess),
    Failure(EditFailure),
}

impl CodeEditResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn console_output(&self) -> &str {
        match self {
            Self::Success(success) => &success.console_output,
            Self::Failure(failure) => &failure.console_output,
        }
    }

    pub fn error(&self) -> Option<&EditError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(&failure.error),
        }
    }
}

/// Files accepted for one request. Built fresh per request and dropped with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedFiles {
    pub files: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Resolves each path, rejecting missing files and setting sensitive ones aside.
///
/// The accepted set may be empty; callers decide whether that is fatal.
pub fn validate_files(requested: &[PathBuf]) -> Result<ValidatedFiles, EditError> {
    let mut validated = ValidatedFiles::default();

    for path in requested {
        if !path.exists() {
            return Err(EditError::file_not_found(path));
        }
        let absolute = std::fs::canonicalize(path).map_err(|_| EditError::file_not_found(path))?;

        if is_sensitive(&absolute) {
            validated.skipped.push(absolute);
        } else if !validated.files.contains(&absolute) {
            validated.files.push(absolute);
        }
    }

    Ok(validated)
}

pub fn is_sensitive(path: &Path) -> bool {
    let lowered = path.to_string_lossy().to_lowercase();
    SENSITIVE_PATH_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// The full instruction handed to the engine.
pub fn compose_instruction(request_text: &str, files: &[PathBuf]) -> String {
    let listing = files
        .iter()
        .map(|file| {
            let name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            format!("- {name}")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Please help me modify the code according to these instructions:\n\n{}\n\nThe files available for editing are:\n{listing}\n\n{GUIDELINES}",
        normalize_text(request_text)
    )
}

/// Drives one engine through validated, single-attempt edit requests.
pub struct CodeEditSession<E> {
    engine: E,
    initialized_with: Option<ModelPair>,
    phase: EditPhase,
    hooks: Arc<dyn EditSessionHooks>,
}

impl<E: std::fmt::Debug> std::fmt::Debug for CodeEditSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeEditSession")
            .field("engine", &self.engine)
            .field("initialized_with", &self.initialized_with)
            .field("phase", &self.phase)
            .finish()
    }
}

impl<E: CodeEditEngine> CodeEditSession<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            initialized_with: None,
            phase: EditPhase::Idle,
            hooks: Arc::new(NoopEditSessionHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn EditSessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Runs one request to completion. The engine's tracked files are cleared on every exit path.
    pub fn process(&mut self, request: CodeEditRequest) -> CodeEditResult {
        let started = Instant::now();
        self.engine.clear_console();

        let mut skipped = Vec::new();
        let outcome = self.run_phases(&request, &mut skipped).map_err(sanitize);
        self.engine.clear_files();
        self.enter(EditPhase::Completed);

        let console_output = self.engine.console_output();
        let elapsed = started.elapsed();
        match outcome {
            Ok(output) => {
                let success = collect_success(output, console_output, skipped);
                self.hooks
                    .on_session_success(success.files_changed.len(), elapsed);
                tracing::info!(
                    phase = "edit_session",
                    event = "completed",
                    edits = success.edits.len(),
                    files_changed = success.files_changed.len(),
                    skipped = success.skipped_files.len()
                );
                CodeEditResult::Success(success)
            }
            Err(error) => {
                self.hooks.on_session_failure(&error, elapsed);
                tracing::warn!(
                    phase = "edit_session",
                    event = "failed",
                    kind = ?error.kind,
                    error = %error.message
                );
                CodeEditResult::Failure(EditFailure {
                    error,
                    console_output,
                    skipped_files: skipped,
                })
            }
        }
    }

    fn run_phases(
        &mut self,
        request: &CodeEditRequest,
        skipped: &mut Vec<PathBuf>,
    ) -> Result<EngineOutput, EditError> {
        self.enter(EditPhase::Validating);
        if request.instruction.trim().is_empty() {
            return Err(EditError::invalid_request("edit instructions must not be empty"));
        }
        let validated = validate_files(&request.files)?;
        skipped.clone_from(&validated.skipped);
        if validated.files.is_empty() {
            return Err(EditError::no_valid_files(&validated.skipped));
        }

        self.enter(EditPhase::Dispatching);
        if self.initialized_with.as_ref() != Some(&request.models) {
            self.initialized_with = None;
            self.engine
                .initialize(&request.models)
                .map_err(classify_engine_error)?;
            self.initialized_with = Some(request.models.clone());
        }

        let instruction = compose_instruction(&request.instruction, &validated.files);
        self.engine
            .run(&instruction, &validated.files)
            .map_err(classify_engine_error)
    }

    fn enter(&mut self, phase: EditPhase) {
        self.phase = phase;
        self.hooks.on_phase_start(phase);
    }
}

/// A session guarded for single-flight use from several threads.
#[derive(Debug)]
pub struct SharedEditSession<E> {
    inner: Arc<Mutex<CodeEditSession<E>>>,
}

impl<E> Clone for SharedEditSession<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: CodeEditEngine> SharedEditSession<E> {
    pub fn new(session: CodeEditSession<E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Processes the request unless another one is in flight, in which case it fails with `Busy`.
    pub fn try_process(&self, request: CodeEditRequest) -> CodeEditResult {
        let mut session = match self.inner.try_lock() {
            Ok(session) => session,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                tracing::warn!(phase = "edit_session", event = "busy");
                return CodeEditResult::Failure(EditFailure {
                    error: EditError::busy(),
                    console_output: String::new(),
                    skipped_files: Vec::new(),
                });
            }
        };
        session.process(request)
    }
}

fn collect_success(
    output: EngineOutput,
    console_output: String,
    skipped: Vec<PathBuf>,
) -> EditSuccess {
    let summary = output
        .summary
        .map(|summary| normalize_text(&summary))
        .filter(|summary| !summary.trim().is_empty())
        .unwrap_or_else(|| NO_CHANGES_MESSAGE.to_string());

    let message = match output.tool_output.map(|tool| normalize_text(&tool)) {
        Some(tool) if !tool.is_empty() => format!("{tool}\n\n{summary}"),
        _ => summary,
    };

    let mut files_changed: Vec<PathBuf> = Vec::new();
    for edit in &output.edits {
        if !files_changed.contains(&edit.file) {
            files_changed.push(edit.file.clone());
        }
    }

    EditSuccess {
        edits: output
            .edits
            .into_iter()
            .map(|edit| FileEdit {
                file: edit.file,
                diff_or_content: edit.content,
            })
            .collect(),
        message,
        files_changed,
        console_output,
        skipped_files: skipped,
    }
}

fn classify_engine_error(error: EngineError) -> EditError {
    if error.is_git_failure() {
        EditError::git_operation_failed()
    } else {
        EditError::engine_failure(error.message.clone()).with_detail(error.message)
    }
}

fn sanitize(mut error: EditError) -> EditError {
    error.message = normalize_text(&error.message);
    error.detail = error.detail.map(|detail| normalize_text(&detail));
    error
}
