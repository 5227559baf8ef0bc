//! [`CodeEditEngine`] backed by the `aider` command-line tool.
//!
//! ```rust
//! use pedit::parse_transcript;
//!
//! let parsed = parse_transcript("I renamed the helper.\nApplied edit to src/app.py\n");
//! assert_eq!(parsed.edits.len(), 1);
//! assert_eq!(parsed.summary.as_deref(), Some("I renamed the helper."));
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{CodeEditEngine, ConsoleCapture, EngineEdit, EngineError, EngineOutput, ModelPair};

pub const DEFAULT_AIDER_BINARY: &str = "aider";

const APPLIED_EDIT_PREFIX: &str = "Applied edit to ";
const SEARCH_MARKER: &str = "<<<<<<< SEARCH";
const REPLACE_MARKER: &str = ">>>>>>> REPLACE";
const FENCE: &str = "```";

#[derive(Debug)]
pub struct AiderCliEngine {
    program: OsString,
    launcher_args: Vec<OsString>,
    models: Option<ModelPair>,
    files: Vec<PathBuf>,
    console: ConsoleCapture,
}

impl Default for AiderCliEngine {
    fn default() -> Self {
        Self::new(DEFAULT_AIDER_BINARY)
    }
}

impl AiderCliEngine {
    /// `program` is looked up on `PATH` unless it is already a path.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            launcher_args: Vec::new(),
            models: None,
            files: Vec::new(),
            console: ConsoleCapture::default(),
        }
    }

    /// Arguments placed before the engine's own, e.g. `python -m aider`.
    pub fn with_launcher_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.launcher_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn models(&self) -> Option<&ModelPair> {
        self.models.as_ref()
    }

    fn locate(&self) -> Result<PathBuf, EngineError> {
        which::which(&self.program).map_err(|error| {
            EngineError::launch(format!(
                "could not locate {}: {error}",
                Path::new(&self.program).display()
            ))
        })
    }

    fn command(&self, program: &Path, models: &ModelPair, instruction: &str) -> Command {
        let mut command = Command::new(program);
        command
            .args(&self.launcher_args)
            .args(["--yes-always", "--no-pretty", "--no-stream"])
            .arg("--model")
            .arg(&models.main);
        if let Some(weak) = &models.weak {
            command.arg("--weak-model").arg(weak);
        }
        command.arg("--message").arg(instruction).args(&self.files);
        if let Some(dir) = self.files.first().and_then(|file| file.parent()) {
            command.current_dir(dir);
        }
        command
    }
}

impl CodeEditEngine for AiderCliEngine {
    fn initialize(&mut self, models: &ModelPair) -> Result<(), EngineError> {
        if models.main.trim().is_empty() {
            return Err(EngineError::other("main model must not be empty"));
        }
        self.locate()?;
        self.models = Some(models.clone());
        tracing::debug!(
            phase = "edit_engine",
            event = "initialized",
            main_model = %models.main,
            weak_model = models.weak.as_deref().unwrap_or("")
        );
        Ok(())
    }

    fn run(&mut self, instruction: &str, files: &[PathBuf]) -> Result<EngineOutput, EngineError> {
        let models = self
            .models
            .clone()
            .ok_or_else(|| EngineError::other("engine used before initialization"))?;
        let program = self.locate()?;
        self.files = files.to_vec();

        let output = self
            .command(&program, &models, instruction)
            .output()
            .map_err(|error| EngineError::launch(format!("failed to start engine: {error}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stdout.is_empty() {
            self.console.print(stdout.clone());
        }
        if !stderr.is_empty() {
            self.console.print(stderr.clone());
        }

        if !output.status.success() {
            let message = match stderr.trim() {
                "" => format!("engine exited with {}", output.status),
                trimmed => trimmed.to_string(),
            };
            return Err(if message.to_lowercase().contains("git") {
                EngineError::git(message)
            } else {
                EngineError::exit(message)
            });
        }

        let mut parsed = parse_transcript(&stdout);
        let warnings = stderr.trim();
        if !warnings.is_empty() {
            parsed.tool_output = Some(warnings.to_string());
        }
        Ok(parsed)
    }

    fn clear_files(&mut self) {
        self.files.clear();
    }

    fn tracked_files(&self) -> &[PathBuf] {
        &self.files
    }

    fn console_output(&self) -> String {
        self.console.output()
    }

    fn clear_console(&mut self) {
        self.console.clear();
    }
}

/// Extracts edit blocks, applied-edit notices, and the free-text reply from engine output.
pub fn parse_transcript(stdout: &str) -> EngineOutput {
    let lines: Vec<&str> = stdout.lines().collect();
    let mut consumed = vec![false; lines.len()];
    let mut edits: Vec<EngineEdit> = Vec::new();

    let mut index = 0;
    while index < lines.len() {
        let trimmed = lines[index].trim();
        if trimmed == SEARCH_MARKER {
            let file = claim_block_header(&lines, &mut consumed, index);
            let start = index;
            while index + 1 < lines.len() && lines[index].trim() != REPLACE_MARKER {
                index += 1;
            }
            consumed[start..=index].iter_mut().for_each(|flag| *flag = true);
            edits.push(EngineEdit::new(file, lines[start..=index].join("\n")));

            if lines
                .get(index + 1)
                .is_some_and(|line| line.trim().starts_with(FENCE))
            {
                index += 1;
                consumed[index] = true;
            }
        } else if let Some(path) = trimmed.strip_prefix(APPLIED_EDIT_PREFIX) {
            consumed[index] = true;
            let path = Path::new(path.trim());
            if let Some(unnamed) = edits
                .iter_mut()
                .find(|edit| edit.file.as_os_str().is_empty())
            {
                unnamed.file = path.to_path_buf();
            } else if !edits.iter().any(|edit| edit.file == path) {
                edits.push(EngineEdit::new(path, ""));
            }
        }
        index += 1;
    }

    let summary = lines
        .iter()
        .zip(&consumed)
        .filter(|(_, consumed)| !**consumed)
        .map(|(line, _)| *line)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    EngineOutput {
        edits,
        summary: (!summary.is_empty()).then_some(summary),
        tool_output: None,
    }
}

/// Claims the opening fence and file-name line preceding a SEARCH marker.
fn claim_block_header(lines: &[&str], consumed: &mut [bool], search_index: usize) -> PathBuf {
    let mut cursor = search_index;
    while cursor > 0 {
        cursor -= 1;
        if consumed[cursor] {
            break;
        }
        let trimmed = lines[cursor].trim();
        if trimmed.starts_with(FENCE) {
            consumed[cursor] = true;
            continue;
        }
        if looks_like_path(trimmed) {
            consumed[cursor] = true;
            return PathBuf::from(trimmed);
        }
        break;
    }
    PathBuf::new()
}

/// A single token such as `src/app.py` or `Makefile`; prose like "Here is the change:" is not.
fn looks_like_path(line: &str) -> bool {
    !line.is_empty()
        && !line.chars().any(char::is_whitespace)
        && !line.ends_with([':', '.', ',', '!', '?'])
        && !line.starts_with(['#', '*', '>', '-'])
}
