use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pedit::{
    CodeEditEngine, CodeEditRequest, CodeEditResult, CodeEditSession, EditError, EditErrorKind,
    EditPhase, EditSessionHooks, EngineEdit, EngineError, EngineOutput, GIT_FAILURE_HINT,
    ModelPair, NO_CHANGES_MESSAGE,
};

#[derive(Debug, Default)]
struct EngineLog {
    initialized: Vec<ModelPair>,
    runs: Vec<(String, Vec<PathBuf>)>,
    tracked_during_run: Vec<usize>,
}

#[derive(Debug)]
struct FakeEngine {
    log: Arc<Mutex<EngineLog>>,
    reply: Result<EngineOutput, EngineError>,
    files: Vec<PathBuf>,
    console: String,
}

impl FakeEngine {
    fn new(reply: Result<EngineOutput, EngineError>) -> (Self, Arc<Mutex<EngineLog>>) {
        let log = Arc::new(Mutex::new(EngineLog::default()));
        (
            Self {
                log: log.clone(),
                reply,
                files: Vec::new(),
                console: String::new(),
            },
            log,
        )
    }
}

impl CodeEditEngine for FakeEngine {
    fn initialize(&mut self, models: &ModelPair) -> Result<(), EngineError> {
        self.log
            .lock()
            .expect("log lock")
            .initialized
            .push(models.clone());
        Ok(())
    }

    fn run(&mut self, instruction: &str, files: &[PathBuf]) -> Result<EngineOutput, EngineError> {
        self.files = files.to_vec();
        self.console.push_str("> running edit\n");
        let mut log = self.log.lock().expect("log lock");
        log.runs.push((instruction.to_string(), files.to_vec()));
        log.tracked_during_run.push(self.files.len());
        self.reply.clone()
    }

    fn clear_files(&mut self) {
        self.files.clear();
    }

    fn tracked_files(&self) -> &[PathBuf] {
        &self.files
    }

    fn console_output(&self) -> String {
        self.console.clone()
    }

    fn clear_console(&mut self) {
        self.console.clear();
    }
}

#[derive(Debug, Default)]
struct RecordingHooks {
    phases: Mutex<Vec<EditPhase>>,
    failures: Mutex<Vec<EditErrorKind>>,
}

impl EditSessionHooks for RecordingHooks {
    fn on_phase_start(&self, phase: EditPhase) {
        self.phases.lock().expect("phases lock").push(phase);
    }

    fn on_session_failure(&self, error: &EditError, _elapsed: Duration) {
        self.failures.lock().expect("failures lock").push(error.kind);
    }
}

fn workspace(names: &[&str]) -> (tempfile::TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("mkdir");
            }
            std::fs::write(&path, "print('hi')\n").expect("write");
            path
        })
        .collect();
    (dir, paths)
}

fn models() -> ModelPair {
    ModelPair::new("claude-3-opus-20240229").with_weak("claude-3-sonnet-20240229")
}

fn success_output() -> EngineOutput {
    EngineOutput {
        edits: vec![
            EngineEdit::new("app.py", "<<<<<<< SEARCH\n=======\n>>>>>>> REPLACE"),
            EngineEdit::new("app.py", "<<<<<<< SEARCH\nx\n=======\ny\n>>>>>>> REPLACE"),
            EngineEdit::new("util.py", ""),
        ],
        summary: Some("Updated \u{201c}app\u{201d}\u{2026}".to_string()),
        tool_output: None,
    }
}

#[test]
fn success_collects_edits_and_clears_tracked_files() {
    let (_dir, files) = workspace(&["app.py", "util.py"]);
    let (engine, log) = FakeEngine::new(Ok(success_output()));
    let hooks = Arc::new(RecordingHooks::default());
    let mut session = CodeEditSession::new(engine).with_hooks(hooks.clone());

    let result = session.process(CodeEditRequest::new("tidy up", files.clone(), models()));

    let CodeEditResult::Success(success) = result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(success.edits.len(), 3);
    assert_eq!(
        success.files_changed,
        vec![PathBuf::from("app.py"), PathBuf::from("util.py")]
    );
    assert_eq!(success.message, "Updated \"app\"...");
    assert_eq!(success.console_output, "> running edit\n");
    assert!(success.skipped_files.is_empty());

    assert!(session.engine().tracked_files().is_empty());
    assert_eq!(session.phase(), EditPhase::Completed);
    assert_eq!(
        hooks.phases.lock().expect("phases lock").clone(),
        vec![EditPhase::Validating, EditPhase::Dispatching, EditPhase::Completed]
    );

    let log = log.lock().expect("log lock");
    assert_eq!(log.tracked_during_run, vec![2]);
    let (instruction, sent) = &log.runs[0];
    assert!(instruction.contains("tidy up"));
    assert!(instruction.contains("- app.py\n- util.py"));
    assert!(sent.iter().all(|path| path.is_absolute()));
}

#[test]
fn missing_file_is_a_hard_failure_before_dispatch() {
    let (dir, mut files) = workspace(&["app.py"]);
    files.push(dir.path().join("missing.py"));
    let (engine, log) = FakeEngine::new(Ok(success_output()));
    let mut session = CodeEditSession::new(engine);

    let result = session.process(CodeEditRequest::new("edit", files, models()));

    let error = result.error().expect("failure");
    assert_eq!(error.kind, EditErrorKind::FileNotFound);
    assert!(error.message.contains("missing.py"));
    assert!(log.lock().expect("log lock").runs.is_empty());
}

#[test]
fn only_sensitive_files_yields_no_valid_files_naming_them() {
    let (_dir, files) = workspace(&[".env", "venv/lib.py"]);
    let (engine, log) = FakeEngine::new(Ok(success_output()));
    let mut session = CodeEditSession::new(engine);

    let result = session.process(CodeEditRequest::new("edit", files, models()));

    let CodeEditResult::Failure(failure) = result else {
        panic!("expected failure");
    };
    assert_eq!(failure.error.kind, EditErrorKind::NoValidFiles);
    assert_eq!(failure.skipped_files.len(), 2);
    let detail = failure.error.detail.expect("detail");
    assert!(detail.contains(".env"));
    assert!(detail.contains("lib.py"));
    assert!(log.lock().expect("log lock").runs.is_empty());
}

#[test]
fn sensitive_files_are_skipped_but_reported_on_success() {
    let (_dir, files) = workspace(&["app.py", "__pycache__/app.cpython-311.pyc"]);
    let (engine, log) = FakeEngine::new(Ok(EngineOutput::default()));
    let mut session = CodeEditSession::new(engine);

    let result = session.process(CodeEditRequest::new("edit", files, models()));

    let CodeEditResult::Success(success) = result else {
        panic!("expected success");
    };
    assert_eq!(success.message, NO_CHANGES_MESSAGE);
    assert_eq!(success.skipped_files.len(), 1);
    assert_eq!(log.lock().expect("log lock").runs[0].1.len(), 1);
}

#[test]
fn git_errors_map_to_fixed_remediation_hint() {
    let (_dir, files) = workspace(&["app.py"]);
    let (engine, _log) =
        FakeEngine::new(Err(EngineError::exit("fatal: not a git repository (or any parent)")));
    let hooks = Arc::new(RecordingHooks::default());
    let mut session = CodeEditSession::new(engine).with_hooks(hooks.clone());

    let result = session.process(CodeEditRequest::new("edit", files, models()));

    let CodeEditResult::Failure(failure) = result else {
        panic!("expected failure");
    };
    assert_eq!(failure.error.kind, EditErrorKind::GitOperationFailed);
    assert_eq!(failure.error.message, "Git operation failed");
    assert_eq!(failure.error.detail.as_deref(), Some(GIT_FAILURE_HINT));
    assert_eq!(failure.console_output, "> running edit\n");
    assert!(session.engine().tracked_files().is_empty());
    assert_eq!(
        hooks.failures.lock().expect("failures lock").clone(),
        vec![EditErrorKind::GitOperationFailed]
    );
}

#[test]
fn other_engine_errors_carry_normalized_text() {
    let (_dir, files) = workspace(&["app.py"]);
    let (engine, _log) =
        FakeEngine::new(Err(EngineError::exit("model overloaded \u{2014} retry")));
    let mut session = CodeEditSession::new(engine);

    let result = session.process(CodeEditRequest::new("edit", files, models()));

    let error = result.error().expect("failure");
    assert_eq!(error.kind, EditErrorKind::EngineFailure);
    assert_eq!(error.message, "model overloaded -- retry");
    assert_eq!(error.detail.as_deref(), Some("model overloaded -- retry"));
}

#[test]
fn later_request_without_files_does_not_reuse_earlier_files() {
    for reply in [Ok(success_output()), Err(EngineError::exit("model overloaded"))] {
        let (_dir, files) = workspace(&["app.py", "util.py"]);
        let (engine, log) = FakeEngine::new(reply);
        let mut session = CodeEditSession::new(engine);

        session.process(CodeEditRequest::new("tidy up", files, models()));
        assert!(session.engine().tracked_files().is_empty());

        let result = session.process(CodeEditRequest::new("again", Vec::new(), models()));

        assert_eq!(
            result.error().map(|error| error.kind),
            Some(EditErrorKind::NoValidFiles)
        );
        assert_eq!(log.lock().expect("log lock").runs.len(), 1);
        assert!(session.engine().tracked_files().is_empty());
    }
}

#[test]
fn engine_reinitializes_only_when_models_change() {
    let (_dir, files) = workspace(&["app.py"]);
    let (engine, log) = FakeEngine::new(Ok(EngineOutput::default()));
    let mut session = CodeEditSession::new(engine);

    session.process(CodeEditRequest::new("one", files.clone(), models()));
    session.process(CodeEditRequest::new("two", files.clone(), models()));
    session.process(CodeEditRequest::new("three", files, ModelPair::new("gpt-4")));

    let log = log.lock().expect("log lock");
    assert_eq!(log.initialized, vec![models(), ModelPair::new("gpt-4")]);
    assert_eq!(log.runs.len(), 3);
}

#[test]
fn tool_output_prefixes_the_summary() {
    let (_dir, files) = workspace(&["app.py"]);
    let (engine, _log) = FakeEngine::new(Ok(EngineOutput {
        edits: Vec::new(),
        summary: Some("Done.".to_string()),
        tool_output: Some("Warning: repo is dirty".to_string()),
    }));
    let mut session = CodeEditSession::new(engine);

    let result = session.process(CodeEditRequest::new("edit", files, models()));

    let CodeEditResult::Success(success) = result else {
        panic!("expected success");
    };
    assert_eq!(success.message, "Warning: repo is dirty\n\nDone.");
}

#[test]
fn blank_instruction_is_rejected() {
    let (_dir, files) = workspace(&["app.py"]);
    let (engine, log) = FakeEngine::new(Ok(EngineOutput::default()));
    let mut session = CodeEditSession::new(engine);

    let result = session.process(CodeEditRequest::new("  ", files, models()));

    assert_eq!(
        result.error().map(|error| error.kind),
        Some(EditErrorKind::InvalidRequest)
    );
    assert!(log.lock().expect("log lock").initialized.is_empty());
}
