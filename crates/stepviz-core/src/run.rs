//! Run requests and the classified outcome of one tracer invocation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::id::DocumentId;
use crate::trace::Trace;

/// Tracer exit code for a clean run.
pub const EXIT_SUCCESS: i32 = 0;
/// Tracer exit code when the traced program raised.
pub const EXIT_RUNTIME_ERROR: i32 = 1;
/// Tracer exit code when the traced program failed to compile.
pub const EXIT_SYNTAX_ERROR: i32 = 2;
/// Code reported when the tracer never produced an exit status of its own
/// (failed to start, or was terminated by a signal).
pub const EXIT_UNKNOWN: i32 = -1;

/// An editor document as seen at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    /// File system path of the document.
    pub path: PathBuf,
    /// Editor language identifier (e.g. `python`).
    pub language_id: String,
    /// Full document text.
    pub text: String,
}

/// Input to a single tracer invocation. Built fresh for every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Full document text, written to the tracer's stdin.
    pub source_code: String,
    /// Program input text (the panel's input box).
    pub stdin_text: String,
    /// Randomness seed for the traced program.
    pub seed: i64,
    /// Path of the source file; its parent is the tracer's working directory.
    pub source_path: PathBuf,
}

impl RunRequest {
    pub fn new(document: &DocumentSnapshot, stdin_text: &str, seed: i64) -> Self {
        RunRequest {
            source_code: document.text.clone(),
            stdin_text: stdin_text.to_string(),
            seed,
            source_path: document.path.clone(),
        }
    }

    /// Directory the tracer runs in. Falls back to `.` for bare file names.
    pub fn working_dir(&self) -> &Path {
        match self.source_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// Outcome of one tracer invocation. Every failure mode of the runner ends
/// up here; nothing is thrown past the runner boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// Exit code 0. Stderr is deliberately not surfaced on this path.
    Success { trace: Trace },
    /// Exit code 1: the traced program raised.
    RuntimeError { partial: Trace, message: String },
    /// Exit code 2: the traced program did not parse.
    SyntaxError,
    /// The tracer was still running when the safety window closed and was killed.
    Timeout { limit_ms: u64 },
    /// Any other exit code, a signal, or a failure to start the tracer.
    UnexpectedExit { code: i32, message: String },
}

impl RunResult {
    /// Classifies a finished tracer process by its exit code.
    ///
    /// `code` is `None` when the process was terminated by a signal.
    pub fn from_exit(code: Option<i32>, stdout: &str, stderr: &str) -> Self {
        match code {
            Some(EXIT_SUCCESS) => RunResult::Success {
                trace: Trace::from_raw(stdout),
            },
            Some(EXIT_RUNTIME_ERROR) => RunResult::RuntimeError {
                partial: Trace::from_raw(stdout),
                message: stderr.to_string(),
            },
            Some(EXIT_SYNTAX_ERROR) => RunResult::SyntaxError,
            other => RunResult::unexpected_exit(other.unwrap_or(EXIT_UNKNOWN), stderr),
        }
    }

    /// Builds an `UnexpectedExit` whose message embeds the code and stderr.
    pub fn unexpected_exit(code: i32, stderr: &str) -> Self {
        RunResult::UnexpectedExit {
            code,
            message: format!("Tracer exited with unexpected code {}: {}", code, stderr),
        }
    }

    /// Result for a tracer that could not be started at all.
    pub fn spawn_failed(reason: &str) -> Self {
        RunResult::unexpected_exit(EXIT_UNKNOWN, &format!("failed to start tracer: {}", reason))
    }

    /// Trace to hand to the panel. Timeouts and unexpected exits carry none.
    pub fn trace(&self) -> Trace {
        match self {
            RunResult::Success { trace } => trace.clone(),
            RunResult::RuntimeError { partial, .. } => partial.clone(),
            RunResult::SyntaxError
            | RunResult::Timeout { .. }
            | RunResult::UnexpectedExit { .. } => Trace::empty(),
        }
    }

    /// Text for the panel's error banner, if this outcome shows one.
    pub fn error_banner(&self) -> Option<String> {
        match self {
            RunResult::Success { .. } | RunResult::SyntaxError => None,
            RunResult::RuntimeError { message, .. } => Some(message.clone()),
            RunResult::Timeout { limit_ms } => Some(timeout_message(*limit_ms)),
            RunResult::UnexpectedExit { message, .. } => Some(message.clone()),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RunResult::Success { .. } => "success",
            RunResult::RuntimeError { .. } => "runtime_error",
            RunResult::SyntaxError => "syntax_error",
            RunResult::Timeout { .. } => "timeout",
            RunResult::UnexpectedExit { .. } => "unexpected_exit",
        }
    }
}

/// Fixed banner for a run that hit the safety timeout.
pub fn timeout_message(limit_ms: u64) -> String {
    let seconds = limit_ms as f64 / 1000.0;
    format!(
        "Execution timed out after {} seconds and was stopped. \
         The program may be waiting on blocking input or sleeping forever.",
        seconds
    )
}
