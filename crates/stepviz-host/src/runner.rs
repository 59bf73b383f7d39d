//! Trace runner: one external tracer process per run.
//!
//! [`ProcessTraceRunner`] spawns the interpreter with three positional
//! values (program input, source path, seed), writes the source text to its
//! stdin, and races process exit against the safety timeout. Whatever
//! happens, exactly one [`RunResult`] comes back.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use stepviz_core::{RunRequest, RunResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::task::JoinHandle;

use crate::config::VisualizerConfig;

/// How long to wait for the output pipes to drain once the tracer exited.
/// A grandchild that inherited the pipes can keep them open indefinitely.
const IO_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Executes one run request and classifies the outcome.
pub trait TraceRunner: Send + Sync + 'static {
    fn run(&self, request: RunRequest) -> impl Future<Output = RunResult> + Send;
}

/// Runs the configured interpreter as a child process.
#[derive(Debug, Clone)]
pub struct ProcessTraceRunner {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessTraceRunner {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        ProcessTraceRunner {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &VisualizerConfig) -> Self {
        Self::new(
            config.tracer_program.clone(),
            config.tracer_args.clone(),
            config.run_timeout,
        )
    }

    async fn execute(&self, request: RunRequest) -> RunResult {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&request.stdin_text)
            .arg(&request.source_path)
            .arg(request.seed.to_string())
            .current_dir(request.working_dir())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                tracing::warn!(program = %self.program.display(), "failed to spawn tracer: {}", err);
                return RunResult::spawn_failed(&err.to_string());
            }
        };
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let writer = child
            .stdin
            .take()
            .map(|stdin| tokio::spawn(write_source(stdin, request.source_code)));
        let mut stdout_task = child.stdout.take().map(|out| tokio::spawn(read_all(out)));
        let mut stderr_task = child.stderr.take().map(|err| tokio::spawn(read_all(err)));

        let status = tokio::select! {
            status = child.wait() => status,
            _ = &mut deadline => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "tracer did not exit in time, killing it"
                );
                if let Err(err) = child.kill().await {
                    tracing::warn!("failed to kill tracer: {}", err);
                }
                for task in [stdout_task.take(), stderr_task.take()].into_iter().flatten() {
                    task.abort();
                }
                if let Some(writer) = writer {
                    writer.abort();
                }
                return RunResult::Timeout {
                    limit_ms: self.timeout.as_millis() as u64,
                };
            }
        };

        let status = match status {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!("failed to wait for tracer: {}", err);
                return RunResult::spawn_failed(&err.to_string());
            }
        };

        let stdout = drain(stdout_task).await;
        let stderr = drain(stderr_task).await;
        tracing::debug!(code = ?status.code(), stdout_bytes = stdout.len(), "tracer exited");

        RunResult::from_exit(status.code(), &stdout, &stderr)
    }
}

impl TraceRunner for ProcessTraceRunner {
    fn run(&self, request: RunRequest) -> impl Future<Output = RunResult> + Send {
        self.execute(request)
    }
}

async fn write_source(mut stdin: ChildStdin, source: String) {
    // The tracer may exit without reading its input; a broken pipe is fine.
    if let Err(err) = stdin.write_all(source.as_bytes()).await {
        tracing::debug!("tracer stdin closed early: {}", err);
    }
    let _ = stdin.shutdown().await;
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut buf = Vec::new();
    if let Err(err) = reader.read_to_end(&mut buf).await {
        tracing::debug!("tracer pipe read failed: {}", err);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn drain(task: Option<JoinHandle<String>>) -> String {
    let Some(mut task) = task else {
        return String::new();
    };
    match tokio::time::timeout(IO_DRAIN_TIMEOUT, &mut task).await {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => {
            tracing::debug!("tracer pipe reader failed: {}", err);
            String::new()
        }
        Err(_) => {
            task.abort();
            String::new()
        }
    }
}
