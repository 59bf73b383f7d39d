//! Shared fixtures for host integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stepviz_core::{
    DecorationKind, DecorationSink, DocumentId, DocumentSnapshot, HostMessage, RunRequest,
    RunResult, Trace,
};
use stepviz_host::config::VisualizerConfig;
use stepviz_host::event::HostEvent;
use stepviz_host::panel::{ChannelPanel, PanelEvent};
use stepviz_host::runner::TraceRunner;
use stepviz_host::session::VisualizerSession;
use tokio::sync::mpsc;

pub const ONE_STEP: &str = r#"[{"event":"line","func_name":"<module>","line_no":1,"global_vars":{},"local_vars":{},"output":"hi\n"}]"#;

/// Runner that replays queued results and records every request.
pub struct ScriptedRunner {
    results: Mutex<VecDeque<(RunResult, Duration)>>,
    requests: Mutex<Vec<RunRequest>>,
}

impl ScriptedRunner {
    pub fn new(results: Vec<RunResult>) -> Self {
        Self::with_delay(results, Duration::ZERO)
    }

    pub fn with_delay(results: Vec<RunResult>, delay: Duration) -> Self {
        Self::timed(results.into_iter().map(|result| (result, delay)).collect())
    }

    /// Each result is returned after its own delay.
    pub fn timed(results: Vec<(RunResult, Duration)>) -> Self {
        ScriptedRunner {
            results: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RunRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl TraceRunner for ScriptedRunner {
    fn run(&self, request: RunRequest) -> impl Future<Output = RunResult> + Send {
        self.requests.lock().unwrap().push(request);
        let (result, delay) = self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| (success(ONE_STEP), Duration::ZERO));
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

/// Editor surface that keeps the current row per decoration kind.
#[derive(Debug, Default)]
pub struct RecordingEditor {
    pub rows: BTreeMap<DecorationKind, u32>,
    pub revealed: Vec<u32>,
    pub errors: Vec<String>,
}

impl DecorationSink for RecordingEditor {
    fn set_highlight(&mut self, line: u32, kind: DecorationKind) {
        self.rows.insert(kind, line);
    }

    fn clear(&mut self, kind: DecorationKind) {
        self.rows.remove(&kind);
    }

    fn reveal(&mut self, line: u32) {
        self.revealed.push(line);
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

pub fn success(raw: &str) -> RunResult {
    RunResult::Success {
        trace: Trace::from_raw(raw),
    }
}

pub fn python_doc(name: &str, text: &str) -> DocumentSnapshot {
    DocumentSnapshot {
        id: DocumentId::new(format!("file:///work/{}", name)),
        path: format!("/work/{}", name).into(),
        language_id: "python".to_string(),
        text: text.to_string(),
    }
}

pub fn doc_in(language: &str, name: &str) -> DocumentSnapshot {
    DocumentSnapshot {
        language_id: language.to_string(),
        ..python_doc(name, "{}")
    }
}

pub type TestSession = VisualizerSession<ScriptedRunner, ChannelPanel, RecordingEditor>;

/// A session wired to in-memory channels, pumped by hand.
pub struct Harness {
    pub session: TestSession,
    pub runner: Arc<ScriptedRunner>,
    pub events: mpsc::UnboundedReceiver<HostEvent>,
    pub panel: mpsc::UnboundedReceiver<PanelEvent>,
}

impl Harness {
    pub fn new(runner: ScriptedRunner) -> Self {
        Self::with_config(VisualizerConfig::default(), runner)
    }

    pub fn with_config(config: VisualizerConfig, runner: ScriptedRunner) -> Self {
        let runner = Arc::new(runner);
        let (tx, events) = mpsc::unbounded_channel();
        let (panel_channel, panel) = ChannelPanel::new();
        let session = VisualizerSession::new(
            config,
            Arc::clone(&runner),
            panel_channel,
            RecordingEditor::default(),
            tx,
        );
        Harness {
            session,
            runner,
            events,
            panel,
        }
    }

    /// Waits for the next queued event and lets the session handle it.
    pub async fn pump(&mut self) -> HostEvent {
        let event = self.events.recv().await.expect("event queue closed");
        self.session.handle(event.clone()).expect("event handling failed");
        event
    }

    /// Everything posted to the panel since the last drain.
    pub fn drain_panel(&mut self) -> Vec<PanelEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.panel.try_recv() {
            out.push(event);
        }
        out
    }

    /// Only the protocol messages posted since the last drain.
    pub fn drain_messages(&mut self) -> Vec<HostMessage> {
        self.drain_panel()
            .into_iter()
            .filter_map(|event| match event {
                PanelEvent::Post { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn editor(&self) -> &RecordingEditor {
        self.session.sink()
    }
}
