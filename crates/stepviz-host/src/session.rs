//! The visualizer session: the single owner of all session state.
//!
//! [`VisualizerSession`] reacts to [`HostEvent`]s one at a time. It opens and
//! reveals the panel, dispatches tracer runs, applies run results, and keeps
//! editor decorations in step with the panel.
//!
//! State machine:
//!
//! ```text
//! Closed --start--> Idle --(immediate run)--> Loading --result--> Ready
//!                                                ^                  |
//!                                                +---- any re-run --+
//! any state --panel disposed--> Closed
//! ```
//!
//! Runs execute on spawned tasks and report back through the event queue.
//! A result is applied only if it belongs to the session that is still open
//! and is the most recently dispatched run; anything else is dropped without
//! posting.

use std::sync::Arc;

use stepviz_core::source::ensure_language;
use stepviz_core::{
    DecorationSink, DocumentSnapshot, HostMessage, PanelMessage, RunId, RunRequest, RunResult,
    SessionId,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::VisualizerConfig;
use crate::debounce::{ChangeDebouncer, Debounced};
use crate::decorations::DecorationSync;
use crate::error::HostError;
use crate::event::{HostEvent, RunCompletion};
use crate::panel::PanelChannel;
use crate::runner::TraceRunner;

/// Lifecycle state of the visualizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No panel.
    Closed,
    /// Panel open, nothing dispatched yet.
    Idle,
    /// A run is outstanding.
    Loading,
    /// The latest run has been reported to the panel.
    Ready,
}

/// State of one open panel.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// The document being visualized; its id is the associated document.
    pub document: DocumentSnapshot,
    /// Program input text.
    pub input_text: String,
    pub seed: i64,
    /// Selected step, `-1` while no trace is loaded. Reset on every
    /// applied result; scrubbing is tracked by `current_line`.
    pub step_index: i64,
    /// Source line of the step last selected in the panel (`syncLine`).
    pub current_line: Option<u32>,
    pub state: SessionState,
    /// Most recently dispatched run still awaiting its result.
    pub in_flight: Option<RunId>,
}

pub struct VisualizerSession<R, P, D> {
    config: VisualizerConfig,
    runner: Arc<R>,
    panel: P,
    sink: D,
    events: UnboundedSender<HostEvent>,
    debouncer: ChangeDebouncer<DocumentSnapshot, HostEvent>,
    decorations: DecorationSync,
    active: Option<Session>,
    next_run: RunId,
}

impl<R, P, D> VisualizerSession<R, P, D>
where
    R: TraceRunner,
    P: PanelChannel,
    D: DecorationSink,
{
    /// `events` is the queue this session is fed from; finished runs and
    /// settled edits are posted back to it.
    pub fn new(
        config: VisualizerConfig,
        runner: Arc<R>,
        panel: P,
        sink: D,
        events: UnboundedSender<HostEvent>,
    ) -> Self {
        let debouncer = ChangeDebouncer::new(config.debounce_delay, events.clone());
        VisualizerSession {
            config,
            runner,
            panel,
            sink,
            events,
            debouncer,
            decorations: DecorationSync::default(),
            active: None,
            next_run: RunId(0),
        }
    }

    pub fn state(&self) -> SessionState {
        self.active
            .as_ref()
            .map_or(SessionState::Closed, |session| session.state)
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn is_panel_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn arrows_enabled(&self) -> bool {
        self.decorations.arrows_enabled()
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut D {
        &mut self.sink
    }

    /// Dispatches one event. Only `Start` can fail.
    pub fn handle(&mut self, event: HostEvent) -> Result<(), HostError> {
        match event {
            HostEvent::Start(active) => self.start(active)?,
            HostEvent::DocumentChanged(document) => self.document_changed(document),
            HostEvent::ActiveEditorChanged(active) => self.active_editor_changed(active),
            HostEvent::Panel(message) => self.panel_message(message),
            HostEvent::PanelDisposed => self.panel_disposed(),
            HostEvent::EditsSettled(settled) => self.edits_settled(settled),
            HostEvent::RunFinished(completion) => self.run_finished(completion),
            HostEvent::Shutdown => self.shutdown(),
        }
        Ok(())
    }

    /// Opens the panel on `active`, or reveals it if already open.
    pub fn start(&mut self, active: Option<DocumentSnapshot>) -> Result<(), HostError> {
        let document = active.ok_or(HostError::NoActiveEditor)?;
        ensure_language(&document, &self.config.language_id)?;

        if self.active.is_some() {
            tracing::debug!("panel already open, revealing it");
            self.panel.reveal();
            return Ok(());
        }

        self.panel.open();
        let session = Session {
            id: SessionId::new(),
            document,
            input_text: String::new(),
            seed: self.config.default_seed,
            step_index: -1,
            current_line: None,
            state: SessionState::Idle,
            in_flight: None,
        };
        tracing::info!(session = %session.id, document = %session.document.id, "visualizer opened");
        self.active = Some(session);
        self.trigger_run();
        Ok(())
    }

    /// Edits to the tracked document restart the debounce timer; edits to
    /// anything else are ignored.
    pub fn document_changed(&mut self, document: DocumentSnapshot) {
        let tracked = self
            .active
            .as_ref()
            .is_some_and(|session| session.document.id == document.id);
        if tracked {
            self.debouncer.schedule(document);
        }
    }

    fn edits_settled(&mut self, settled: Debounced<DocumentSnapshot>) {
        if !self.debouncer.is_current(settled.generation) {
            tracing::debug!("ignoring superseded edit notification");
            return;
        }
        let Some(session) = self.active.as_mut() else {
            return;
        };
        if session.document.id != settled.value.id {
            return;
        }
        session.document = settled.value;
        self.trigger_run();
    }

    /// Follows focus to another document of the supported language.
    ///
    /// The seed goes back to its default; the program input is kept.
    pub fn active_editor_changed(&mut self, active: Option<DocumentSnapshot>) {
        let Some(document) = active else {
            return;
        };
        if document.language_id != self.config.language_id {
            return;
        }
        let Some(session) = self.active.as_mut() else {
            return;
        };
        if session.document.id == document.id {
            return;
        }

        tracing::info!(session = %session.id, document = %document.id, "following active editor");
        session.document = document;
        session.seed = self.config.default_seed;
        self.trigger_run();
    }

    pub fn panel_message(&mut self, message: PanelMessage) {
        if self.active.is_none() {
            tracing::debug!(?message, "panel message with no open session");
            return;
        }
        match message {
            PanelMessage::Rerun { text, seed } => {
                if let Some(session) = self.active.as_mut() {
                    session.input_text = text;
                    if let Some(seed) = seed {
                        session.seed = seed;
                    }
                }
                self.trigger_run();
            }
            PanelMessage::SyncLine { line, prev_line } => {
                if let Some(session) = self.active.as_mut() {
                    session.current_line = Some(line);
                }
                self.decorations.sync_line(&mut self.sink, line, prev_line);
            }
            PanelMessage::ToggleArrows { enabled } => {
                self.decorations.set_arrows(&mut self.sink, enabled);
            }
        }
    }

    fn run_finished(&mut self, completion: RunCompletion) {
        let RunCompletion {
            session: session_id,
            run,
            request,
            result,
        } = completion;

        let Some(session) = self.active.as_mut().filter(|s| s.id == session_id) else {
            tracing::debug!(%run, "dropping result for a closed panel");
            return;
        };

        // A newer run was dispatched since; only its result may be shown.
        if session.in_flight != Some(run) {
            tracing::debug!(session = %session.id, %run, "dropping result of a superseded run");
            return;
        }

        tracing::info!(session = %session.id, %run, outcome = result.kind(), "run finished");
        session.in_flight = None;
        session.state = SessionState::Ready;
        if !matches!(result, RunResult::SyntaxError) {
            session.current_line = None;
            session.step_index = match result.trace().steps() {
                Ok(steps) if !steps.is_empty() => 0,
                Ok(_) => -1,
                Err(err) => {
                    tracing::warn!(%run, "tracer printed an unreadable trace: {}", err);
                    -1
                }
            };
        }

        self.panel.post(HostMessage::for_result(&request, &result));
    }

    /// The user closed the panel: clear decorations, cancel the pending
    /// edit timer, and forget the session.
    pub fn panel_disposed(&mut self) {
        let Some(session) = self.active.take() else {
            return;
        };
        self.debouncer.cancel();
        self.decorations.reset(&mut self.sink);
        self.decorations = DecorationSync::default();
        tracing::info!(session = %session.id, "visualizer closed");
    }

    /// Host shutdown: close the panel if it is open.
    pub fn shutdown(&mut self) {
        if self.active.is_some() {
            self.panel.dispose();
            self.panel_disposed();
        }
        self.debouncer.cancel();
    }

    /// Shows a failure to the user on the editor surface.
    pub fn report_error(&mut self, error: &HostError) {
        self.sink.show_error(&error.to_string());
    }

    /// Posts `showLoading`, then dispatches a run of the tracked document.
    fn trigger_run(&mut self) {
        let Some(session) = self.active.as_mut() else {
            return;
        };
        let run = self.next_run;
        self.next_run = run.next();

        let request = RunRequest::new(&session.document, &session.input_text, session.seed);
        session.state = SessionState::Loading;
        session.in_flight = Some(run);
        let session_id = session.id;

        self.panel.post(HostMessage::ShowLoading);
        tracing::info!(
            session = %session_id,
            %run,
            path = %request.source_path.display(),
            seed = request.seed,
            "dispatching tracer run"
        );

        let runner = Arc::clone(&self.runner);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = runner.run(request.clone()).await;
            let completion = RunCompletion {
                session: session_id,
                run,
                request,
                result,
            };
            if events.send(HostEvent::RunFinished(completion)).is_err() {
                tracing::debug!(%run, "host stopped before run finished");
            }
        });
    }
}
