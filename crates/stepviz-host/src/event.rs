//! Events consumed by the host event loop.
//!
//! Editor notifications, panel messages, expired debounce timers, and
//! finished runs all funnel into one queue so the session is only ever
//! touched from a single task.

use stepviz_core::{DocumentSnapshot, PanelMessage, RunId, RunRequest, RunResult, SessionId};

use crate::debounce::Debounced;

#[derive(Debug, Clone)]
pub enum HostEvent {
    /// "Start visualization" on the active editor (`None` when no editor has focus).
    Start(Option<DocumentSnapshot>),
    /// A document's text changed.
    DocumentChanged(DocumentSnapshot),
    /// Focus moved to another editor (`None` when no editor has focus).
    ActiveEditorChanged(Option<DocumentSnapshot>),
    /// A message posted by the panel.
    Panel(PanelMessage),
    /// The user closed the panel.
    PanelDisposed,
    /// The edit quiet period elapsed.
    EditsSettled(Debounced<DocumentSnapshot>),
    /// A tracer run finished.
    RunFinished(RunCompletion),
    /// Stop the event loop.
    Shutdown,
}

/// A run result, tagged with the session and run that produced it.
#[derive(Debug, Clone)]
pub struct RunCompletion {
    pub session: SessionId,
    pub run: RunId,
    pub request: RunRequest,
    pub result: RunResult,
}

impl From<Debounced<DocumentSnapshot>> for HostEvent {
    fn from(settled: Debounced<DocumentSnapshot>) -> Self {
        HostEvent::EditsSettled(settled)
    }
}
