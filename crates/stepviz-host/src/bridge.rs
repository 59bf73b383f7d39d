//! JSON-lines bridge between an editor plugin and the host.
//!
//! The plugin writes one [`EditorEvent`] per line to the host's stdin and
//! reads one [`Outbound`] object per line from its stdout. Logs go to
//! stderr so they never interleave with protocol output.
//!
//! Inbound example:
//!
//! ```text
//! {"event":"start","document":{"id":"file:///w/a.py","path":"/w/a.py","languageId":"python","text":"print(1)\n"}}
//! {"event":"panelMessage","message":{"command":"syncLine","line":1,"prevLine":null}}
//! ```
//!
//! Outbound example:
//!
//! ```text
//! {"target":"panel","op":"post","message":{"command":"showLoading"}}
//! {"target":"editor","op":"decorate","kind":"nextToExecute","lines":[1]}
//! ```

use serde::{Deserialize, Serialize};
use stepviz_core::{CoreError, DecorationKind, DecorationSink, DocumentSnapshot, PanelMessage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::config::VisualizerConfig;
use crate::error::HostError;
use crate::event::HostEvent;
use crate::host::{Host, HostHandle};
use crate::panel::{PanelChannel, PanelEvent};
use crate::runner::TraceRunner;

/// A notification from the editor plugin.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EditorEvent {
    Start {
        #[serde(default)]
        document: Option<DocumentSnapshot>,
    },
    DocumentChanged {
        document: DocumentSnapshot,
    },
    ActiveEditorChanged {
        #[serde(default)]
        document: Option<DocumentSnapshot>,
    },
    PanelDisposed,
    /// Raw panel message; decoded separately so a bad message names itself.
    PanelMessage {
        message: serde_json::Value,
    },
    Shutdown,
}

impl EditorEvent {
    pub fn into_host_event(self) -> Result<HostEvent, CoreError> {
        Ok(match self {
            EditorEvent::Start { document } => HostEvent::Start(document),
            EditorEvent::DocumentChanged { document } => HostEvent::DocumentChanged(document),
            EditorEvent::ActiveEditorChanged { document } => HostEvent::ActiveEditorChanged(document),
            EditorEvent::PanelDisposed => HostEvent::PanelDisposed,
            EditorEvent::PanelMessage { message } => HostEvent::Panel(PanelMessage::decode(message)?),
            EditorEvent::Shutdown => HostEvent::Shutdown,
        })
    }
}

/// Decodes one inbound line. Blank lines yield `None`.
pub fn decode_line(line: &str) -> Result<Option<HostEvent>, CoreError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let event: EditorEvent = serde_json::from_str(line).map_err(|e| CoreError::InvalidMessage {
        reason: e.to_string(),
    })?;
    event.into_host_event().map(Some)
}

/// An instruction for the editor surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EditorOp {
    /// Replace the rows painted with `kind` (empty clears it).
    Decorate { kind: DecorationKind, lines: Vec<u32> },
    /// Scroll `line` into view if it is off screen.
    Reveal { line: u32 },
    /// Show an error notification.
    Error { message: String },
}

/// One outbound line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "camelCase")]
pub enum Outbound {
    Panel(PanelEvent),
    Editor(EditorOp),
}

/// Serializes outbound objects onto the line queue.
#[derive(Debug, Clone)]
pub struct LineSink {
    tx: mpsc::UnboundedSender<String>,
}

impl LineSink {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        LineSink { tx }
    }

    fn emit(&self, outbound: &Outbound) {
        match serde_json::to_string(outbound) {
            Ok(line) => {
                if self.tx.send(line).is_err() {
                    tracing::debug!("output closed, dropping line");
                }
            }
            Err(err) => tracing::error!("failed to encode outbound message: {}", err),
        }
    }
}

/// Panel whose events become `target: panel` lines.
#[derive(Debug, Clone)]
pub struct StdioPanel(LineSink);

impl StdioPanel {
    pub fn new(lines: LineSink) -> Self {
        StdioPanel(lines)
    }
}

impl PanelChannel for StdioPanel {
    fn send(&mut self, event: PanelEvent) {
        self.0.emit(&Outbound::Panel(event));
    }
}

/// Editor surface whose operations become `target: editor` lines.
#[derive(Debug, Clone)]
pub struct StdioEditor(LineSink);

impl StdioEditor {
    pub fn new(lines: LineSink) -> Self {
        StdioEditor(lines)
    }
}

impl DecorationSink for StdioEditor {
    fn set_highlight(&mut self, line: u32, kind: DecorationKind) {
        self.0.emit(&Outbound::Editor(EditorOp::Decorate {
            kind,
            lines: vec![line],
        }));
    }

    fn clear(&mut self, kind: DecorationKind) {
        self.0.emit(&Outbound::Editor(EditorOp::Decorate {
            kind,
            lines: Vec::new(),
        }));
    }

    fn reveal(&mut self, line: u32) {
        self.0.emit(&Outbound::Editor(EditorOp::Reveal { line }));
    }

    fn show_error(&mut self, message: &str) {
        self.0.emit(&Outbound::Editor(EditorOp::Error {
            message: message.to_string(),
        }));
    }
}

/// Runs the bridge until `input` hits EOF or a `shutdown` event arrives.
pub async fn serve<R, I, O>(
    config: VisualizerConfig,
    runner: R,
    input: I,
    output: O,
) -> Result<(), HostError>
where
    R: TraceRunner,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin + Send + 'static,
{
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_lines(output, line_rx));

    let lines = LineSink::new(line_tx);
    let (host, handle) = Host::new(
        config,
        runner,
        StdioPanel::new(lines.clone()),
        StdioEditor::new(lines),
    );
    let host_task = tokio::spawn(host.run());

    let read = forward_input(input, &handle).await;
    // EOF or a read failure without an explicit shutdown; the loop may
    // already be gone.
    let _ = handle.send(HostEvent::Shutdown);

    let session = host_task.await.map_err(std::io::Error::other)?;
    drop(session);
    writer.await.map_err(std::io::Error::other)??;
    read
}

/// Feeds decoded lines to the host until EOF or `shutdown`. Lines that are
/// not UTF-8 or not a known event are logged and skipped.
async fn forward_input<I>(mut input: I, handle: &HostHandle) -> Result<(), HostError>
where
    I: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!("skipping inbound line: not UTF-8: {}", err);
                continue;
            }
        };
        match decode_line(line) {
            Ok(Some(event)) => {
                let stop = matches!(event, HostEvent::Shutdown);
                handle.send(event)?;
                if stop {
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("skipping inbound line: {}", err),
        }
    }
}

async fn write_lines<O: AsyncWrite + Unpin>(
    mut output: O,
    mut rx: mpsc::UnboundedReceiver<String>,
) -> std::io::Result<()> {
    while let Some(line) = rx.recv().await {
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(())
}
