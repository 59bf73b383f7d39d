//! The panel as a message channel.
//!
//! The session never talks to a rendering surface directly. It owns a
//! [`PanelChannel`] and pushes [`PanelEvent`]s into it; whoever holds the
//! receiving end (the stdio bridge, a test) turns them into something
//! visible. Messages coming back from the panel arrive as host events.

use serde::Serialize;
use stepviz_core::HostMessage;
use tokio::sync::mpsc;

pub const PANEL_VIEW_TYPE: &str = "stepVisualizer";
pub const PANEL_TITLE: &str = "Step Visualizer";

/// Everything the host can ask of the panel surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PanelEvent {
    /// Create the panel beside the active editor.
    #[serde(rename_all = "camelCase")]
    Open { view_type: String, title: String },
    /// Bring the existing panel to the front.
    Reveal,
    /// Deliver a protocol message.
    Post { message: HostMessage },
    /// Close the panel (host shutdown).
    Dispose,
}

/// Outbound half of the panel.
pub trait PanelChannel: Send {
    fn send(&mut self, event: PanelEvent);

    fn open(&mut self) {
        self.send(PanelEvent::Open {
            view_type: PANEL_VIEW_TYPE.to_string(),
            title: PANEL_TITLE.to_string(),
        });
    }

    fn reveal(&mut self) {
        self.send(PanelEvent::Reveal);
    }

    fn post(&mut self, message: HostMessage) {
        self.send(PanelEvent::Post { message });
    }

    fn dispose(&mut self) {
        self.send(PanelEvent::Dispose);
    }
}

/// A panel backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelPanel {
    tx: mpsc::UnboundedSender<PanelEvent>,
}

impl ChannelPanel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PanelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelPanel { tx }, rx)
    }
}

impl PanelChannel for ChannelPanel {
    fn send(&mut self, event: PanelEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("panel receiver dropped, discarding event");
        }
    }
}
