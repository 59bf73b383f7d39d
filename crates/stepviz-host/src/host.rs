//! The host event loop.
//!
//! [`Host`] owns the session and drains the event queue on a single task,
//! so session state never needs a lock. Producers (the bridge reader, spawned
//! runs, debounce timers) hold a [`HostHandle`] or a raw sender.

use std::sync::Arc;

use stepviz_core::DecorationSink;
use tokio::sync::mpsc;

use crate::config::VisualizerConfig;
use crate::error::HostError;
use crate::event::HostEvent;
use crate::panel::PanelChannel;
use crate::runner::TraceRunner;
use crate::session::VisualizerSession;

/// Cloneable sending half of the host queue.
#[derive(Debug, Clone)]
pub struct HostHandle {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl HostHandle {
    pub fn send(&self, event: HostEvent) -> Result<(), HostError> {
        self.tx.send(event).map_err(|_| HostError::ChannelClosed)
    }
}

pub struct Host<R, P, D> {
    session: VisualizerSession<R, P, D>,
    rx: mpsc::UnboundedReceiver<HostEvent>,
}

impl<R, P, D> Host<R, P, D>
where
    R: TraceRunner,
    P: PanelChannel,
    D: DecorationSink,
{
    pub fn new(config: VisualizerConfig, runner: R, panel: P, sink: D) -> (Self, HostHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = VisualizerSession::new(config, Arc::new(runner), panel, sink, tx.clone());
        (Host { session, rx }, HostHandle { tx })
    }

    /// Processes events until `Shutdown`, then hands the session back.
    ///
    /// The session keeps a sender to its own queue, so the loop does not end
    /// on its own when every external handle is dropped; send `Shutdown`.
    pub async fn run(mut self) -> VisualizerSession<R, P, D> {
        while let Some(event) = self.rx.recv().await {
            let stop = matches!(event, HostEvent::Shutdown);
            if let Err(err) = self.session.handle(event) {
                if err.is_user_facing() {
                    tracing::warn!("rejected request: {}", err);
                    self.session.report_error(&err);
                } else {
                    tracing::error!("event handling failed: {}", err);
                }
            }
            if stop {
                break;
            }
        }
        tracing::info!("host event loop stopped");
        self.session
    }
}
