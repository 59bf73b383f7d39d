//! Keeps editor decorations in step with the line selected in the panel.
//!
//! With arrows enabled the line about to run gets the next-to-execute glyph
//! and the line that just ran gets the just-executed glyph. With arrows off
//! only the current line gets a plain highlight. The last synced lines are
//! remembered so toggling can redraw without a new `syncLine`.

use stepviz_core::{DecorationKind, DecorationSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationSync {
    arrows_enabled: bool,
    current_line: Option<u32>,
    previous_line: Option<u32>,
}

impl DecorationSync {
    pub fn new(arrows_enabled: bool) -> Self {
        DecorationSync {
            arrows_enabled,
            current_line: None,
            previous_line: None,
        }
    }

    pub fn arrows_enabled(&self) -> bool {
        self.arrows_enabled
    }

    /// Last synced `(line, prev_line)`.
    pub fn lines(&self) -> (Option<u32>, Option<u32>) {
        (self.current_line, self.previous_line)
    }

    /// Applies a `syncLine` from the panel and scrolls the line into view.
    pub fn sync_line<S: DecorationSink + ?Sized>(
        &mut self,
        sink: &mut S,
        line: u32,
        prev_line: Option<u32>,
    ) {
        self.current_line = Some(line);
        self.previous_line = prev_line.filter(|prev| *prev > 0);
        self.paint(sink);
        sink.reveal(line);
    }

    /// Switches arrow mode and redraws from the remembered lines.
    pub fn set_arrows<S: DecorationSink + ?Sized>(&mut self, sink: &mut S, enabled: bool) {
        self.arrows_enabled = enabled;
        self.paint(sink);
    }

    /// Forgets the remembered lines and clears every decoration.
    pub fn reset<S: DecorationSink + ?Sized>(&mut self, sink: &mut S) {
        self.current_line = None;
        self.previous_line = None;
        sink.clear_all();
    }

    fn paint<S: DecorationSink + ?Sized>(&self, sink: &mut S) {
        if self.arrows_enabled {
            sink.clear(DecorationKind::Neutral);
            set_or_clear(sink, DecorationKind::NextToExecute, self.current_line);
            set_or_clear(sink, DecorationKind::JustExecuted, self.previous_line);
        } else {
            for kind in DecorationKind::ARROWS {
                sink.clear(kind);
            }
            set_or_clear(sink, DecorationKind::Neutral, self.current_line);
        }
    }
}

impl Default for DecorationSync {
    fn default() -> Self {
        Self::new(true)
    }
}

fn set_or_clear<S: DecorationSink + ?Sized>(sink: &mut S, kind: DecorationKind, line: Option<u32>) {
    match line {
        Some(line) => sink.set_highlight(line, kind),
        None => sink.clear(kind),
    }
}
