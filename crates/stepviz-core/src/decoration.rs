//! Editor decoration vocabulary and the sink contract.

use serde::{Deserialize, Serialize};

/// Kinds of full-row highlight the host paints on the source editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecorationKind {
    /// Arrow glyph on the line that runs next.
    NextToExecute,
    /// Arrow glyph on the line that just ran.
    JustExecuted,
    /// Plain highlight with no arrow, used when arrows are off.
    Neutral,
}

impl DecorationKind {
    pub const ALL: [DecorationKind; 3] = [
        DecorationKind::NextToExecute,
        DecorationKind::JustExecuted,
        DecorationKind::Neutral,
    ];

    /// Kinds painted while arrows are enabled.
    pub const ARROWS: [DecorationKind; 2] =
        [DecorationKind::NextToExecute, DecorationKind::JustExecuted];
}

/// The editor surface the host paints on.
///
/// Each kind holds at most one row: `set_highlight` replaces whatever row the
/// kind was on before. Lines are 1-based.
pub trait DecorationSink: Send {
    /// Paints `kind` on the full row of `line`.
    fn set_highlight(&mut self, line: u32, kind: DecorationKind);

    /// Removes every highlight of `kind`.
    fn clear(&mut self, kind: DecorationKind);

    /// Scrolls `line` into view if it is outside the visible viewport.
    fn reveal(&mut self, line: u32);

    /// Shows an error notification on the editor.
    fn show_error(&mut self, message: &str);

    /// Removes every highlight of every kind.
    fn clear_all(&mut self) {
        for kind in DecorationKind::ALL {
            self.clear(kind);
        }
    }
}
