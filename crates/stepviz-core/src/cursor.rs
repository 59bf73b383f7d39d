//! Step scrubbing over a decoded trace.
//!
//! [`StepCursor`] models the panel's prev/next/slider controls. Every move
//! yields the `syncLine` message the panel posts back to the host so the
//! editor decorations follow the selected step.

use crate::protocol::PanelMessage;
use crate::trace::{cumulative_output, TraceStep};

#[derive(Debug, Clone, Default)]
pub struct StepCursor {
    steps: Vec<TraceStep>,
    index: Option<usize>,
}

impl StepCursor {
    /// Starts at step 0, or at no step when the trace is empty.
    pub fn new(steps: Vec<TraceStep>) -> Self {
        let index = if steps.is_empty() { None } else { Some(0) };
        StepCursor { steps, index }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Selected step index, `-1` when nothing is selected.
    pub fn index(&self) -> i64 {
        self.index.map_or(-1, |i| i as i64)
    }

    pub fn current(&self) -> Option<&TraceStep> {
        self.index.and_then(|i| self.steps.get(i))
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Moves one step forward. Returns `None` at the last step.
    pub fn step_forward(&mut self) -> Option<PanelMessage> {
        let next = self.index? + 1;
        self.seek(next)
    }

    /// Moves one step back. Returns `None` at step 0.
    pub fn step_back(&mut self) -> Option<PanelMessage> {
        let prev = self.index?.checked_sub(1)?;
        self.seek(prev)
    }

    /// Jumps to `index`. Out-of-range indices leave the cursor where it is.
    pub fn seek(&mut self, index: usize) -> Option<PanelMessage> {
        if index >= self.steps.len() {
            return None;
        }
        self.index = Some(index);
        self.sync_message()
    }

    /// The `syncLine` message for the selected step.
    pub fn sync_message(&self) -> Option<PanelMessage> {
        let index = self.index?;
        let line = self.steps.get(index)?.line_number;
        let prev_line = index
            .checked_sub(1)
            .and_then(|prev| self.steps.get(prev))
            .map(|step| step.line_number);
        Some(PanelMessage::SyncLine { line, prev_line })
    }

    /// Program output up to and including the selected step.
    pub fn output(&self) -> String {
        match self.index {
            Some(index) => cumulative_output(&self.steps, index),
            None => String::new(),
        }
    }
}
