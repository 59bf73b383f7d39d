//! Panel protocol: the messages exchanged between the host and the panel.
//!
//! Every message is a JSON object carrying a `command` discriminator. Field
//! names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::run::{RunRequest, RunResult};
use crate::source::SourceFeatures;

/// Panel to host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PanelMessage {
    /// Re-run with new program input and, optionally, a new seed.
    Rerun {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<i64>,
    },
    /// The user moved to a step executing `line`; `prev_line` is the line of
    /// the step before it.
    SyncLine {
        line: u32,
        #[serde(rename = "prevLine", default)]
        prev_line: Option<u32>,
    },
    /// Switch between arrow glyphs and a plain line highlight.
    ToggleArrows { enabled: bool },
}

impl PanelMessage {
    /// Decodes one message posted by the panel.
    pub fn decode(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value).map_err(|e| CoreError::InvalidMessage {
            reason: e.to_string(),
        })
    }
}

/// Host to panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostMessage {
    /// A run was dispatched; dim the controls.
    ShowLoading,
    /// The run finished without a new trace; undim and keep what is shown.
    HideLoading,
    /// A run finished; replace the rendered trace.
    UpdateTrace(UpdateTrace),
}

/// Payload of `updateTrace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrace {
    /// Source text the trace was recorded against.
    pub source_code: String,
    /// JSON-encoded array of trace steps, as the tracer printed it.
    pub trace_data: String,
    /// Error banner text; `null` when the run succeeded.
    pub error_data: Option<String>,
    /// Program input used for the run.
    pub current_inputs: String,
    /// Seed used for the run.
    pub current_seed: i64,
    pub show_input_box: bool,
    pub has_randomness: bool,
}

impl HostMessage {
    /// The message that reports `result` for `request` to the panel.
    ///
    /// A syntax error only clears the loading state; everything else
    /// replaces the rendered trace.
    pub fn for_result(request: &RunRequest, result: &RunResult) -> HostMessage {
        if matches!(result, RunResult::SyntaxError) {
            return HostMessage::HideLoading;
        }
        let features = SourceFeatures::detect(&request.source_code);
        HostMessage::UpdateTrace(UpdateTrace {
            source_code: request.source_code.clone(),
            trace_data: result.trace().raw().to_string(),
            error_data: result.error_banner(),
            current_inputs: request.stdin_text.clone(),
            current_seed: request.seed,
            show_input_box: features.show_input_box,
            has_randomness: features.has_randomness,
        })
    }

    /// Wire name of the message.
    pub fn command(&self) -> &'static str {
        match self {
            HostMessage::ShowLoading => "showLoading",
            HostMessage::HideLoading => "hideLoading",
            HostMessage::UpdateTrace(_) => "updateTrace",
        }
    }
}
