//! Execution trace records produced by the external tracer.
//!
//! A successful run yields a JSON array of [`TraceStep`] records on the
//! tracer's stdout. The host keeps that payload verbatim in a [`Trace`] and
//! forwards it to the panel untouched; decoding happens only where the steps
//! are actually inspected (step cursor, CLI listing).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Function name the tracer reports for top-level (module scope) code.
pub const MODULE_SCOPE: &str = "<module>";

/// Global names that belong to the tracer itself and are never displayed.
const TRACER_INTERNALS: &[&str] = &["MockStdin", "safe_serialize", "tracer"];

/// One executed line, as recorded by the tracer.
///
/// Variable maps keep the order the tracer emitted them in, which is the
/// definition order inside the traced program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// 1-based source line that was executed.
    #[serde(rename = "line_no")]
    pub line_number: u32,
    /// Enclosing function, or [`MODULE_SCOPE`] at top level.
    #[serde(rename = "func_name")]
    pub function_name: String,
    /// Global variable name to display string.
    #[serde(rename = "global_vars", default)]
    pub global_variables: IndexMap<String, String>,
    /// Local variable name to display string (empty at module scope).
    #[serde(rename = "local_vars", default)]
    pub local_variables: IndexMap<String, String>,
    /// Program stdout produced since the previous step.
    #[serde(rename = "output", default)]
    pub incremental_output: String,
    /// Tracer event kind (`line` or `return`), when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl TraceStep {
    /// Whether this step executed at module scope.
    pub fn is_module_scope(&self) -> bool {
        self.function_name == MODULE_SCOPE
    }

    /// Globals worth showing to the user: dunder names and tracer internals
    /// are filtered out.
    pub fn visible_globals(&self) -> impl Iterator<Item = (&str, &str)> {
        self.global_variables
            .iter()
            .filter(|(name, _)| !name.starts_with("__") && !TRACER_INTERNALS.contains(&name.as_str()))
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// A trace payload exactly as the tracer printed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    raw: String,
}

impl Trace {
    /// The empty trace, `[]`.
    pub fn empty() -> Self {
        Trace {
            raw: "[]".to_string(),
        }
    }

    /// Wraps raw tracer stdout. Blank output is treated as the empty trace.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.trim().is_empty() {
            Trace::empty()
        } else {
            Trace { raw }
        }
    }

    /// Builds a trace from already decoded steps.
    pub fn from_steps(steps: &[TraceStep]) -> Result<Self, CoreError> {
        let raw = serde_json::to_string(steps).map_err(|e| CoreError::TraceDecode {
            reason: e.to_string(),
        })?;
        Ok(Trace { raw })
    }

    /// The JSON text forwarded to the panel as `traceData`.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Decodes the payload into steps.
    pub fn steps(&self) -> Result<Vec<TraceStep>, CoreError> {
        serde_json::from_str(&self.raw).map_err(|e| CoreError::TraceDecode {
            reason: e.to_string(),
        })
    }
}

impl Default for Trace {
    fn default() -> Self {
        Trace::empty()
    }
}

/// Program output visible at step `index`: the concatenation of the
/// incremental output of steps `0..=index`.
///
/// An index past the end yields the output of the whole trace.
pub fn cumulative_output(steps: &[TraceStep], index: usize) -> String {
    steps
        .iter()
        .take(index.saturating_add(1))
        .map(|step| step.incremental_output.as_str())
        .collect()
}
