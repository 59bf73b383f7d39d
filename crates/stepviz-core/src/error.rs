//! Core error types for stepviz-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of the data model: language gating, trace decoding, and
//! malformed protocol messages.

use thiserror::Error;

/// Core errors produced by the stepviz-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The active document is not written in the supported language.
    #[error("unsupported language '{language}': open a {expected} file to visualize")]
    UnsupportedLanguage { language: String, expected: String },

    /// The tracer's stdout was not a valid JSON trace.
    #[error("trace decode failed: {reason}")]
    TraceDecode { reason: String },

    /// A message received from the panel or the editor could not be decoded.
    #[error("invalid message: {reason}")]
    InvalidMessage { reason: String },
}
