//! Host error types.
//!
//! [`HostError`] covers failures of the host itself. Tracer failures never
//! show up here: the runner folds every outcome into a
//! [`RunResult`](stepviz_core::RunResult).

use stepviz_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Language gate, protocol decoding, or trace decoding failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// "Start visualization" was invoked with no editor focused.
    #[error("no active editor: open a file to visualize")]
    NoActiveEditor,

    /// A configuration value could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The host event channel was closed while still in use.
    #[error("host event channel closed")]
    ChannelClosed,

    /// Reading or writing the bridge streams failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    /// Whether the error should be shown to the user rather than only logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            HostError::NoActiveEditor | HostError::Core(CoreError::UnsupportedLanguage { .. })
        )
    }
}
