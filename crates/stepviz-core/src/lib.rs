pub mod cursor;
pub mod decoration;
pub mod error;
pub mod id;
pub mod protocol;
pub mod run;
pub mod source;
pub mod trace;

// Re-export commonly used types
pub use cursor::StepCursor;
pub use decoration::{DecorationKind, DecorationSink};
pub use error::CoreError;
pub use id::{DocumentId, RunId, SessionId};
pub use protocol::{HostMessage, PanelMessage, UpdateTrace};
pub use run::{DocumentSnapshot, RunRequest, RunResult};
pub use source::SourceFeatures;
pub use trace::{Trace, TraceStep, MODULE_SCOPE};
