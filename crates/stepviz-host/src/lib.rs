//! Host side of the step visualizer.
//!
//! Owns the visualizer session: spawns the external tracer for each run,
//! debounces document edits, keeps editor decorations in step with the
//! panel, and speaks the panel protocol. The [`bridge`] module exposes all of
//! it to an editor plugin as a JSON-lines sidecar over stdio.

pub mod bridge;
pub mod config;
pub mod debounce;
pub mod decorations;
pub mod error;
pub mod event;
pub mod host;
pub mod panel;
pub mod runner;
pub mod session;
