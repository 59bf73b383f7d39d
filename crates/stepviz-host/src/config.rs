//! Host configuration.
//!
//! Reads overrides from environment variables:
//! - `STEPVIZ_TRACER`: interpreter program (default: "python3")
//! - `STEPVIZ_TRACER_ARGS`: whitespace-separated leading arguments (default: "tracer.py")
//! - `STEPVIZ_LANGUAGE`: supported editor language id (default: "python")
//! - `STEPVIZ_TIMEOUT_MS`: safety timeout per run (default: 10000)
//! - `STEPVIZ_DEBOUNCE_MS`: edit quiet period before a re-run (default: 750)
//! - `STEPVIZ_SEED`: seed a fresh session starts with (default: 42)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::HostError;

pub const DEFAULT_TRACER_PROGRAM: &str = "python3";
pub const DEFAULT_TRACER_SCRIPT: &str = "tracer.py";
pub const DEFAULT_LANGUAGE_ID: &str = "python";
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_DEBOUNCE_MS: u64 = 750;
pub const DEFAULT_SEED: i64 = 42;

/// Everything the host needs to know that is not per-session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizerConfig {
    /// Interpreter to spawn.
    pub tracer_program: PathBuf,
    /// Arguments placed before the three per-run positional values.
    pub tracer_args: Vec<String>,
    /// Editor language id the visualizer accepts.
    pub language_id: String,
    /// Wall-clock limit for one tracer process.
    pub run_timeout: Duration,
    /// Quiet period after the last edit before re-running.
    pub debounce_delay: Duration,
    /// Seed used by a new session and after an editor switch.
    pub default_seed: i64,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        VisualizerConfig {
            tracer_program: PathBuf::from(DEFAULT_TRACER_PROGRAM),
            tracer_args: vec![DEFAULT_TRACER_SCRIPT.to_string()],
            language_id: DEFAULT_LANGUAGE_ID.to_string(),
            run_timeout: Duration::from_millis(DEFAULT_RUN_TIMEOUT_MS),
            debounce_delay: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            default_seed: DEFAULT_SEED,
        }
    }
}

impl VisualizerConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, HostError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HostError> {
        let mut config = VisualizerConfig::default();

        if let Some(program) = lookup("STEPVIZ_TRACER") {
            config.tracer_program = PathBuf::from(program);
        }
        if let Some(args) = lookup("STEPVIZ_TRACER_ARGS") {
            config.tracer_args = args.split_whitespace().map(str::to_string).collect();
        }
        if let Some(language) = lookup("STEPVIZ_LANGUAGE") {
            config.language_id = language;
        }
        if let Some(ms) = lookup("STEPVIZ_TIMEOUT_MS") {
            config.run_timeout = Duration::from_millis(parse_var("STEPVIZ_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = lookup("STEPVIZ_DEBOUNCE_MS") {
            config.debounce_delay = Duration::from_millis(parse_var("STEPVIZ_DEBOUNCE_MS", &ms)?);
        }
        if let Some(seed) = lookup("STEPVIZ_SEED") {
            config.default_seed = parse_var("STEPVIZ_SEED", &seed)?;
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T, HostError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| HostError::Config(format!("invalid {} '{}': {}", name, raw, e)))
}
