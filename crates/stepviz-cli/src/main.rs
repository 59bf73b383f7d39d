//! Step visualizer host CLI.
//!
//! Provides the `stepviz` binary:
//! - `serve` speaks the JSON-lines editor bridge on stdin/stdout.
//! - `trace` runs the tracer once on a file and prints every step.
//!
//! Configuration comes from `STEPVIZ_*` environment variables, overridden by
//! flags. Logs always go to stderr; `STEPVIZ_LOG` sets the level unless `-v`
//! is given.

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::Level;

use stepviz_core::{DocumentId, DocumentSnapshot, RunRequest, RunResult, StepCursor, TraceStep};
use stepviz_host::bridge;
use stepviz_host::config::VisualizerConfig;
use stepviz_host::error::HostError;
use stepviz_host::runner::{ProcessTraceRunner, TraceRunner};

/// Step-through execution visualizer host.
#[derive(Parser)]
#[command(name = "stepviz", about = "Step-through execution visualizer host")]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the editor bridge over stdin/stdout.
    Serve {
        #[command(flatten)]
        tracer: TracerOptions,

        /// Quiet period after the last edit before re-running, in milliseconds.
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Trace a program once and print its steps.
    Trace {
        /// Source file to trace.
        file: PathBuf,

        /// Text fed to the program's input() calls.
        #[arg(short, long, default_value = "")]
        input: String,

        /// Randomness seed (default: STEPVIZ_SEED or 42).
        #[arg(short, long)]
        seed: Option<i64>,

        #[command(flatten)]
        tracer: TracerOptions,
    },
}

/// Overrides for how the tracer is launched.
#[derive(Args)]
struct TracerOptions {
    /// Interpreter to spawn.
    #[arg(long)]
    tracer: Option<PathBuf>,

    /// Argument placed before the per-run values; repeat for several.
    #[arg(long = "tracer-arg")]
    tracer_args: Vec<String>,

    /// Kill the tracer after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Serve {
            tracer,
            debounce_ms,
        } => run_serve(&tracer, debounce_ms).await,
        Commands::Trace {
            file,
            input,
            seed,
            tracer,
        } => run_trace(&file, &input, seed, &tracer).await,
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => std::env::var("STEPVIZ_LOG")
            .ok()
            .and_then(|raw| raw.parse::<Level>().ok())
            .unwrap_or(Level::INFO),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Environment configuration with command-line overrides applied.
fn load_config(options: &TracerOptions) -> Result<VisualizerConfig, HostError> {
    let mut config = VisualizerConfig::from_env()?;
    if let Some(program) = &options.tracer {
        config.tracer_program = program.clone();
    }
    if !options.tracer_args.is_empty() {
        config.tracer_args = options.tracer_args.clone();
    }
    if let Some(ms) = options.timeout_ms {
        config.run_timeout = Duration::from_millis(ms);
    }
    // The tracer runs inside the source file's directory, so a relative
    // script path has to be pinned to where we were started.
    config.tracer_args = config.tracer_args.iter().map(|arg| anchor(arg)).collect();
    Ok(config)
}

fn anchor(arg: &str) -> String {
    let path = Path::new(arg);
    if path.is_relative() && path.is_file() {
        if let Ok(absolute) = path.canonicalize() {
            return absolute.to_string_lossy().into_owned();
        }
    }
    arg.to_string()
}

/// Execute the serve subcommand.
///
/// Returns exit code: 0 = clean shutdown, 1 = bridge failure, 3 = bad configuration.
async fn run_serve(options: &TracerOptions, debounce_ms: Option<u64>) -> i32 {
    let mut config = match load_config(options) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 3;
        }
    };
    if let Some(ms) = debounce_ms {
        config.debounce_delay = Duration::from_millis(ms);
    }

    tracing::info!(
        tracer = %config.tracer_program.display(),
        language = %config.language_id,
        "stepviz bridge starting"
    );
    let runner = ProcessTraceRunner::from_config(&config);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    match bridge::serve(config, runner, stdin, tokio::io::stdout()).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// Execute the trace subcommand.
///
/// Returns exit code: 0 = success, 1 = runtime error or tracer failure,
/// 2 = syntax error, 3 = I/O or configuration error.
async fn run_trace(file: &Path, input: &str, seed: Option<i64>, options: &TracerOptions) -> i32 {
    let config = match load_config(options) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 3;
        }
    };

    let text = match tokio::fs::read_to_string(file).await {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: failed to read '{}': {}", file.display(), e);
            return 3;
        }
    };
    let path = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
    let document = DocumentSnapshot {
        id: DocumentId::new(path.display().to_string()),
        path,
        language_id: config.language_id.clone(),
        text,
    };

    let request = RunRequest::new(&document, input, seed.unwrap_or(config.default_seed));
    let runner = ProcessTraceRunner::from_config(&config);
    let result = runner.run(request).await;

    let exit_code = match &result {
        RunResult::Success { .. } => 0,
        RunResult::SyntaxError => {
            eprintln!("Syntax error: the program could not be parsed");
            return 2;
        }
        RunResult::RuntimeError { .. }
        | RunResult::Timeout { .. }
        | RunResult::UnexpectedExit { .. } => 1,
    };

    match result.trace().steps() {
        Ok(steps) => print_steps(StepCursor::new(steps)),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    if let Some(banner) = result.error_banner() {
        eprintln!("Error: {}", banner.trim_end());
    }
    exit_code
}

fn print_steps(mut cursor: StepCursor) {
    if cursor.is_empty() {
        println!("(no steps recorded)");
        return;
    }
    loop {
        if let Some(step) = cursor.current() {
            println!(
                "step {}/{}  line {}  in {}",
                cursor.index() + 1,
                cursor.len(),
                step.line_number,
                step.function_name
            );
            print_frame(step);
            let output = cursor.output();
            if !output.is_empty() {
                println!("    output: {}", serde_json::Value::String(output));
            }
        }
        if cursor.step_forward().is_none() {
            break;
        }
    }
}

fn print_frame(step: &TraceStep) {
    for (name, value) in step.visible_globals() {
        println!("    {} = {}", name, value);
    }
    if !step.is_module_scope() {
        for (name, value) in &step.local_variables {
            println!("    [local] {} = {}", name, value);
        }
    }
}
