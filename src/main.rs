use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "gridzoom", version, about = "Drive the desktop with a vision model through recursive grid zoom")]
struct Cli {
    /// What the agent should do, e.g. "Play a song by Pink Floyd".
    goal: Option<String>,
    /// Path to config.toml (default: next to the executable, then the working directory).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Cells per grid side.
    #[arg(long)]
    grid_size: Option<u32>,
    /// Pause after each input action, in milliseconds.
    #[arg(long)]
    settle_ms: Option<u64>,
    #[arg(long)]
    max_iterations: Option<u32>,
    /// Save every gridded frame as grid-image-<n>.png in this directory.
    #[arg(long)]
    snapshots: Option<PathBuf>,
    /// Do not write the session history file.
    #[arg(long)]
    no_history: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    gridzoom::init_tracing();

    let cli = Cli::parse();
    let options = gridzoom::RunOptions {
        goal: cli.goal,
        config_path: cli.config,
        grid_size: cli.grid_size,
        settle_ms: cli.settle_ms,
        max_iterations: cli.max_iterations,
        snapshot_dir: cli.snapshots,
        no_history: cli.no_history,
    };

    match gridzoom::run(options).await {
        Ok(report) => {
            tracing::info!(iterations = report.iterations, end = ?report.end, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "gridzoom failed");
            ExitCode::FAILURE
        }
    }
}
