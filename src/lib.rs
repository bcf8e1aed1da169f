pub mod agent_engine;
pub mod config;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod perception;

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::agent_engine::decision_service::LlmDecisionService;
use crate::agent_engine::engine::{Collaborators, ControllerSettings, ZoomController};
use crate::agent_engine::state::{AgentEvent, SessionReport};
use crate::config::AppConfig;
use crate::errors::GridZoomResult;
use crate::executor::dispatcher::ActionExecutor;
use crate::executor::input::EnigoDriver;
use crate::llm::registry::ProviderRegistry;
use crate::perception::grid_overlay::NumberedGridRenderer;
use crate::perception::screenshot::PrimaryMonitorCapture;

/// Command-line overrides applied on top of config.toml.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub goal: Option<String>,
    pub config_path: Option<PathBuf>,
    pub grid_size: Option<u32>,
    pub settle_ms: Option<u64>,
    pub max_iterations: Option<u32>,
    pub snapshot_dir: Option<PathBuf>,
    pub no_history: bool,
}

impl RunOptions {
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(goal) = &self.goal {
            config.session.goal = goal.clone();
        }
        if let Some(n) = self.grid_size {
            config.grid.size = n;
        }
        if let Some(ms) = self.settle_ms {
            config.session.settle_ms = ms;
        }
        if let Some(max) = self.max_iterations {
            config.session.max_iterations = Some(max);
        }
        if let Some(dir) = &self.snapshot_dir {
            config.session.snapshot_dir = Some(dir.clone());
        }
        if self.no_history {
            config.session.record_history = false;
        }
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// First Ctrl-C asks the session to stop after the current iteration; a second one exits.
fn spawn_stop_listener(tx: mpsc::Sender<AgentEvent>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::info!("Ctrl-C received, stopping after the current iteration");
        let _ = tx.send(AgentEvent::Stop).await;
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("second Ctrl-C, exiting immediately");
            std::process::exit(130);
        }
    });
}

/// Load config.toml, apply the command-line overrides, then validate the result.
pub fn resolve_config(options: &RunOptions) -> GridZoomResult<AppConfig> {
    let mut config = config::load_config(options.config_path.as_deref())?;
    options.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

/// Run one grid-zoom session against the real screen, input devices, and model.
pub async fn run(options: RunOptions) -> GridZoomResult<SessionReport> {
    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let config = resolve_config(&options)?;

    // Missing credentials surface here, before any screen or input access.
    let registry = ProviderRegistry::from_config(&config);
    let (provider, call_cfg) = registry.vision()?;
    tracing::info!(provider = %provider.name(), model = %call_cfg.model, goal = %config.session.goal, "starting");

    let collaborators = Collaborators {
        capture: Box::new(PrimaryMonitorCapture),
        renderer: Box::new(NumberedGridRenderer::from_config(&config.grid)),
        decisions: Box::new(LlmDecisionService::new(provider, call_cfg)),
        executor: ActionExecutor::new(Box::new(EnigoDriver::new(Duration::from_millis(
            config.session.move_duration_ms,
        )))),
    };

    let (stop_tx, stop_rx) = mpsc::channel::<AgentEvent>(4);
    spawn_stop_listener(stop_tx);

    let controller = ZoomController::start(ControllerSettings::from_config(&config), collaborators, Some(stop_rx)).await?;
    controller.run().await
}
