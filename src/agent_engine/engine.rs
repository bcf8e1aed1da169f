use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::agent_engine::conversation::ConversationState;
use crate::agent_engine::decision::{Command, Decision};
use crate::agent_engine::decision_service::{DecisionService, Observation};
use crate::agent_engine::history::{HistoryEntry, SessionHistory};
use crate::agent_engine::loop_control::LoopController;
use crate::agent_engine::prompt::{observation_instruction, system_directive};
use crate::agent_engine::state::{AgentEvent, LoopConfig, SessionEnd, SessionReport, StepOutcome, ZoomState};
use crate::config::AppConfig;
use crate::errors::{GridZoomError, GridZoomResult};
use crate::executor::dispatcher::{ActionExecutor, PlannedAction};
use crate::perception::grid_mapper::{can_partition, cell_to_point, cell_to_subregion};
use crate::perception::snapshot::SnapshotWriter;
use crate::perception::traits::{GridRenderer, ScreenCapture};
use crate::perception::types::{GridAddress, Region, ScaleFactor};
use crate::perception::zoom_view::{crop_and_upscale, encode_png, png_data_url, view_cells};

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub goal: String,
    pub grid_size: u32,
    /// Pause after each OS-affecting action before the next capture.
    pub settle: Duration,
    /// Smallest cell edge (capture pixels) the controller will zoom into.
    pub min_cell_px: u32,
    pub loop_config: LoopConfig,
    pub snapshot_dir: Option<PathBuf>,
    pub record_history: bool,
    pub history_dir: Option<PathBuf>,
}

impl ControllerSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            goal: cfg.session.goal.clone(),
            grid_size: cfg.grid.size,
            settle: Duration::from_millis(cfg.session.settle_ms),
            min_cell_px: cfg.session.min_cell_px.max(1),
            loop_config: LoopConfig {
                max_iterations: cfg.session.max_iterations,
                max_duration_minutes: cfg.session.max_duration_minutes,
                max_consecutive_failures: Some(cfg.session.max_consecutive_failures),
            },
            snapshot_dir: cfg.session.snapshot_dir.clone(),
            record_history: cfg.session.record_history,
            history_dir: cfg.session.history_dir.clone(),
        }
    }
}

/// The external capabilities the controller sequences.
pub struct Collaborators {
    pub capture: Box<dyn ScreenCapture>,
    pub renderer: Box<dyn GridRenderer>,
    pub decisions: Box<dyn DecisionService>,
    pub executor: ActionExecutor,
}

/// Region narrowing controller.
///
/// Owns `current_region` and the conversation. Each `step` captures the
/// screen, shows the model the gridded view of the current region, and then
/// either narrows into the chosen cell (`move`) or commits and resets to the
/// full screen (`click` / `type`).
pub struct ZoomController {
    settings: ControllerSettings,
    capture: Box<dyn ScreenCapture>,
    renderer: Box<dyn GridRenderer>,
    decisions: Box<dyn DecisionService>,
    executor: ActionExecutor,

    full_region: Region,
    display_size: (u32, u32),
    scale: ScaleFactor,

    // ── Zoom state ────────────────────────────────────────────────────────
    current_region: Region,
    depth: u32,
    last_cell: Option<GridAddress>,

    /// `None` only after a failed decision call consumed it; the session is over then.
    conversation: Option<ConversationState>,
    loop_ctrl: LoopController,
    history: Option<SessionHistory>,
    snapshots: Option<SnapshotWriter>,
    event_rx: Option<mpsc::Receiver<AgentEvent>>,
}

impl ZoomController {
    /// Probe the screen and input backends and set up a session at FULL.
    ///
    /// The full-screen bounds and the scale factor are fixed here for the
    /// whole session.
    pub async fn start(
        settings: ControllerSettings,
        collaborators: Collaborators,
        event_rx: Option<mpsc::Receiver<AgentEvent>>,
    ) -> GridZoomResult<Self> {
        let Collaborators {
            capture,
            renderer,
            decisions,
            executor,
        } = collaborators;

        if settings.grid_size < 2 {
            return Err(GridZoomError::Config(format!(
                "grid size must be at least 2 (got {})",
                settings.grid_size
            )));
        }

        let first = capture.capture().await?;
        let full_region = Region::full(first.width(), first.height())?;
        if !can_partition(&full_region, settings.grid_size, 1) {
            return Err(GridZoomError::Config(format!(
                "a {}x{} grid does not fit a {full_region} screen",
                settings.grid_size, settings.grid_size
            )));
        }

        let display_size = executor.display_size().await?;
        let scale = ScaleFactor::between(display_size, full_region.size())?;

        let snapshots = match &settings.snapshot_dir {
            Some(dir) => Some(SnapshotWriter::new(dir.clone())?),
            None => None,
        };
        let history = settings
            .record_history
            .then(|| SessionHistory::new(settings.history_dir.as_deref()));

        tracing::info!(
            capture = %full_region,
            display = %format!("{}x{}", display_size.0, display_size.1),
            sx = scale.sx,
            sy = scale.sy,
            grid = settings.grid_size,
            history = ?history.as_ref().map(|h| h.file_path().display().to_string()),
            "session started"
        );

        Ok(Self {
            conversation: Some(ConversationState::new(system_directive(settings.grid_size))),
            loop_ctrl: LoopController::new(settings.loop_config.clone()),
            settings,
            capture,
            renderer,
            decisions,
            executor,
            full_region,
            display_size,
            scale,
            current_region: full_region,
            depth: 0,
            last_cell: None,
            history,
            snapshots,
            event_rx,
        })
    }

    pub fn current_region(&self) -> Region {
        self.current_region
    }

    pub fn full_region(&self) -> Region {
        self.full_region
    }

    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    pub fn conversation(&self) -> Option<&ConversationState> {
        self.conversation.as_ref()
    }

    pub fn iterations(&self) -> u32 {
        self.loop_ctrl.iterations()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.history.as_ref().map(|h| h.session_id.as_str())
    }

    pub fn zoom_state(&self) -> ZoomState {
        if self.current_region == self.full_region {
            ZoomState::Full
        } else {
            ZoomState::Narrowed { depth: self.depth }
        }
    }

    fn reset(&mut self) {
        self.current_region = self.full_region;
        self.depth = 0;
        self.last_cell = None;
    }

    async fn settle(&self) {
        if !self.settings.settle.is_zero() {
            tokio::time::sleep(self.settings.settle).await;
        }
    }

    /// Run one capture → decide → act iteration.
    ///
    /// Errors are fatal for the session: collaborator failures and replies
    /// that cannot be parsed as a decision. Invalid decision content is not an
    /// error; it yields `StepOutcome::Rejected`.
    pub async fn step(&mut self) -> GridZoomResult<StepOutcome> {
        let iteration = self.loop_ctrl.iterations() + 1;
        let region = self.current_region;
        let grid = self.settings.grid_size;

        // Always a fresh full-screen frame; the crop happens here.
        let frame = self.capture.capture().await?;
        if frame.dimensions() != self.full_region.size() {
            return Err(GridZoomError::Perception(format!(
                "capture size changed from {} to {}x{}",
                self.full_region,
                frame.width(),
                frame.height()
            )));
        }

        // Region view at interactive-screen size, with the grid on top.
        let view = crop_and_upscale(&frame, &region, self.display_size)?;
        let cells = view_cells(&region, grid, self.display_size)?;
        let gridded = self.renderer.render(&view, &cells)?;
        if let Some(writer) = &mut self.snapshots {
            if let Err(e) = writer.save(&gridded) {
                tracing::warn!(error = %e, "snapshot not saved");
            }
        }
        let png = encode_png(&gridded)?;

        // ── Decide ────────────────────────────────────────────────────────
        let observation = Observation {
            instruction: observation_instruction(&self.settings.goal, &self.zoom_state(), self.last_cell),
            image_url: png_data_url(&png),
        };
        let conversation = self
            .conversation
            .take()
            .ok_or_else(|| GridZoomError::Conversation("conversation lost after a failed call".into()))?;
        let (decision, conversation) = self.decisions.decide(conversation, observation).await?;
        self.conversation = Some(conversation);
        self.loop_ctrl.record_iteration();

        tracing::info!(
            iteration,
            region = %region,
            reasoning = %decision.reasoning,
            action = %decision.action,
            value = %decision.value,
            "decision"
        );

        // ── Act ───────────────────────────────────────────────────────────
        let outcome = match decision.command(grid) {
            Ok(command) => self.apply(command, region).await?,
            Err(invalid) => {
                tracing::warn!(iteration, error = %invalid, "invalid decision, resetting to full screen");
                self.reset();
                StepOutcome::Rejected {
                    reason: invalid.to_string(),
                }
            }
        };

        if matches!(outcome, StepOutcome::Rejected { .. }) {
            self.loop_ctrl.record_failure();
        } else {
            self.loop_ctrl.record_success();
        }
        self.record(iteration, region, &decision, &outcome);
        Ok(outcome)
    }

    async fn apply(&mut self, command: Command, region: Region) -> GridZoomResult<StepOutcome> {
        let grid = self.settings.grid_size;
        match command {
            Command::MoveTo(cell) => {
                let point = cell_to_point(cell, &region, grid, self.scale);
                let sub = cell_to_subregion(cell, &region, grid);
                self.executor.execute(&PlannedAction::MoveTo(point)).await?;
                self.settle().await;

                if !can_partition(&sub, grid, self.settings.min_cell_px) {
                    tracing::warn!(
                        cell = cell.cell(),
                        region = %sub,
                        min_cell_px = self.settings.min_cell_px,
                        "cell too small to zoom into"
                    );
                    return Ok(StepOutcome::ZoomFloorReached { point, region: sub });
                }

                self.current_region = sub;
                self.depth += 1;
                self.last_cell = Some(cell);
                tracing::info!(cell = cell.cell(), region = %sub, depth = self.depth, "narrowed");
                Ok(StepOutcome::Narrowed { point, region: sub })
            }
            Command::Click => {
                self.executor.execute(&PlannedAction::Click).await?;
                self.settle().await;
                self.reset();
                tracing::info!("clicked, resetting to full screen");
                Ok(StepOutcome::Reset)
            }
            Command::Type(text) => {
                self.executor.execute(&PlannedAction::Type(text)).await?;
                self.settle().await;
                self.reset();
                tracing::info!("typed, resetting to full screen");
                Ok(StepOutcome::Reset)
            }
            Command::NoOp => Ok(StepOutcome::Idle),
        }
    }

    fn record(&mut self, iteration: u32, region: Region, decision: &Decision, outcome: &StepOutcome) {
        let Some(history) = &mut self.history else { return };
        let entry = HistoryEntry::new(iteration, region, decision, outcome.clone());
        if let Err(e) = history.append(&entry) {
            tracing::warn!(error = %e, "history entry not written");
        }
    }

    fn stop_requested(&mut self) -> bool {
        let Some(rx) = &mut self.event_rx else { return false };
        matches!(rx.try_recv(), Ok(AgentEvent::Stop))
    }

    /// Loop `step` until a stop condition, the zoom floor, or a fatal error.
    pub async fn run(mut self) -> GridZoomResult<SessionReport> {
        let end = loop {
            if self.stop_requested() {
                tracing::info!("stop requested");
                break SessionEnd::Stopped;
            }
            if let Some(end) = self.loop_ctrl.should_stop() {
                tracing::info!(?end, "loop controller triggered stop");
                break end;
            }

            match self.step().await {
                Ok(StepOutcome::ZoomFloorReached { .. }) => break SessionEnd::ZoomFloorReached,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, iteration = self.loop_ctrl.iterations() + 1, "session terminated");
                    return Err(e);
                }
            }
        };

        let report = SessionReport {
            session_id: self.session_id().unwrap_or_default().to_string(),
            iterations: self.loop_ctrl.iterations(),
            end,
            conversation_turns: self.conversation.as_ref().map(|c| c.len()).unwrap_or(0),
        };
        tracing::info!(
            session = %report.session_id,
            iterations = report.iterations,
            end = ?report.end,
            "session ended"
        );
        Ok(report)
    }
}
