//! In-memory collaborators for driving `ZoomController` in tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};

use gridzoom::agent_engine::decision_service::LlmDecisionService;
use gridzoom::agent_engine::engine::{Collaborators, ControllerSettings, ZoomController};
use gridzoom::agent_engine::state::{AgentEvent, LoopConfig};
use gridzoom::errors::{GridZoomError, GridZoomResult};
use gridzoom::executor::dispatcher::ActionExecutor;
use gridzoom::executor::input::InputDriver;
use gridzoom::llm::provider::LlmProvider;
use gridzoom::llm::types::{CallConfig, ChatMessage, LlmResponse};
use gridzoom::perception::grid_overlay::NumberedGridRenderer;
use gridzoom::perception::traits::ScreenCapture;

pub struct FakeScreen {
    pub size: (u32, u32),
    pub captures: Arc<AtomicUsize>,
}

#[async_trait]
impl ScreenCapture for FakeScreen {
    async fn capture(&self) -> GridZoomResult<RgbaImage> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(RgbaImage::from_pixel(self.size.0, self.size.1, Rgba([30, 30, 30, 255])))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputCall {
    Move(i32, i32),
    Click,
    Type(String),
}

pub struct RecordingDriver {
    pub display: (u32, u32),
    pub calls: Arc<Mutex<Vec<InputCall>>>,
}

#[async_trait]
impl InputDriver for RecordingDriver {
    async fn display_size(&self) -> GridZoomResult<(u32, u32)> {
        Ok(self.display)
    }

    async fn move_to(&self, x: i32, y: i32) -> GridZoomResult<()> {
        self.calls.lock().unwrap().push(InputCall::Move(x, y));
        Ok(())
    }

    async fn click(&self) -> GridZoomResult<()> {
        self.calls.lock().unwrap().push(InputCall::Click);
        Ok(())
    }

    async fn type_text(&self, text: &str) -> GridZoomResult<()> {
        self.calls.lock().unwrap().push(InputCall::Type(text.to_string()));
        Ok(())
    }
}

/// Replays canned replies in order; fails once they run out.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, _messages: Vec<ChatMessage>, _cfg: &CallConfig) -> GridZoomResult<LlmResponse> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .map(|content| LlmResponse { content })
            .ok_or_else(|| GridZoomError::LlmProvider("script exhausted".into()))
    }
}

pub fn move_to(cell: u32) -> String {
    format!(r#"{{"reasoning":"target is in cell {cell}","action":"move_mouse","actionValue":{cell}}}"#)
}

pub fn click() -> String {
    r#"{"reasoning":"cursor is on target","action":"click","actionValue":null}"#.to_string()
}

pub fn type_text(text: &str) -> String {
    serde_json::json!({ "reasoning": "field focused", "action": "type", "actionValue": text }).to_string()
}

pub fn idle() -> String {
    r#"{"reasoning":"waiting","action":"none","actionValue":null}"#.to_string()
}

pub struct Harness {
    pub screen: (u32, u32),
    pub display: (u32, u32),
    pub grid_size: u32,
    pub min_cell_px: u32,
    pub settle: Duration,
    pub history_dir: Option<PathBuf>,
    pub loop_config: LoopConfig,
}

impl Harness {
    pub fn new(screen: (u32, u32)) -> Self {
        Self {
            screen,
            display: screen,
            grid_size: 2,
            min_cell_px: 1,
            settle: Duration::ZERO,
            history_dir: None,
            loop_config: LoopConfig::default(),
        }
    }

    pub fn display(mut self, display: (u32, u32)) -> Self {
        self.display = display;
        self
    }

    pub fn min_cell_px(mut self, px: u32) -> Self {
        self.min_cell_px = px;
        self
    }

    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Record session history into `dir`.
    pub fn history_dir(mut self, dir: PathBuf) -> Self {
        self.history_dir = Some(dir);
        self
    }

    pub fn loop_config(mut self, cfg: LoopConfig) -> Self {
        self.loop_config = cfg;
        self
    }

    pub fn settings(&self) -> ControllerSettings {
        ControllerSettings {
            goal: "Play a song by Pink Floyd".into(),
            grid_size: self.grid_size,
            settle: self.settle,
            min_cell_px: self.min_cell_px,
            loop_config: self.loop_config.clone(),
            snapshot_dir: None,
            record_history: self.history_dir.is_some(),
            history_dir: self.history_dir.clone(),
        }
    }

    pub async fn start_with_events(
        self,
        replies: Vec<String>,
        events: Option<tokio::sync::mpsc::Receiver<AgentEvent>>,
    ) -> Session {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let captures = Arc::new(AtomicUsize::new(0));
        let provider = Arc::new(ScriptedProvider {
            replies: Mutex::new(replies.into()),
        });
        let cfg = CallConfig {
            model: "test".into(),
            temperature: 0.0,
            max_tokens: 500,
            json_mode: true,
        };
        let collaborators = Collaborators {
            capture: Box::new(FakeScreen {
                size: self.screen,
                captures: captures.clone(),
            }),
            renderer: Box::new(NumberedGridRenderer::default()),
            decisions: Box::new(LlmDecisionService::new(provider, cfg)),
            executor: ActionExecutor::new(Box::new(RecordingDriver {
                display: self.display,
                calls: calls.clone(),
            })),
        };
        let controller = ZoomController::start(self.settings(), collaborators, events)
            .await
            .expect("controller should start");
        Session {
            controller,
            calls,
            captures,
        }
    }

    pub async fn start(self, replies: Vec<String>) -> Session {
        self.start_with_events(replies, None).await
    }
}

pub struct Session {
    pub controller: ZoomController,
    pub calls: Arc<Mutex<Vec<InputCall>>>,
    pub captures: Arc<AtomicUsize>,
}

impl Session {
    pub fn input_calls(&self) -> Vec<InputCall> {
        self.calls.lock().unwrap().clone()
    }
}
