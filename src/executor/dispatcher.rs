// Action executor: the only place the controller's decisions reach the OS.
use crate::errors::GridZoomResult;
use crate::executor::input::InputDriver;
use crate::perception::types::ScreenPoint;

/// An OS-affecting action, already resolved to screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction {
    MoveTo(ScreenPoint),
    Click,
    Type(String),
}

pub struct ActionExecutor {
    driver: Box<dyn InputDriver>,
}

impl ActionExecutor {
    pub fn new(driver: Box<dyn InputDriver>) -> Self {
        Self { driver }
    }

    pub async fn display_size(&self) -> GridZoomResult<(u32, u32)> {
        self.driver.display_size().await
    }

    pub async fn execute(&self, action: &PlannedAction) -> GridZoomResult<()> {
        match action {
            PlannedAction::MoveTo(point) => {
                let (x, y) = point.to_pixel();
                tracing::info!(x, y, "moving pointer");
                self.driver.move_to(x, y).await
            }
            PlannedAction::Click => {
                tracing::info!("clicking");
                self.driver.click().await
            }
            PlannedAction::Type(text) => {
                tracing::info!(chars = text.chars().count(), "typing text");
                self.driver.type_text(text).await
            }
        }
    }
}
