// Physical input simulation through enigo.
use std::time::Duration;

use async_trait::async_trait;
use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};

use crate::errors::{GridZoomError, GridZoomResult};

/// OS input-injection capability. All coordinates are absolute
/// interactive-screen coordinates (already scale-corrected).
#[async_trait]
pub trait InputDriver: Send + Sync {
    /// Size of the screen in the coordinate space `move_to` uses.
    async fn display_size(&self) -> GridZoomResult<(u32, u32)>;
    async fn move_to(&self, x: i32, y: i32) -> GridZoomResult<()>;
    async fn click(&self) -> GridZoomResult<()>;
    async fn type_text(&self, text: &str) -> GridZoomResult<()>;
}

/// Interval between intermediate pointer positions during a glide.
const GLIDE_STEP: Duration = Duration::from_millis(16);

/// enigo-backed driver. Every call opens its own connection on a blocking
/// thread, so no enigo handle ever crosses an await point.
#[derive(Debug, Clone)]
pub struct EnigoDriver {
    move_duration: Duration,
}

impl EnigoDriver {
    pub fn new(move_duration: Duration) -> Self {
        Self { move_duration }
    }
}

fn input_err(e: impl std::fmt::Display) -> GridZoomError {
    GridZoomError::Executor(e.to_string())
}

async fn with_enigo<T, F>(f: F) -> GridZoomResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Enigo) -> GridZoomResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|e| GridZoomError::Executor(format!("input backend: {e}")))?;
        f(&mut enigo)
    })
    .await
    .map_err(|e| GridZoomError::Executor(format!("join: {e}")))?
}

/// Intermediate points from `from` to `to` (inclusive of `to`, exclusive of `from`).
pub(crate) fn glide_path(from: (i32, i32), to: (i32, i32), steps: u32) -> Vec<(i32, i32)> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let x = from.0 as f64 + (to.0 - from.0) as f64 * t;
            let y = from.1 as f64 + (to.1 - from.1) as f64 * t;
            (x.round() as i32, y.round() as i32)
        })
        .collect()
}

#[async_trait]
impl InputDriver for EnigoDriver {
    async fn display_size(&self) -> GridZoomResult<(u32, u32)> {
        let (w, h) = with_enigo(|enigo| enigo.main_display().map_err(input_err)).await?;
        if w <= 0 || h <= 0 {
            return Err(GridZoomError::Executor(format!("invalid display size {w}x{h}")));
        }
        Ok((w as u32, h as u32))
    }

    async fn move_to(&self, x: i32, y: i32) -> GridZoomResult<()> {
        let steps = (self.move_duration.as_millis() / GLIDE_STEP.as_millis()) as u32;
        with_enigo(move |enigo| {
            let from = enigo.location().map_err(input_err)?;
            for (px, py) in glide_path(from, (x, y), steps) {
                enigo.move_mouse(px, py, Coordinate::Abs).map_err(input_err)?;
                if steps > 1 {
                    std::thread::sleep(GLIDE_STEP);
                }
            }
            Ok(())
        })
        .await?;
        tracing::debug!(x, y, "pointer moved");
        Ok(())
    }

    async fn click(&self) -> GridZoomResult<()> {
        with_enigo(|enigo| enigo.button(Button::Left, Direction::Click).map_err(input_err)).await
    }

    async fn type_text(&self, text: &str) -> GridZoomResult<()> {
        let text = text.to_string();
        with_enigo(move |enigo| enigo.text(&text).map_err(input_err)).await
    }
}
