use async_trait::async_trait;
use image::RgbaImage;
use xcap::Monitor;

use crate::errors::{GridZoomError, GridZoomResult};
use crate::perception::traits::ScreenCapture;

/// Captures the primary monitor through xcap.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimaryMonitorCapture;

impl PrimaryMonitorCapture {
    fn primary() -> GridZoomResult<Monitor> {
        let monitors = Monitor::all()
            .map_err(|e| GridZoomError::Perception(format!("enumerate monitors: {e}")))?;
        let mut fallback = None;
        for monitor in monitors {
            if monitor.is_primary() {
                return Ok(monitor);
            }
            fallback.get_or_insert(monitor);
        }
        fallback.ok_or_else(|| GridZoomError::Perception("no monitor found".into()))
    }
}

#[async_trait]
impl ScreenCapture for PrimaryMonitorCapture {
    async fn capture(&self) -> GridZoomResult<RgbaImage> {
        let monitor = Self::primary()?;
        let frame = monitor
            .capture_image()
            .map_err(|e| GridZoomError::Perception(format!("capture: {e}")))?;
        tracing::debug!(
            monitor = %monitor.name(),
            width = frame.width(),
            height = frame.height(),
            scale = monitor.scale_factor(),
            "screen captured"
        );
        Ok(frame)
    }
}
