use async_trait::async_trait;
use image::RgbaImage;

use crate::errors::GridZoomResult;
use crate::perception::types::{GridAddress, Region};

/// OS screenshot capability. One implementation per target platform.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Full-screen frame reflecting the screen contents at call time.
    async fn capture(&self) -> GridZoomResult<RgbaImage>;
}

/// Draws the numbered grid the model answers against.
///
/// `cells` are in `frame` pixels, row-major, and tile the frame.
pub trait GridRenderer: Send + Sync {
    fn render(&self, frame: &RgbaImage, cells: &[(GridAddress, Region)]) -> GridZoomResult<RgbaImage>;
}
