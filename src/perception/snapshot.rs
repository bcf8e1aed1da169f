use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::errors::{GridZoomError, GridZoomResult};

/// Writes every gridded frame as `grid-image-<n>.png` for post-mortem debugging.
pub struct SnapshotWriter {
    dir: PathBuf,
    next_index: u32,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> GridZoomResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, next_index: 1 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `frame` under the next sequential name and return its path.
    pub fn save(&mut self, frame: &RgbaImage) -> GridZoomResult<PathBuf> {
        let path = self.dir.join(format!("grid-image-{}.png", self.next_index));
        frame
            .save(&path)
            .map_err(|e| GridZoomError::Perception(format!("save snapshot {}: {e}", path.display())))?;
        self.next_index += 1;
        tracing::debug!(path = %path.display(), "grid snapshot saved");
        Ok(path)
    }
}
