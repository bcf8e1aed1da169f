/// Zoom view: cut the current region out of a full-screen frame and upscale
/// it to the interactive screen size, so the model always sees an image of
/// the same dimensions no matter how deep the zoom is.
use base64::Engine as _;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use crate::errors::{GridZoomError, GridZoomResult};
use crate::perception::grid_mapper::all_cells;
use crate::perception::types::{GridAddress, Region};

/// Crop `region` from `frame` and resize it to exactly `target` (w, h).
pub fn crop_and_upscale(frame: &RgbaImage, region: &Region, target: (u32, u32)) -> GridZoomResult<RgbaImage> {
    let (fw, fh) = frame.dimensions();
    if region.right() > fw || region.bottom() > fh {
        return Err(GridZoomError::Perception(format!(
            "region {region} lies outside the {fw}x{fh} frame"
        )));
    }
    if target.0 == 0 || target.1 == 0 {
        return Err(GridZoomError::Perception("zero-size zoom target".into()));
    }

    let cropped = image::imageops::crop_imm(frame, region.x(), region.y(), region.width(), region.height())
        .to_image();
    if cropped.dimensions() == target {
        return Ok(cropped);
    }
    Ok(image::imageops::resize(&cropped, target.0, target.1, FilterType::Lanczos3))
}

/// Map a capture-pixel offset along an axis of length `len` onto `target` view pixels.
fn to_view(offset: u32, len: u32, target: u32) -> u32 {
    (offset as u64 * target as u64 / len as u64) as u32
}

/// The mapper's cells of `region`, expressed in the pixels of its `target`-sized view.
///
/// Edges are scaled from the capture partition, so when the region does not
/// divide evenly the drawn lines still sit on the boundaries `move` targets.
pub fn view_cells(region: &Region, grid_size: u32, target: (u32, u32)) -> GridZoomResult<Vec<(GridAddress, Region)>> {
    let (tw, th) = target;
    all_cells(region, grid_size)
        .into_iter()
        .map(|(addr, cell)| {
            let x0 = to_view(cell.x() - region.x(), region.width(), tw);
            let x1 = to_view(cell.right() - region.x(), region.width(), tw);
            let y0 = to_view(cell.y() - region.y(), region.height(), th);
            let y1 = to_view(cell.bottom() - region.y(), region.height(), th);
            let view = Region::new(x0, y0, x1 - x0, y1 - y0).map_err(|_| {
                GridZoomError::Perception(format!("cell {addr} of {region} vanishes in a {tw}x{th} view"))
            })?;
            Ok((addr, view))
        })
        .collect()
}

pub fn encode_png(image: &RgbaImage) -> GridZoomResult<Vec<u8>> {
    let mut png_bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|e| GridZoomError::Perception(format!("PNG encode: {e}")))?;
    Ok(png_bytes)
}

/// `data:image/png;base64,...` URL for an OpenAI-style `image_url` part.
pub fn png_data_url(png_bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png_bytes)
    )
}
