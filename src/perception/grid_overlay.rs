/// Numbered grid overlay.
///
/// Draws an N×N grid onto a frame and prints each cell's 1-indexed,
/// row-major number in the middle of the cell, so the model can answer with
/// a plain cell number.
///
/// Cell rectangles come from `zoom_view::view_cells`, i.e. the mapper's
/// partition scaled into the view, so the lines the model sees are the cell
/// boundaries the controller zooms into.
use image::{Rgba, RgbaImage};

use crate::config::GridConfig;
use crate::errors::{GridZoomError, GridZoomResult};
use crate::perception::traits::GridRenderer;
use crate::perception::types::{GridAddress, Region};

// ── Minimal 5×5 bitmap digits ────────────────────────────────────────────────
// Each glyph: 5 rows, each row is a u8 where bit4=leftmost pixel, bit0=rightmost.
const GLYPH_SIZE: u32 = 5;
const DIGITS_5X5: [[u8; 5]; 10] = [
    [0b01110, 0b10001, 0b10001, 0b10001, 0b01110], // 0
    [0b00100, 0b01100, 0b00100, 0b00100, 0b01110], // 1
    [0b01110, 0b10001, 0b00110, 0b01000, 0b11111], // 2
    [0b11110, 0b00001, 0b00110, 0b00001, 0b11110], // 3
    [0b00110, 0b01010, 0b10010, 0b11111, 0b00010], // 4
    [0b11111, 0b10000, 0b11110, 0b00001, 0b11110], // 5
    [0b01110, 0b10000, 0b11110, 0b10001, 0b01110], // 6
    [0b11111, 0b00001, 0b00010, 0b00100, 0b00100], // 7
    [0b01110, 0b10001, 0b01110, 0b10001, 0b01110], // 8
    [0b01110, 0b10001, 0b01111, 0b00001, 0b01110], // 9
];

fn digit_glyph(c: char) -> Option<&'static [u8; 5]> {
    let d = c.to_digit(10)?;
    DIGITS_5X5.get(d as usize)
}

/// Pixel width of `digits` glyphs at `scale`, with one `scale`-wide gap between glyphs.
fn label_width(digits: u32, scale: u32) -> u32 {
    digits * GLYPH_SIZE * scale + digits.saturating_sub(1) * scale
}

/// Glyph pixel scale for a label of `digits` characters inside a `cell_w × cell_h` cell.
///
/// Preferred size is `font_factor` of the cell height. When that label would
/// not fit inside the cell, `fallback_factor` is tried, then scale 1.
pub(crate) fn label_scale(
    cell_w: u32,
    cell_h: u32,
    digits: u32,
    font_factor: f32,
    fallback_factor: f32,
) -> u32 {
    let fits = |scale: u32| label_width(digits, scale) <= cell_w && GLYPH_SIZE * scale <= cell_h;
    let scale_for = |factor: f32| ((cell_h as f32 * factor) / GLYPH_SIZE as f32).floor().max(1.0) as u32;

    let preferred = scale_for(font_factor);
    if fits(preferred) {
        return preferred;
    }
    let fallback = scale_for(fallback_factor);
    if fits(fallback) {
        tracing::debug!(cell_w, cell_h, preferred, fallback, "label too large, using fallback size");
        return fallback;
    }
    1
}

fn draw_glyph(canvas: &mut RgbaImage, glyph: &[u8; 5], px: u32, py: u32, scale: u32, colour: Rgba<u8>) {
    let (w, h) = canvas.dimensions();
    for (row, &bits) in glyph.iter().enumerate() {
        for col in 0..GLYPH_SIZE {
            if (bits >> (GLYPH_SIZE - 1 - col)) & 1 == 0 {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    let x = px + col * scale + sx;
                    let y = py + row as u32 * scale + sy;
                    if x < w && y < h {
                        canvas.put_pixel(x, y, colour);
                    }
                }
            }
        }
    }
}

fn draw_label(canvas: &mut RgbaImage, label: &str, px: u32, py: u32, scale: u32, colour: Rgba<u8>) {
    let step = GLYPH_SIZE * scale + scale;
    for (i, c) in label.chars().enumerate() {
        if let Some(glyph) = digit_glyph(c) {
            draw_glyph(canvas, glyph, px + i as u32 * step, py, scale, colour);
        }
    }
}

fn fill_rect(canvas: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, colour: Rgba<u8>) {
    let (w, h) = canvas.dimensions();
    for y in y0.min(h)..y1.min(h) {
        for x in x0.min(w)..x1.min(w) {
            canvas.put_pixel(x, y, colour);
        }
    }
}

/// Grid renderer with a fixed colour and line width.
#[derive(Debug, Clone)]
pub struct NumberedGridRenderer {
    colour: Rgba<u8>,
    line_width: u32,
    font_factor: f32,
    font_fallback_factor: f32,
}

impl NumberedGridRenderer {
    pub fn from_config(cfg: &GridConfig) -> Self {
        let [r, g, b] = cfg.color;
        Self {
            colour: Rgba([r, g, b, 255]),
            line_width: cfg.line_width.max(1),
            font_factor: cfg.font_factor,
            font_fallback_factor: cfg.font_fallback_factor,
        }
    }
}

impl Default for NumberedGridRenderer {
    fn default() -> Self {
        Self::from_config(&GridConfig::default())
    }
}

impl GridRenderer for NumberedGridRenderer {
    fn render(&self, frame: &RgbaImage, cells: &[(GridAddress, Region)]) -> GridZoomResult<RgbaImage> {
        let (w, h) = frame.dimensions();
        let bounds = Region::full(w, h)?;
        if cells.is_empty() {
            return Err(GridZoomError::Perception("no grid cells to draw".into()));
        }
        if let Some((addr, cell)) = cells.iter().find(|(_, cell)| !bounds.contains_region(cell)) {
            return Err(GridZoomError::Perception(format!(
                "cell {addr} ({cell}) lies outside the {w}x{h} frame"
            )));
        }

        let mut canvas = frame.clone();
        let half = self.line_width / 2;

        // ── Grid lines on interior cell boundaries ───────────────────────────
        for (addr, cell) in cells {
            if addr.row() == 0 && addr.col() > 0 {
                let x0 = cell.x().saturating_sub(half);
                fill_rect(&mut canvas, x0, 0, x0 + self.line_width, h, self.colour);
            }
            if addr.col() == 0 && addr.row() > 0 {
                let y0 = cell.y().saturating_sub(half);
                fill_rect(&mut canvas, 0, y0, w, y0 + self.line_width, self.colour);
            }
        }

        // ── Cell numbers centered in every cell ──────────────────────────────
        for (addr, cell) in cells {
            let label = addr.cell().to_string();
            let digits = label.len() as u32;
            let scale = label_scale(
                cell.width(),
                cell.height(),
                digits,
                self.font_factor,
                self.font_fallback_factor,
            );
            let (cx, cy) = cell.center();
            let lx = cx.saturating_sub(label_width(digits, scale) / 2);
            let ly = cy.saturating_sub(GLYPH_SIZE * scale / 2);
            draw_label(&mut canvas, &label, lx, ly, scale, self.colour);
        }

        Ok(canvas)
    }
}
