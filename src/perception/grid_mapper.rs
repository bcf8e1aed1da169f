/// Grid ↔ pixel coordinate mapping for the grid-zoom protocol.
///
/// A region is split into `grid_size × grid_size` cells by floor division.
/// The last column absorbs the horizontal remainder and the last row the
/// vertical one, so the cells tile the region with no gaps or overlaps.
use crate::perception::types::{GridAddress, Region, ScaleFactor, ScreenPoint};

/// Floor cell size of `region` for `grid_size`. Remainder pixels are not included.
pub fn cell_size(region: &Region, grid_size: u32) -> (u32, u32) {
    let grid_size = grid_size.max(1);
    (region.width() / grid_size, region.height() / grid_size)
}

/// Whether every cell of `region` is at least `min_px` wide and tall.
pub fn can_partition(region: &Region, grid_size: u32, min_px: u32) -> bool {
    let (cw, ch) = cell_size(region, grid_size);
    cw >= min_px.max(1) && ch >= min_px.max(1)
}

/// Extent of cell `index` (0-based) along one axis of length `len` split into `n` parts.
fn span(origin: u32, len: u32, n: u32, index: u32) -> (u32, u32) {
    let step = len / n;
    let start = origin + index * step;
    let extent = if index + 1 == n { len - index * step } else { step };
    (start, extent)
}

/// Sub-rectangle of `region` occupied by `cell`.
///
/// Callers must ensure the region can be partitioned (`can_partition(.., 1)`);
/// the controller never holds a region whose cells are smaller than one pixel.
pub fn cell_to_subregion(cell: GridAddress, region: &Region, grid_size: u32) -> Region {
    debug_assert_eq!(cell.grid_size(), grid_size, "cell {cell} addressed on a different grid");
    let n = grid_size.max(1);
    let (x, w) = span(region.x(), region.width(), n, cell.col());
    let (y, h) = span(region.y(), region.height(), n, cell.row());
    // w/h are at least the floor cell size, which is ≥ 1 for a partitionable region.
    Region::new(x, y, w.max(1), h.max(1)).unwrap_or(*region)
}

/// Center of `cell` in capture pixels, before scale correction.
pub fn cell_center(cell: GridAddress, region: &Region, grid_size: u32) -> (u32, u32) {
    cell_to_subregion(cell, region, grid_size).center()
}

/// Absolute interactive-screen point for `cell`: the sub-region center times `scale`.
pub fn cell_to_point(
    cell: GridAddress,
    region: &Region,
    grid_size: u32,
    scale: ScaleFactor,
) -> ScreenPoint {
    let (cx, cy) = cell_center(cell, region, grid_size);
    ScreenPoint {
        x: cx as f64 * scale.sx,
        y: cy as f64 * scale.sy,
    }
}

/// All cells of `region` in row-major order.
pub fn all_cells(region: &Region, grid_size: u32) -> Vec<(GridAddress, Region)> {
    let n = grid_size.max(1);
    (1..=n * n)
        .filter_map(|cell| GridAddress::new(cell, n))
        .map(|addr| (addr, cell_to_subregion(addr, region, n)))
        .collect()
}
