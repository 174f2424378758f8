//! Uniform grid math: world <-> cell mapping and segment traversal.
//!
//! Cells are 1-based: cell `(1, 1)` spans `[0, cell_size)` on both axes.

use glam::DVec2;

use crate::error::{CollisionError, Result};
use crate::types::{Cell, CellRect, Rect};

/// Largest cell coordinate magnitude the grid indexes. Cell rect widths and
/// traversal distances between in-range cells stay inside `i32`.
pub const MAX_CELL: f64 = (1u32 << 28) as f64;

/// True when world coordinate `v` quantizes to a cell within `MAX_CELL`.
/// False for NaN and infinities.
pub fn in_range(cell_size: f64, v: f64) -> bool {
    (v / cell_size).abs() < MAX_CELL
}

fn quantize(v: f64) -> i32 {
    (v.floor() as i32).saturating_add(1)
}

/// Cell containing the world point `(x, y)`. Saturates outside the grid range.
pub fn to_cell(cell_size: f64, x: f64, y: f64) -> Cell {
    Cell::new(quantize(x / cell_size), quantize(y / cell_size))
}

/// Top-left world coordinate of cell `(cx, cy)`.
pub fn to_world(cell_size: f64, cx: i32, cy: i32) -> DVec2 {
    DVec2::new((f64::from(cx) - 1.0) * cell_size, (f64::from(cy) - 1.0) * cell_size)
}

/// Smallest cell rect covering `rect`. Far edges use `ceil`, so a rect ending
/// exactly on a cell boundary does not claim the next row/column.
///
/// Fails with `InvalidRect` when any edge lies outside the grid range.
pub fn to_cell_rect(cell_size: f64, rect: Rect) -> Result<CellRect> {
    let edges = [rect.x, rect.y, rect.right(), rect.bottom()];
    if !edges.into_iter().all(|v| in_range(cell_size, v)) {
        return Err(CollisionError::InvalidRect { x: rect.x, y: rect.y, w: rect.w, h: rect.h });
    }
    let Cell { cx, cy } = to_cell(cell_size, rect.x, rect.y);
    let cr = (rect.right() / cell_size).ceil() as i32;
    let cb = (rect.bottom() / cell_size).ceil() as i32;
    Ok(CellRect { left: cx, top: cy, width: cr - cx + 1, height: cb - cy + 1 })
}

/// Per-axis DDA setup: (step, parametric distance per cell, parametric distance
/// to the first boundary).
fn init_step(cell_size: f64, ct: i32, t1: f64, t2: f64) -> (i32, f64, f64) {
    let v = t2 - t1;
    if v > 0.0 {
        (1, cell_size / v, (f64::from(ct) * cell_size - t1) / v)
    } else if v < 0.0 {
        (-1, -cell_size / v, (f64::from(ct - 1) * cell_size - t1) / v)
    } else {
        (0, f64::INFINITY, f64::INFINITY)
    }
}

/// Visit every cell the segment `p1 -> p2` passes through, from start to end.
///
/// Based on Amanatides & Woo, "A Fast Voxel Traversal Algorithm for Ray Tracing",
/// with two changes: passing exactly through a grid corner visits both cells that
/// share it, and the walk stops once it is next to the last cell (which is then
/// visited explicitly) instead of waiting to land on it.
///
/// A cell may be visited more than once; callers dedupe. A segment with an
/// endpoint outside the grid range visits nothing.
pub fn traverse(cell_size: f64, p1: DVec2, p2: DVec2, mut visit: impl FnMut(Cell)) {
    if ![p1.x, p1.y, p2.x, p2.y].into_iter().all(|v| in_range(cell_size, v)) {
        return;
    }
    let start = to_cell(cell_size, p1.x, p1.y);
    let end = to_cell(cell_size, p2.x, p2.y);
    let (step_x, dx, mut tx) = init_step(cell_size, start.cx, p1.x, p2.x);
    let (step_y, dy, mut ty) = init_step(cell_size, start.cy, p1.y, p2.y);
    let (mut cx, mut cy) = (start.cx, start.cy);

    visit(start);

    while (cx - end.cx).abs() + (cy - end.cy).abs() > 1 {
        if tx < ty {
            tx += dx;
            cx += step_x;
            visit(Cell::new(cx, cy));
        } else {
            if tx == ty {
                visit(Cell::new(cx + step_x, cy));
            }
            ty += dy;
            cy += step_y;
            visit(Cell::new(cx, cy));
        }
    }

    if cx != end.cx || cy != end.cy {
        visit(end);
    }
}
