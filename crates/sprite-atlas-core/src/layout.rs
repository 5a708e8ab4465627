use crate::model::Rect;
use serde::{Deserialize, Serialize};

/// Square grid of uniform cells.
///
/// Every cell is preceded by `padding` pixels on its left and top, so the
/// atlas carries leading padding but no trailing padding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridPlan {
    pub rows: u32,
    pub cols: u32,
    /// Atlas width in pixels (`cols * (cell_width + padding)`).
    pub width: u32,
    /// Atlas height in pixels (`rows * (cell_height + padding)`).
    pub height: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub padding: u32,
}

impl GridPlan {
    /// Number of cells, including trailing empty ones.
    pub fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Top-left pixel of cell `index`, row-major.
    pub fn coordinate_for(&self, index: usize) -> (u32, u32) {
        let cols = self.cols.max(1) as usize;
        let col = (index % cols) as u32;
        let row = (index / cols) as u32;
        // saturates like `plan_grid` for geometries beyond u32
        let x = self
            .padding
            .saturating_add(self.cell_width.saturating_add(self.padding).saturating_mul(col));
        let y = self
            .padding
            .saturating_add(self.cell_height.saturating_add(self.padding).saturating_mul(row));
        (x, y)
    }

    /// Full cell rectangle of `index`.
    pub fn cell_rect(&self, index: usize) -> Rect {
        let (x, y) = self.coordinate_for(index);
        Rect::new(x, y, self.cell_width, self.cell_height)
    }
}

/// Smallest `s` with `s * s >= n`.
fn ceil_sqrt(n: usize) -> u32 {
    let mut s = (n as f64).sqrt().ceil() as u64;
    // float sqrt can be off by one for very large n
    while s > 0 && (s - 1) * (s - 1) >= n as u64 {
        s -= 1;
    }
    while s * s < n as u64 {
        s += 1;
    }
    s as u32
}

/// Plans a `ceil(sqrt(item_count))` square grid for the given cell geometry.
///
/// The grid is always square even when a narrower rectangle would hold the
/// items; trailing cells stay empty. Zero items give a 0x0 plan.
pub fn plan_grid(item_count: usize, cell_width: u32, cell_height: u32, padding: u32) -> GridPlan {
    let side = ceil_sqrt(item_count);
    GridPlan {
        rows: side,
        cols: side,
        width: side.saturating_mul(cell_width.saturating_add(padding)),
        height: side.saturating_mul(cell_height.saturating_add(padding)),
        cell_width,
        cell_height,
        padding,
    }
}
