use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        self.x <= r.right() && r.x <= self.right() && self.y <= r.bottom() && r.y <= self.bottom()
    }
}

/// Named source images to pack.
///
/// Names are unique; iteration is always in lexicographic name order, which
/// is also the order cells are assigned in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSet {
    items: BTreeMap<String, PathBuf>,
}

impl ItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the item called `name`. Returns the previous path, if any.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.items.insert(name.into(), path.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in placement order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }
}

impl<K: Into<String>, P: Into<PathBuf>> FromIterator<(K, P)> for ItemSet {
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, p) in iter {
            set.insert(k, p);
        }
        set
    }
}

/// An item that made it into the atlas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacedItem {
    pub name: String,
    /// Row-major cell index in name order.
    pub index: usize,
    /// Top-left of the cell; this is what the stylesheet references.
    pub x: u32,
    pub y: u32,
    /// Where the fitted image was actually drawn, inside the cell.
    pub drawn: Rect,
    /// Pixel size of the decoded source.
    pub source_size: (u32, u32),
}

/// Why an item was left out of the atlas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No file at the given path.
    Missing,
    /// Not a GIF, JPEG or PNG (sniffed from content).
    UnsupportedFormat,
    /// The file could not be read or decoded.
    Decode(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("file not found"),
            Self::UnsupportedFormat => f.write_str("unsupported image format"),
            Self::Decode(e) => write!(f, "decode failed: {e}"),
        }
    }
}

/// An item whose cell stayed background-filled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedItem {
    pub name: String,
    pub index: usize,
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Statistics about a compositing run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AtlasStats {
    /// Cells in the grid (`rows * cols`).
    pub cells: usize,
    /// Items that were requested.
    pub requested: usize,
    pub placed: usize,
    pub skipped: usize,
    pub atlas_width: u32,
    pub atlas_height: u32,
    /// placed / cells (0.0 to 1.0).
    pub fill_ratio: f64,
}

impl AtlasStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Atlas: {}x{} px, Cells: {}, Placed: {}/{}, Skipped: {}, Fill: {:.2}%",
            self.atlas_width,
            self.atlas_height,
            self.cells,
            self.placed,
            self.requested,
            self.skipped,
            self.fill_ratio * 100.0,
        )
    }

    /// Cells that ended up background-only (skipped items plus trailing empties).
    pub fn empty_cells(&self) -> usize {
        self.cells.saturating_sub(self.placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_set_iterates_sorted_and_replaces_duplicates() {
        let mut set: ItemSet = [("zeta", "z.png"), ("alpha", "a.png"), ("Mid", "m.png")]
            .into_iter()
            .collect();
        assert_eq!(set.insert("alpha", "a2.png"), Some(PathBuf::from("a.png")));
        let names: Vec<&str> = set.iter().map(|(n, _)| n).collect();
        // byte order: uppercase sorts before lowercase
        assert_eq!(names, vec!["Mid", "alpha", "zeta"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn rect_intersection_is_inclusive() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.intersects(&Rect::new(9, 9, 5, 5)));
        assert!(!a.intersects(&Rect::new(10, 0, 5, 5)));
        assert!(a.contains(&Rect::new(2, 2, 8, 8)));
        assert!(!a.contains(&Rect::new(2, 2, 9, 8)));
    }
}
