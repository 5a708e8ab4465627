use crate::compositing::{allocate_canvas, draw_fitted, encode_canvas, load_source};
use crate::config::AtlasConfig;
use crate::error::Result;
use crate::layout::{GridPlan, plan_grid};
use crate::model::{AtlasStats, ItemSet, PlacedItem, SkippedItem};
use crate::stylesheet::render_stylesheet;
use std::fs;
use tracing::{debug, info, instrument, warn};

/// Result of a compositing run: the encoded atlas, its stylesheet, and which
/// items were placed or skipped.
#[derive(Debug, Clone)]
pub struct AtlasOutput {
    pub plan: GridPlan,
    /// Encoded atlas in the configured format.
    pub image: Vec<u8>,
    pub stylesheet: String,
    /// In cell order.
    pub placed: Vec<PlacedItem>,
    /// In cell order.
    pub skipped: Vec<SkippedItem>,
}

impl AtlasOutput {
    /// Computes run statistics for this output.
    pub fn stats(&self) -> AtlasStats {
        let cells = self.plan.capacity();
        let placed = self.placed.len();
        let fill_ratio = if cells > 0 {
            placed as f64 / cells as f64
        } else {
            0.0
        };
        AtlasStats {
            cells,
            requested: placed + self.skipped.len(),
            placed,
            skipped: self.skipped.len(),
            atlas_width: self.plan.width,
            atlas_height: self.plan.height,
            fill_ratio,
        }
    }
}

/// Composites `items` into an atlas and renders its stylesheet, without
/// touching the output paths.
///
/// Items whose source is missing, not GIF/JPEG/PNG, or undecodable are
/// recorded in `skipped`; their cells keep the background color.
pub fn composite(items: &ItemSet, cfg: &AtlasConfig) -> Result<AtlasOutput> {
    composite_with_progress(items, cfg, |_, _| {})
}

#[instrument(skip_all, fields(items = items.len()))]
/// Same as [`composite`], calling `on_item(index, name)` after each item is
/// processed, whether it was placed or skipped.
pub fn composite_with_progress<F>(
    items: &ItemSet,
    cfg: &AtlasConfig,
    mut on_item: F,
) -> Result<AtlasOutput>
where
    F: FnMut(usize, &str),
{
    cfg.validate()?;

    let plan = plan_grid(items.len(), cfg.cell_width, cfg.cell_height, cfg.cell_padding);
    let mut canvas = allocate_canvas(plan.width, plan.height, cfg.background)?;
    debug!(rows = plan.rows, cols = plan.cols, width = plan.width, height = plan.height, "grid planned");

    let mut placed: Vec<PlacedItem> = Vec::with_capacity(items.len());
    let mut skipped: Vec<SkippedItem> = Vec::new();

    for (index, (name, path)) in items.iter().enumerate() {
        let cell = plan.cell_rect(index);
        match load_source(path) {
            Ok(src) => {
                let drawn = draw_fitted(&mut canvas, &src, &cell);
                debug!(item = name, index, x = cell.x, y = cell.y, ?drawn, "placed");
                placed.push(PlacedItem {
                    name: name.to_string(),
                    index,
                    x: cell.x,
                    y: cell.y,
                    drawn,
                    source_size: (src.width(), src.height()),
                });
                // src is released here, before the next decode
            }
            Err(reason) => {
                warn!(item = name, ?path, %reason, "skip image");
                skipped.push(SkippedItem {
                    name: name.to_string(),
                    index,
                    path: path.to_path_buf(),
                    reason,
                });
            }
        }
        on_item(index, name);
    }

    let image = encode_canvas(&canvas, cfg.out_format, cfg.jpeg_quality)?;
    drop(canvas);
    let stylesheet = render_stylesheet(&placed, &plan, cfg);

    Ok(AtlasOutput {
        plan,
        image,
        stylesheet,
        placed,
        skipped,
    })
}

/// Composites `items` and writes the atlas to `cfg.out_image` and the
/// stylesheet to `cfg.out_css`. Parent directories must already exist.
pub fn generate(items: &ItemSet, cfg: &AtlasConfig) -> Result<AtlasOutput> {
    let out = composite(items, cfg)?;
    write_output(&out, cfg)?;
    Ok(out)
}

/// Writes an already composited output to the configured paths.
pub fn write_output(out: &AtlasOutput, cfg: &AtlasConfig) -> Result<()> {
    fs::write(&cfg.out_image, &out.image)?;
    info!(path = ?cfg.out_image, bytes = out.image.len(), "atlas written");
    fs::write(&cfg.out_css, &out.stylesheet)?;
    info!(path = ?cfg.out_css, rules = out.placed.len(), "stylesheet written");
    Ok(())
}
