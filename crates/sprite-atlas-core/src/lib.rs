//! Core library for packing icons into a grid sprite atlas with a CSS stylesheet.
//!
//! - Layout: `plan_grid` picks a `ceil(sqrt(n))` square grid of fixed-size cells
//! - Compositing: each source (GIF/JPEG/PNG) is fitted into its cell preserving
//!   aspect ratio, centered, resampled and drawn over the background color
//! - Stylesheet: one container rule plus one `background-position` rule per item
//! - Unreadable sources are skipped and reported, never fatal
//!
//! Quick example:
//! ```ignore
//! use sprite_atlas_core::prelude::*;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let items: ItemSet = [("home", "icons/home.png"), ("search", "icons/search.gif")]
//!     .into_iter()
//!     .collect();
//! let cfg = AtlasConfig::builder()
//!     .out_image("public/icons.png")
//!     .out_css("public/icons.css")
//!     .format(OutputFormat::Png)
//!     .css_class(".icon")
//!     .css_path("icons.png")
//!     .build();
//! let out = generate(&items, &cfg)?;
//! println!("{}", out.stats().summary());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod stylesheet;

pub use config::*;
pub use error::*;
pub use layout::*;
pub use model::*;
pub use pipeline::*;
pub use stylesheet::*;

/// Convenience prelude for common types and functions.
/// Importing `sprite_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder, Background, OutputFormat};
    pub use crate::error::AtlasError;
    pub use crate::layout::{GridPlan, plan_grid};
    pub use crate::model::{AtlasStats, ItemSet, PlacedItem, Rect, SkipReason, SkippedItem};
    pub use crate::pipeline::{AtlasOutput, composite, composite_with_progress, generate};
    pub use crate::stylesheet::{render_stylesheet, sanitize_name};
}
