use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Encoded format of the atlas image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless, best compression with adaptive filtering.
    Png,
    /// Lossy at `AtlasConfig::jpeg_quality`.
    #[default]
    #[serde(alias = "jpeg")]
    Jpg,
}

impl OutputFormat {
    /// Conventional file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

/// Names are matched exactly: `png`, `jpg` or `jpeg`.
impl FromStr for OutputFormat {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            _ => Err(()),
        }
    }
}

/// Opaque background color of the atlas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Background(pub [u8; 3]);

impl Background {
    pub const WHITE: Self = Self([0xFF, 0xFF, 0xFF]);
    pub const BLACK: Self = Self([0x00, 0x00, 0x00]);
}

impl Default for Background {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for Background {
    type Err = String;

    /// Accepts `#rrggbb`, `rrggbb` or `r,g,b` (decimal).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains(',') {
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(format!("expected three components in '{s}'"));
            }
            let mut rgb = [0u8; 3];
            for (slot, part) in rgb.iter_mut().zip(parts) {
                *slot = part
                    .parse()
                    .map_err(|_| format!("invalid color component '{part}'"))?;
            }
            return Ok(Self(rgb));
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected 6 hex digits in '{s}'"));
        }
        let mut rgb = [0u8; 3];
        for (i, slot) in rgb.iter_mut().enumerate() {
            *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| format!("invalid hex color '{s}'"))?;
        }
        Ok(Self(rgb))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasConfig {
    /// Where the encoded atlas image is written.
    pub out_image: PathBuf,
    /// Where the stylesheet is written (overwritten if present).
    pub out_css: PathBuf,
    #[serde(default)]
    pub out_format: OutputFormat,
    /// Selector prefix, e.g. `.icon` gives `.icon.icon-home`.
    pub css_class: String,
    /// Image URL embedded in the container rule.
    pub css_path: String,

    /// Gap before every cell, starting from the top-left corner.
    pub cell_padding: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    #[serde(default)]
    pub background: Background,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            out_image: PathBuf::from("sprite.jpg"),
            out_css: PathBuf::from("sprite.css"),
            out_format: OutputFormat::default(),
            css_class: ".sprite".into(),
            css_path: "sprite.jpg".into(),
            cell_padding: 2,
            cell_width: 32,
            cell_height: 32,
            background: Background::default(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_jpeg_quality() -> u8 {
    85
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if a cell dimension is zero or the JPEG quality is
    /// outside `1..=100`.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasError;

        if self.cell_width == 0 || self.cell_height == 0 {
            return Err(AtlasError::InvalidDimensions {
                width: self.cell_width,
                height: self.cell_height,
            });
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AtlasError::InvalidConfig(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn out_image(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.out_image = v.into();
        self
    }
    pub fn out_css(mut self, v: impl Into<PathBuf>) -> Self {
        self.cfg.out_css = v.into();
        self
    }
    pub fn format(mut self, v: OutputFormat) -> Self {
        self.cfg.out_format = v;
        self
    }
    pub fn css_class(mut self, v: impl Into<String>) -> Self {
        self.cfg.css_class = v.into();
        self
    }
    pub fn css_path(mut self, v: impl Into<String>) -> Self {
        self.cfg.css_path = v.into();
        self
    }
    pub fn cell_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.cell_width = w;
        self.cfg.cell_height = h;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.cell_padding = v;
        self
    }
    pub fn background(mut self, v: Background) -> Self {
        self.cfg.background = v;
        self
    }
    pub fn jpeg_quality(mut self, v: u8) -> Self {
        self.cfg.jpeg_quality = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}

impl AtlasConfig {
    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}
