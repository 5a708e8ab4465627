//! Raster operations used by the compositor: canvas allocation, source
//! decoding, fit-and-center math, resampled drawing and final encoding.

use crate::config::{Background, OutputFormat};
use crate::error::{AtlasError, Result};
use crate::model::{Rect, SkipReason};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};
use image::{RgbImage, RgbaImage};
use jpeg_encoder::{ColorType, Encoder as JpegEncoder};
use std::path::Path;

/// Resampling filter for fitting sources into cells.
pub const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// Allocates a `width` x `height` truecolor canvas filled with `background`.
///
/// Fails with `CanvasAllocation` for zero or unrepresentable sizes, or when the
/// pixel buffer cannot be reserved.
pub fn allocate_canvas(width: u32, height: u32, background: Background) -> Result<RgbImage> {
    let err = || AtlasError::CanvasAllocation { width, height };
    if width == 0 || height == 0 {
        return Err(err());
    }
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(err)?;
    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| err())?;
    buf.resize(len, 0);
    for px in buf.chunks_exact_mut(3) {
        px.copy_from_slice(&background.0);
    }
    RgbImage::from_raw(width, height, buf).ok_or_else(err)
}

/// Decodes a GIF, JPEG or PNG file. The format is sniffed from content,
/// falling back to the extension.
pub fn load_source(path: &Path) -> std::result::Result<DynamicImage, SkipReason> {
    if !path.exists() {
        return Err(SkipReason::Missing);
    }
    let decode_err = |e: &dyn std::fmt::Display| SkipReason::Decode(e.to_string());
    let reader = ImageReader::open(path)
        .map_err(|e| decode_err(&e))?
        .with_guessed_format()
        .map_err(|e| decode_err(&e))?;
    match reader.format() {
        Some(ImageFormat::Gif | ImageFormat::Jpeg | ImageFormat::Png) => {}
        _ => return Err(SkipReason::UnsupportedFormat),
    }
    let img = reader.decode().map_err(|e| decode_err(&e))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(SkipReason::Decode("image has no pixels".into()));
    }
    Ok(img)
}

/// Largest size with the source's aspect ratio that fits in the cell.
///
/// The axis with the smaller scale factor is clamped to the cell, the other is
/// derived and truncated. Neither result is below 1 or above the cell size.
pub fn fit_within(src_w: u32, src_h: u32, cell_w: u32, cell_h: u32) -> (u32, u32) {
    let sw = src_w.max(1) as u64;
    let sh = src_h.max(1) as u64;
    let cw = cell_w as u64;
    let ch = cell_h as u64;
    // cw / sw < ch / sh, cross-multiplied
    let (w, h) = if cw * sh < ch * sw {
        (cw, cw * sh / sw)
    } else {
        (ch * sw / sh, ch)
    };
    (w.max(1) as u32, h.max(1) as u32)
}

/// Origin that centers a `w` x `h` image in `cell`; odd leftovers go right/bottom.
pub fn centered_origin(cell: &Rect, w: u32, h: u32) -> (u32, u32) {
    (
        cell.x + cell.w.saturating_sub(w) / 2,
        cell.y + cell.h.saturating_sub(h) / 2,
    )
}

/// Fits `src` into `cell`, resamples it and draws it centered on `canvas`.
/// Returns the rectangle that was drawn.
pub fn draw_fitted(canvas: &mut RgbImage, src: &DynamicImage, cell: &Rect) -> Rect {
    let (w, h) = fit_within(src.width(), src.height(), cell.w, cell.h);
    let (x, y) = centered_origin(cell, w, h);
    let scaled = if (w, h) == (src.width(), src.height()) {
        src.to_rgba8()
    } else {
        src.resize_exact(w, h, RESAMPLE_FILTER).to_rgba8()
    };
    blend_rgba(&scaled, canvas, x, y);
    Rect::new(x, y, w, h)
}

/// Alpha-blends `src` over `canvas` with its top-left at (dx, dy).
/// Pixels falling outside the canvas are dropped.
pub fn blend_rgba(src: &RgbaImage, canvas: &mut RgbImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    for yy in 0..sh {
        if dy + yy >= ch {
            break;
        }
        for xx in 0..sw {
            if dx + xx >= cw {
                break;
            }
            let s = src.get_pixel(xx, yy).0;
            let a = s[3] as u16;
            if a == 0 {
                continue;
            }
            let d = canvas.get_pixel_mut(dx + xx, dy + yy);
            for c in 0..3 {
                let blended = (s[c] as u16 * a + d.0[c] as u16 * (255 - a) + 127) / 255;
                d.0[c] = blended as u8;
            }
        }
    }
}

/// Encodes the canvas as PNG (best compression, adaptive filtering) or
/// progressive JPEG at `jpeg_quality`.
pub fn encode_canvas(canvas: &RgbImage, format: OutputFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let (w, h) = canvas.dimensions();
    let mut bytes: Vec<u8> = Vec::new();
    match format {
        OutputFormat::Png => {
            PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, PngFilter::Adaptive)
                .write_image(canvas.as_raw(), w, h, ExtendedColorType::Rgb8)
                .map_err(|e| AtlasError::Encode(e.to_string()))?;
        }
        OutputFormat::Jpg => {
            // JPEG frames are limited to 65535 px per side
            let (jw, jh) = match (u16::try_from(w), u16::try_from(h)) {
                (Ok(jw), Ok(jh)) => (jw, jh),
                _ => {
                    return Err(AtlasError::Encode(format!(
                        "{w}x{h} exceeds the JPEG size limit"
                    )));
                }
            };
            let mut encoder = JpegEncoder::new(&mut bytes, jpeg_quality);
            encoder.set_progressive(true);
            encoder
                .encode(canvas.as_raw(), jw, jh, ColorType::Rgb)
                .map_err(|e| AtlasError::Encode(e.to_string()))?;
        }
    }
    Ok(bytes)
}
