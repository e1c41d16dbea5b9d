//! Dominant-color extraction with human-readable color names.
//!
//! The pipeline is:
//! 1. Sample the decoded image down to a small square grid by area averaging.
//! 2. Run seeded, multi-restart k-means in RGB space to get `k` colors.
//! 3. Give every color its `#rrggbb` code and the name of the nearest entry
//!    of a [`ColorDatabase`] (Euclidean RGB distance).

use image::RgbImage;
use palette::Srgb;

pub mod database;
pub mod error;
pub mod extractor;
pub mod namer;
pub mod processor;
pub mod sampler;
#[cfg(not(target_arch = "wasm32"))]
pub mod speech;
mod wasm;

pub use database::{ColorDatabase, ColorDatabaseCell, ColorEntry};
pub use error::{DatabaseLoadError, PaletteError, Result};
pub use extractor::{ExtractOptions, extract, extract_with};
pub use namer::{NamedColor, PaletteResult, name_palette, parse_hex, rgb_to_hex};
pub use processor::ImageProcessor;
pub use sampler::{resize_area, sample};
pub use wasm::extract_named_palette;

/// An 8-bit RGB color.
pub type Pixel = Srgb<u8>;

/// Samples `img`, clusters it and names the resulting palette.
pub fn palette_for_image(
    img: &RgbImage,
    db: &ColorDatabase,
    opts: &ExtractOptions,
) -> Result<PaletteResult> {
    let pixels = sample(img, opts.sample_side);
    let palette = extract_with(&pixels, opts)?;
    name_palette(&palette, db)
}
