use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{debug, info};

use crate::Pixel;
use crate::database::ColorDatabase;
use crate::error::{PaletteError, Result};
use crate::extractor::{ExtractOptions, extract_with};
use crate::namer::{PaletteResult, name_palette};
use crate::sampler::{resize_area, sample};

/// Holds the currently loaded image and runs the palette pipeline on it.
#[derive(Debug, Default)]
pub struct ImageProcessor {
    path: Option<PathBuf>,
    image: Option<RgbImage>,
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the file at `path`. On failure nothing stays loaded.
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.clear();
        let img = image::open(path)?.to_rgb8();
        info!("loaded {} ({}x{})", path.display(), img.width(), img.height());
        self.path = Some(path.to_path_buf());
        self.image = Some(img);
        Ok(())
    }

    /// Decodes an in-memory encoded image. On failure nothing stays loaded.
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.clear();
        let img = image::load_from_memory(bytes)?.to_rgb8();
        debug!("decoded {}x{} image from memory", img.width(), img.height());
        self.image = Some(img);
        Ok(())
    }

    /// Uses an already decoded image.
    pub fn set_image(&mut self, img: RgbImage) {
        self.path = None;
        self.image = Some(img);
    }

    pub fn clear(&mut self) {
        self.path = None;
        self.image = None;
    }

    pub fn image(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn loaded(&self) -> Result<&RgbImage> {
        self.image.as_ref().ok_or(PaletteError::NoImage)
    }

    /// The loaded image scaled to fit inside `max_w × max_h`, aspect ratio
    /// kept. Images that already fit are returned at their own size.
    pub fn display_image(&self, max_w: u32, max_h: u32) -> Result<RgbImage> {
        let img = self.loaded()?;
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return Ok(img.clone());
        }

        let scale = (max_w as f32 / w as f32).min(max_h as f32 / h as f32);
        let new_w = ((w as f32 * scale) as u32).max(1);
        let new_h = ((h as f32 * scale) as u32).max(1);
        Ok(resize_area(img, new_w, new_h))
    }

    /// Samples the loaded image and clusters it into `opts.clusters` colors.
    pub fn extract_palette(&self, opts: &ExtractOptions) -> Result<Vec<Pixel>> {
        let pixels = sample(self.loaded()?, opts.sample_side);
        extract_with(&pixels, opts)
    }

    /// Full pipeline: sample, cluster, then name every color against `db`.
    pub fn named_palette(&self, db: &ColorDatabase, opts: &ExtractOptions) -> Result<PaletteResult> {
        let palette = self.extract_palette(opts)?;
        name_palette(&palette, db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn nothing_loaded() {
        let p = ImageProcessor::new();
        assert!(matches!(
            p.extract_palette(&ExtractOptions::default()),
            Err(PaletteError::NoImage)
        ));
        assert!(matches!(p.display_image(400, 400), Err(PaletteError::NoImage)));
    }

    #[test]
    fn bad_bytes_clear_previous_image() {
        let mut p = ImageProcessor::new();
        p.set_image(RgbImage::new(4, 4));
        let err = p.load_image_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, PaletteError::ImageLoad(_)));
        assert!(p.image().is_none());
    }

    #[test]
    fn missing_file_is_load_error() {
        let mut p = ImageProcessor::new();
        assert!(p.load_image("/no/such/picture.png").is_err());
        assert!(p.path().is_none());
    }

    #[test]
    fn display_keeps_aspect() {
        let mut p = ImageProcessor::new();
        p.set_image(RgbImage::from_pixel(1000, 500, Rgb([9, 9, 9])));
        let shown = p.display_image(500, 400).unwrap();
        assert_eq!(shown.dimensions(), (500, 250));
        assert_eq!(shown.get_pixel(0, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn display_never_upscales() {
        let mut p = ImageProcessor::new();
        p.set_image(RgbImage::new(50, 20));
        assert_eq!(p.display_image(500, 400).unwrap().dimensions(), (50, 20));
    }

    #[test]
    fn names_palette_of_loaded_png() {
        let img = RgbImage::from_fn(60, 30, |x, _| {
            if x < 30 { Rgb([250, 2, 3]) } else { Rgb([1, 2, 252]) }
        });
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let mut p = ImageProcessor::new();
        p.load_image_bytes(&bytes).unwrap();
        let opts = ExtractOptions::default().with_clusters(2);
        let mut names: Vec<_> = p
            .named_palette(&ColorDatabase::builtin(), &opts)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        names.sort();
        assert_eq!(names, ["Blue", "Red"]);
    }
}
