use thiserror::Error;

/// Failures surfaced by the palette pipeline.
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("unable to decode image: {0}")]
    ImageLoad(#[from] image::ImageError),
    #[error("no image loaded")]
    NoImage,
    #[error("cannot extract a palette from zero pixels")]
    EmptyInput,
    #[error("cluster count must be in 1..={max}, got {0}", max = crate::extractor::MAX_CLUSTERS)]
    InvalidClusterCount(usize),
    #[error("color database has no entries")]
    EmptyDatabase,
}

/// Reasons an external color table could not be used.
///
/// These never reach the end user: [`ColorDatabase::load`](crate::ColorDatabase::load)
/// logs them and falls back to the embedded table.
#[derive(Debug, Error)]
pub enum DatabaseLoadError {
    #[error("failed to read color table: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed color table: {0}")]
    Csv(#[from] csv::Error),
    #[error("color table is missing the `R,G,B,Name` header")]
    MissingHeader,
    #[error("color table has no valid rows")]
    NoEntries,
}

pub type Result<T, E = PaletteError> = std::result::Result<T, E>;
