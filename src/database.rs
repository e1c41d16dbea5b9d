use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use csv::{ByteRecord, ReaderBuilder, Trim};
use log::{debug, info, warn};

use crate::Pixel;
use crate::error::{DatabaseLoadError, PaletteError, Result};

const BUILTIN_TABLE: &str = include_str!("../assets/colors.csv");

/// A named reference color.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorEntry {
    pub rgb: Pixel,
    pub name: String,
}

/// Ordered RGB → name table used for nearest-name matching.
///
/// Keys are unique. Iteration order is insertion order and decides ties in
/// [`ColorDatabase::nearest`].
#[derive(Clone, Debug, Default)]
pub struct ColorDatabase {
    entries: Vec<ColorEntry>,
    index: HashMap<(u8, u8, u8), usize>,
}

impl ColorDatabase {
    /// Loads a `R,G,B,Name` table from `path`.
    ///
    /// Never fails: an unreadable or unusable table is logged and replaced by
    /// [`ColorDatabase::builtin`].
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let loaded = File::open(path)
            .map_err(DatabaseLoadError::from)
            .and_then(Self::from_csv_reader);

        match loaded {
            Ok(db) => {
                info!("loaded {} colors from {}", db.len(), path.display());
                db
            }
            Err(e) => {
                warn!("{}: {e}; using built-in color table", path.display());
                Self::builtin()
            }
        }
    }

    /// Parses a `R,G,B,Name` table. Malformed rows (bad channels, missing or
    /// empty name, invalid UTF-8) are skipped one by one; a missing header or
    /// a table without a single valid row is an error.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatabaseLoadError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        if !is_header(rdr.byte_headers()?) {
            return Err(DatabaseLoadError::MissingHeader);
        }

        let mut db = Self::default();
        for record in rdr.byte_records() {
            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    debug!("skipping unreadable color row: {e}");
                    continue;
                }
            };
            match parse_row(&record) {
                Some((rgb, name)) => db.insert(rgb, name),
                None => debug!(
                    "skipping malformed color row {}: {:?}",
                    record.position().map_or(0, |p| p.line()),
                    String::from_utf8_lossy(record.as_slice())
                ),
            }
        }

        if db.is_empty() {
            return Err(DatabaseLoadError::NoEntries);
        }
        Ok(db)
    }

    /// The embedded reference table.
    pub fn builtin() -> Self {
        Self::from_csv_reader(BUILTIN_TABLE.as_bytes()).unwrap_or_else(|e| {
            warn!("built-in color table unusable: {e}");
            Self::minimal()
        })
    }

    /// Black and white only; the last-resort table.
    pub fn minimal() -> Self {
        let mut db = Self::default();
        db.insert(Pixel::new(0, 0, 0), "Black".to_string());
        db.insert(Pixel::new(255, 255, 255), "White".to_string());
        db
    }

    /// Builds a table from entries in order; a repeated color keeps its first
    /// position and takes the later name.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Pixel, S)>,
        S: Into<String>,
    {
        let mut db = Self::default();
        for (rgb, name) in entries {
            db.insert(rgb, name.into());
        }
        db
    }

    fn insert(&mut self, rgb: Pixel, name: String) {
        let key = (rgb.red, rgb.green, rgb.blue);
        match self.index.get(&key) {
            Some(&i) => self.entries[i].name = name,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(ColorEntry { rgb, name });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorEntry> {
        self.entries.iter()
    }

    /// Exact lookup.
    pub fn get(&self, rgb: Pixel) -> Option<&str> {
        self.index
            .get(&(rgb.red, rgb.green, rgb.blue))
            .map(|&i| self.entries[i].name.as_str())
    }

    /// Closest entry by Euclidean RGB distance together with that distance.
    /// The first entry at the minimum distance wins.
    pub fn nearest_entry(&self, rgb: Pixel) -> Result<(&ColorEntry, f64)> {
        let mut best: Option<(&ColorEntry, u32)> = None;
        for entry in &self.entries {
            let d = squared_distance(rgb, entry.rgb);
            // strict `<` keeps the earliest entry on ties
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((entry, d));
            }
        }
        best.map(|(entry, d)| (entry, (d as f64).sqrt()))
            .ok_or(PaletteError::EmptyDatabase)
    }

    /// Name of the closest entry.
    pub fn nearest(&self, rgb: Pixel) -> Result<&str> {
        self.nearest_entry(rgb).map(|(entry, _)| entry.name.as_str())
    }
}

/// One-time initialized, then read-only, database slot.
///
/// `load` populates the slot on first use; later calls return the existing
/// table without reloading or merging.
#[derive(Debug, Default)]
pub struct ColorDatabaseCell {
    inner: OnceLock<ColorDatabase>,
}

impl ColorDatabaseCell {
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> &ColorDatabase {
        self.inner.get_or_init(|| ColorDatabase::load(path))
    }

    pub fn get_or_builtin(&self) -> &ColorDatabase {
        self.inner.get_or_init(ColorDatabase::builtin)
    }

    pub fn get(&self) -> Option<&ColorDatabase> {
        self.inner.get()
    }
}

fn squared_distance(a: Pixel, b: Pixel) -> u32 {
    let dr = a.red as i32 - b.red as i32;
    let dg = a.green as i32 - b.green as i32;
    let db = a.blue as i32 - b.blue as i32;
    (dr * dr + dg * dg + db * db) as u32
}

fn is_header(record: &ByteRecord) -> bool {
    let cols: Vec<String> = record
        .iter()
        .map(|c| {
            String::from_utf8_lossy(c)
                .trim_start_matches('\u{feff}')
                .trim()
                .to_ascii_lowercase()
        })
        .collect();
    cols == ["r", "g", "b", "name"]
}

fn parse_row(record: &ByteRecord) -> Option<(Pixel, String)> {
    if record.len() != 4 {
        return None;
    }
    let field = |i: usize| std::str::from_utf8(record.get(i)?).ok();
    let r = field(0)?.parse::<u8>().ok()?;
    let g = field(1)?.parse::<u8>().ok()?;
    let b = field(2)?.parse::<u8>().ok()?;
    let name = field(3)?;
    if name.is_empty() {
        return None;
    }
    Some((Pixel::new(r, g, b), name.to_string()))
}
