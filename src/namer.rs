use crate::Pixel;
use crate::database::ColorDatabase;
use crate::error::Result;

/// A palette color with its hex code and nearest reference name.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedColor {
    pub rgb: Pixel,
    pub hex: String,
    pub name: String,
}

/// Palette entries in palette order.
pub type PaletteResult = Vec<NamedColor>;

/// `#rrggbb`, lowercase.
pub fn rgb_to_hex(rgb: Pixel) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

/// Parses `rrggbb` with an optional leading `#`.
pub fn parse_hex(s: &str) -> Option<Pixel> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Pixel::new(r, g, b))
}

/// Attaches hex code and nearest name to every palette color, keeping order.
pub fn name_palette(palette: &[Pixel], db: &ColorDatabase) -> Result<PaletteResult> {
    palette
        .iter()
        .map(|&rgb| {
            Ok(NamedColor {
                rgb,
                hex: rgb_to_hex(rgb),
                name: db.nearest(rgb)?.to_string(),
            })
        })
        .collect()
}

/// Text handed to the speech collaborator for a color.
pub fn describe(color: &NamedColor) -> &str {
    &color.name
}
