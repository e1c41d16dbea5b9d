use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::database::ColorDatabaseCell;
use crate::extractor::ExtractOptions;
use crate::processor::ImageProcessor;

static COLORS: ColorDatabaseCell = ColorDatabaseCell::new();

/// Extract `n_colors` dominant colors from an encoded image and name them.
///
/// Returns an array of `{ hex, name, rgb: [r, g, b] }` objects in palette
/// order.
#[wasm_bindgen(js_name = extractNamedPalette)]
pub fn extract_named_palette(input: Vec<u8>, n_colors: usize) -> Result<Array, JsValue> {
    let mut processor = ImageProcessor::new();
    processor
        .load_image_bytes(&input)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let opts = ExtractOptions::default().with_clusters(n_colors);
    let named = processor
        .named_palette(COLORS.get_or_builtin(), &opts)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let out = Array::new();
    for color in named {
        let rgb = Array::of3(
            &JsValue::from(color.rgb.red),
            &JsValue::from(color.rgb.green),
            &JsValue::from(color.rgb.blue),
        );
        let entry = Object::new();
        Reflect::set(&entry, &JsValue::from_str("hex"), &JsValue::from_str(&color.hex))?;
        Reflect::set(&entry, &JsValue::from_str("name"), &JsValue::from_str(&color.name))?;
        Reflect::set(&entry, &JsValue::from_str("rgb"), &rgb)?;
        out.push(&entry);
    }

    Ok(out)
}
