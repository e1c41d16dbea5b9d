use image::{Rgb, RgbImage};

use crate::Pixel;

/// Side of the square grid an image is reduced to before clustering.
pub const DEFAULT_SAMPLE_SIDE: u32 = 100;

/// Source rows (or columns) contributing to one output row, with the share of
/// each one that falls inside the output cell.
fn area_weights(in_len: u32, out_len: u32) -> Vec<Vec<(u32, f32)>> {
    let scale = in_len as f64 / out_len as f64;
    (0..out_len)
        .map(|o| {
            let start = o as f64 * scale;
            let end = ((o + 1) as f64 * scale).min(in_len as f64);
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(in_len);
            (first..last)
                .filter_map(|s| {
                    let overlap = (end.min(s as f64 + 1.0) - start.max(s as f64)).max(0.0);
                    (overlap > 0.0).then(|| (s, (overlap / scale) as f32))
                })
                .collect()
        })
        .collect()
}

/// Shrinks `img` to `out_w × out_h` by area averaging: every output pixel is
/// the mean of the source area it covers, partial pixels weighted by their
/// covered fraction.
///
/// Runs as two passes, vertical (in_w × out_h) then horizontal. Dimensions
/// larger than the source are clamped to the source size, so this never
/// upscales.
pub fn resize_area(img: &RgbImage, out_w: u32, out_h: u32) -> RgbImage {
    let (in_w, in_h) = img.dimensions();
    let out_w = out_w.clamp(1, in_w.max(1));
    let out_h = out_h.clamp(1, in_h.max(1));

    // Fast path – no scaling required.
    if (out_w == in_w && out_h == in_h) || in_w == 0 || in_h == 0 {
        return img.clone();
    }

    // --------------------------------------------------------
    // First pass: vertical reduction
    // --------------------------------------------------------
    let rows = area_weights(in_h, out_h);
    let mut vertical: Vec<[f32; 3]> = vec![[0.0; 3]; (in_w * out_h) as usize];

    for (y_out, taps) in rows.iter().enumerate() {
        for x in 0..in_w {
            let mut acc = [0.0f32; 3];
            for &(y, w) in taps {
                for (a, &c) in acc.iter_mut().zip(&img.get_pixel(x, y).0) {
                    *a += c as f32 * w;
                }
            }
            vertical[y_out * in_w as usize + x as usize] = acc;
        }
    }

    // --------------------------------------------------------
    // Second pass: horizontal reduction
    // --------------------------------------------------------
    let cols = area_weights(in_w, out_w);
    let mut out = RgbImage::new(out_w, out_h);

    for y_out in 0..out_h {
        for (x_out, taps) in cols.iter().enumerate() {
            let mut acc = [0.0f32; 3];
            for &(x, w) in taps {
                for (a, v) in acc.iter_mut().zip(vertical[(y_out * in_w + x) as usize]) {
                    *a += v * w;
                }
            }
            out.put_pixel(x_out as u32, y_out, Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8)));
        }
    }

    out
}

/// Reduces `img` to at most `side × side` pixels and flattens it row-major.
///
/// The target is a fixed square, so aspect ratio is not kept; an axis already
/// shorter than `side` is left alone.
pub fn sample(img: &RgbImage, side: u32) -> Vec<Pixel> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let small = resize_area(img, w.min(side), h.min(side));
    small
        .pixels()
        .map(|p| Pixel::new(p[0], p[1], p[2]))
        .collect()
}
