use std::collections::HashSet;

use kmeans_colors::{Kmeans, get_kmeans};
use log::debug;
use palette::Srgb;

use crate::Pixel;
use crate::error::{PaletteError, Result};
use crate::sampler::DEFAULT_SAMPLE_SIDE;

/// Upper bound on `k`: cluster indices are stored as `u8`.
pub const MAX_CLUSTERS: usize = 256;

/// Tunables for palette extraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractOptions {
    /// Number of palette colors (`k`).
    pub clusters: usize,
    /// Independent k-means initializations; the run with the lowest
    /// within-cluster sum of squares is kept.
    pub runs: usize,
    pub max_iter: usize,
    pub converge: f32,
    /// Seed of the first run; run `i` uses `seed + i`.
    pub seed: u64,
    /// Side of the square grid the image is sampled down to.
    pub sample_side: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            clusters: 5,
            runs: 10,
            max_iter: 300,
            converge: 1e-4,
            seed: 42,
            sample_side: DEFAULT_SAMPLE_SIDE,
        }
    }
}

impl ExtractOptions {
    pub fn with_clusters(mut self, clusters: usize) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Extracts `k` dominant colors with the default run settings.
pub fn extract(pixels: &[Pixel], k: usize, seed: u64) -> Result<Vec<Pixel>> {
    extract_with(pixels, &ExtractOptions::default().with_clusters(k).with_seed(seed))
}

/// Clusters `pixels` in RGB space and returns exactly `opts.clusters`
/// centroids, rounded and clamped to 8 bits, in the order k-means produced
/// them.
pub fn extract_with(pixels: &[Pixel], opts: &ExtractOptions) -> Result<Vec<Pixel>> {
    let k = opts.clusters;
    if k == 0 || k > MAX_CLUSTERS {
        return Err(PaletteError::InvalidClusterCount(k));
    }
    if pixels.is_empty() {
        return Err(PaletteError::EmptyInput);
    }

    if let Some(mut distinct) = distinct_up_to(pixels, k) {
        // Not enough distinct colors to split; pad with the last one.
        debug!("{} distinct colors for k = {k}, skipping k-means", distinct.len());
        let last = distinct[distinct.len() - 1];
        distinct.resize(k, last);
        return Ok(distinct);
    }

    let rgb: Vec<Srgb> = pixels.iter().map(|p| p.into_format::<f32>()).collect();

    // `Kmeans::score` only measures the last centroid shift, so runs are
    // ranked by their own within-cluster sum of squares.
    let mut best: Option<(Kmeans<Srgb>, f64)> = None;
    for run in 0..opts.runs.max(1) {
        let seed = opts.seed.wrapping_add(run as u64);
        let result = get_kmeans(k, opts.max_iter, opts.converge, false, &rgb, seed);
        let cost = inertia(&rgb, &result);
        debug!("k-means run {run} (seed {seed}): inertia {cost}");
        // strict `<` keeps the earlier run on ties
        if best.as_ref().is_none_or(|(_, best_cost)| cost < *best_cost) {
            best = Some((result, cost));
        }
    }

    let centroids = best.map(|(b, _)| b.centroids).unwrap_or_default();
    Ok(centroids.iter().map(|&c| to_pixel(c)).collect())
}

/// Sum of squared distances from every point to its assigned centroid.
fn inertia(points: &[Srgb], result: &Kmeans<Srgb>) -> f64 {
    points
        .iter()
        .zip(&result.indices)
        .map(|(p, &i)| {
            let c = result.centroids[i as usize];
            [p.red - c.red, p.green - c.green, p.blue - c.blue]
                .iter()
                .map(|&d| (d as f64).powi(2))
                .sum::<f64>()
        })
        .sum()
}

/// Distinct colors in first-seen order, or `None` once there are more than `k`.
fn distinct_up_to(pixels: &[Pixel], k: usize) -> Option<Vec<Pixel>> {
    let mut seen = HashSet::new();
    let mut distinct = Vec::new();
    for p in pixels {
        if seen.insert((p.red, p.green, p.blue)) {
            if distinct.len() == k {
                return None;
            }
            distinct.push(*p);
        }
    }
    Some(distinct)
}

fn to_pixel(c: Srgb) -> Pixel {
    let channel = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    Pixel::new(channel(c.red), channel(c.green), channel(c.blue))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone() -> Vec<Pixel> {
        let mut pixels = Vec::new();
        for i in 0..200u8 {
            pixels.push(Pixel::new(250 - i % 5, i % 3, 0));
            pixels.push(Pixel::new(i % 4, 0, 245 + i % 7));
        }
        pixels
    }

    fn gradient() -> Vec<Pixel> {
        (0..2500u32)
            .map(|i| Pixel::new((i % 256) as u8, (i / 10 % 256) as u8, (i * 7 % 256) as u8))
            .collect()
    }

    #[test]
    fn returns_k_colors() {
        let pixels = gradient();
        for k in [1, 3, 5, 8] {
            let palette = extract(&pixels, k, 42).unwrap();
            assert_eq!(palette.len(), k);
        }
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let pixels = gradient();
        let a = extract(&pixels, 5, 42).unwrap();
        let b = extract(&pixels, 5, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn finds_well_separated_clusters() {
        let mut palette = extract(&two_tone(), 2, 42).unwrap();
        palette.sort_by_key(|p| p.red);
        assert!(palette[0].blue > 240 && palette[0].red < 5);
        assert!(palette[1].red > 244 && palette[1].blue == 0);
    }

    /// Three blobs of uneven size plus a sparse bridge, so restarts settle in
    /// different local minima.
    fn uneven_blobs() -> Vec<Pixel> {
        (0..3000u32)
            .map(|i| {
                let j = (i * 37 % 101) as u8;
                match i % 10 {
                    0..=5 => Pixel::new(20 + j % 40, 30 + j % 25, 200 - j % 30),
                    6..=8 => Pixel::new(220 - j % 35, 180 + j % 50, 10 + j % 20),
                    _ => Pixel::new(j * 2, 255 - j * 2, (j as u32 * 5 % 256) as u8),
                }
            })
            .collect()
    }

    #[test]
    fn keeps_cheapest_restart() {
        let pixels = uneven_blobs();
        let opts = ExtractOptions::default().with_clusters(5);
        let rgb: Vec<Srgb> = pixels.iter().map(|p| p.into_format::<f32>()).collect();

        let runs: Vec<(Vec<Srgb>, f64)> = (0..opts.runs)
            .map(|run| {
                let seed = opts.seed + run as u64;
                let km = get_kmeans(5, opts.max_iter, opts.converge, false, &rgb, seed);
                let cost = inertia(&rgb, &km);
                (km.centroids, cost)
            })
            .collect();
        let cheapest = runs
            .iter()
            .fold(None::<&(Vec<Srgb>, f64)>, |best, run| match best {
                Some(b) if b.1 <= run.1 => Some(b),
                _ => Some(run),
            })
            .unwrap();
        assert!(runs.iter().all(|(_, cost)| *cost >= cheapest.1));

        let expected: Vec<Pixel> = cheapest.0.iter().map(|&c| to_pixel(c)).collect();
        assert_eq!(extract_with(&pixels, &opts).unwrap(), expected);
    }

    #[test]
    fn inertia_is_zero_on_centroids() {
        let points = vec![Srgb::new(0.1, 0.2, 0.3), Srgb::new(0.9, 0.8, 0.7)];
        let km = get_kmeans(2, 50, 1e-4, false, &points, 1);
        assert!(inertia(&points, &km) < 1e-9);
    }

    #[test]
    fn fewer_distinct_colors_than_k() {
        let pixels = vec![Pixel::new(10, 20, 30); 50];
        let palette = extract(&pixels, 5, 42).unwrap();
        assert_eq!(palette, vec![Pixel::new(10, 20, 30); 5]);

        let pixels = [Pixel::new(0, 0, 0), Pixel::new(255, 255, 255), Pixel::new(0, 0, 0)];
        let palette = extract(&pixels, 3, 42).unwrap();
        assert_eq!(
            palette,
            [Pixel::new(0, 0, 0), Pixel::new(255, 255, 255), Pixel::new(255, 255, 255)]
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(extract(&[], 5, 42), Err(PaletteError::EmptyInput)));
    }

    #[test]
    fn invalid_cluster_count() {
        let pixels = gradient();
        assert!(matches!(
            extract(&pixels, 0, 42),
            Err(PaletteError::InvalidClusterCount(0))
        ));
        assert!(matches!(
            extract(&pixels, 300, 42),
            Err(PaletteError::InvalidClusterCount(300))
        ));
    }

    #[test]
    fn centroid_rounding_clamps() {
        assert_eq!(to_pixel(Srgb::new(1.2, -0.1, 0.5)), Pixel::new(255, 0, 128));
    }
}
