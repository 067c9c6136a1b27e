//! Splits the opaque parts of a sheet into connected components.

use std::collections::VecDeque;

use image::{GrayImage, Luma, Rgba};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use tracing::debug;

use crate::metrics::AlphaMetrics;
use crate::sheet::{Rect, SpriteSheet};

const MASK_ON: u8 = 255;
const MORPH_RADIUS: u8 = 1;

/// Settings for [`segment`], usually taken from [`crate::SlicerConfig`].
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    pub min_area: u32,
    pub matte_coverage_trigger: f32,
    pub matte_tolerance: f32,
}

impl From<&crate::SlicerConfig> for SegmentationConfig {
    fn from(config: &crate::SlicerConfig) -> Self {
        Self {
            min_area: config.min_area,
            matte_coverage_trigger: config.matte_coverage_trigger,
            matte_tolerance: config.matte_tolerance,
        }
    }
}

/// A maximal 8-connected opaque region.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub bounds: Rect,
    pub area: u32,
    /// Mean pixel center, in sheet coordinates.
    pub centroid: (f32, f32),
    pub mean_luminance: f32,
    pub luminance_variance: f32,
    /// `area / bounds.area()`.
    pub density: f32,
    /// Approximate solidity. No convex hull is computed, so this equals
    /// `density`.
    pub solidity: f32,
}

/// Thresholds, cleans and labels the sheet's opacity mask.
pub fn segment(
    sheet: &SpriteSheet,
    metrics: &AlphaMetrics,
    config: &SegmentationConfig,
) -> Vec<Component> {
    let (width, height) = sheet.image().dimensions();
    if width == 0 || height == 0 || metrics.opaque_count() == 0 {
        return Vec::new();
    }

    let threshold = metrics.threshold();
    let mut mask = GrayImage::from_fn(width, height, |x, y| {
        Luma([if metrics.is_opaque(x, y) { MASK_ON } else { 0 }])
    });

    if metrics.coverage() > config.matte_coverage_trigger as f64 {
        let matte = estimate_matte(sheet);
        let cleared = clear_matte(sheet, &mut mask, matte, config.matte_tolerance, threshold);
        debug!(
            ?matte,
            cleared,
            coverage = metrics.coverage(),
            "treated sheet as matte-backed"
        );
    }

    let mask = morphology::close(&mask, Norm::LInf, MORPH_RADIUS);
    let mask = morphology::open(&mask, Norm::LInf, MORPH_RADIUS);

    let components = label_components(sheet, &mask, config.min_area);
    debug!(count = components.len(), "labelled components");
    components
}

/// Per-channel median of the sheet's border pixels.
fn estimate_matte(sheet: &SpriteSheet) -> Rgba<u8> {
    let image = sheet.image();
    let (w, h) = image.dimensions();
    let mut channels: [Vec<u8>; 4] = Default::default();

    let mut push = |x: u32, y: u32| {
        let p = image.get_pixel(x, y);
        for (c, values) in channels.iter_mut().enumerate() {
            values.push(p.0[c]);
        }
    };
    for x in 0..w {
        push(x, 0);
        if h > 1 {
            push(x, h - 1);
        }
    }
    for y in 1..h.saturating_sub(1) {
        push(0, y);
        if w > 1 {
            push(w - 1, y);
        }
    }

    let mut out = [0u8; 4];
    for (c, values) in channels.iter_mut().enumerate() {
        values.sort_unstable();
        out[c] = values[values.len() / 2];
    }
    Rgba(out)
}

fn rgb_distance(a: &Rgba<u8>, b: &Rgba<u8>) -> f32 {
    let dr = a.0[0] as f32 - b.0[0] as f32;
    let dg = a.0[1] as f32 - b.0[1] as f32;
    let db = a.0[2] as f32 - b.0[2] as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Flood-fills matte-coloured pixels inward from the border and removes them
/// from `mask`. Returns how many pixels were cleared.
fn clear_matte(
    sheet: &SpriteSheet,
    mask: &mut GrayImage,
    matte: Rgba<u8>,
    tolerance: f32,
    alpha_threshold: u8,
) -> usize {
    let image = sheet.image();
    let (w, h) = (image.width() as usize, image.height() as usize);
    let is_background = |idx: usize| {
        let p = image.get_pixel((idx % w) as u32, (idx / w) as u32);
        p.0[3] <= alpha_threshold || rgb_distance(p, &matte) <= tolerance
    };

    let mut visited = vec![false; w * h];
    let mut queue = VecDeque::new();
    let seed = |idx: usize, queue: &mut VecDeque<usize>, visited: &mut [bool]| {
        if !visited[idx] && is_background(idx) {
            visited[idx] = true;
            queue.push_back(idx);
        }
    };
    for x in 0..w {
        seed(x, &mut queue, &mut visited);
        seed((h - 1) * w + x, &mut queue, &mut visited);
    }
    for y in 0..h {
        seed(y * w, &mut queue, &mut visited);
        seed(y * w + w - 1, &mut queue, &mut visited);
    }

    let mut cleared = 0usize;
    let buf: &mut [u8] = &mut **mask;
    while let Some(idx) = queue.pop_front() {
        if buf[idx] != 0 {
            buf[idx] = 0;
            cleared += 1;
        }
        let (x, y) = (idx % w, idx / w);
        for (dx, dy) in [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                continue;
            }
            let next = ny as usize * w + nx as usize;
            if visited[next] || !is_background(next) {
                continue;
            }
            visited[next] = true;
            queue.push_back(next);
        }
    }
    cleared
}

fn luminance(p: &Rgba<u8>) -> f32 {
    0.2126 * p.0[0] as f32 + 0.7152 * p.0[1] as f32 + 0.0722 * p.0[2] as f32
}

/// Breadth-first 8-connected labelling of `mask`.
fn label_components(sheet: &SpriteSheet, mask: &GrayImage, min_area: u32) -> Vec<Component> {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let bits: &[u8] = mask.as_raw();
    let image = sheet.image();
    let mut visited = vec![false; bits.len()];
    let mut out = Vec::new();

    for start in 0..bits.len() {
        if bits[start] == 0 || visited[start] {
            continue;
        }

        let mut queue = VecDeque::new();
        queue.push_back(start);
        visited[start] = true;

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0usize, 0usize);
        let mut sum_x = 0f64;
        let mut sum_y = 0f64;
        let mut sum_l = 0f64;
        let mut sum_l2 = 0f64;
        let mut count = 0u32;

        while let Some(idx) = queue.pop_front() {
            let y = idx / w;
            let x = idx % w;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            sum_x += x as f64 + 0.5;
            sum_y += y as f64 + 0.5;
            let l = luminance(image.get_pixel(x as u32, y as u32)) as f64;
            sum_l += l;
            sum_l2 += l * l;
            count += 1;

            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                        continue;
                    }
                    let next = ny as usize * w + nx as usize;
                    if bits[next] == 0 || visited[next] {
                        continue;
                    }
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }

        if count < min_area {
            continue;
        }

        let bounds = Rect::new(
            min_x as u32,
            min_y as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        );
        let n = count as f64;
        let mean = sum_l / n;
        let variance = (sum_l2 / n - mean * mean).max(0.0);
        let density = count as f32 / bounds.area() as f32;
        out.push(Component {
            bounds,
            area: count,
            centroid: ((sum_x / n) as f32, (sum_y / n) as f32),
            mean_luminance: mean as f32,
            luminance_variance: variance as f32,
            density,
            solidity: density,
        });
    }

    out
}
