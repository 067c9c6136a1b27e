//! Alpha channel statistics and projection valleys for one sheet.

use std::sync::OnceLock;

use crate::sheet::{Rect, SpriteSheet};

/// Smallest share of the profile mass either side of a split must hold.
const MIN_SIDE_SHARE: f64 = 0.05;

/// Direction of a binary cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SplitAxis {
    /// Cut along a column: left and right halves.
    Columns,
    /// Cut along a row: top and bottom halves.
    Rows,
}

/// Lowest interior point of a smoothed projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valley {
    pub index: usize,
    pub value: f64,
    /// `1 - value / rim`, where `rim` is the lower of the peaks on either
    /// side. 1.0 means a fully transparent gap.
    pub depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinarySplit {
    pub axis: SplitAxis,
    pub index: u32,
    pub depth: f64,
    pub first: Rect,
    pub second: Rect,
}

/// Read-only view of a sheet's alpha channel.
#[derive(Debug)]
pub struct AlphaMetrics {
    width: u32,
    height: u32,
    threshold: u8,
    alpha: Vec<u8>,
    row_sums: Vec<u64>,
    col_sums: Vec<u64>,
    row_opaque: Vec<u32>,
    col_opaque: Vec<u32>,
    row_smoothed: Vec<f64>,
    col_smoothed: Vec<f64>,
    opaque_count: u64,
    opaque_bounds: Option<Rect>,
    split: OnceLock<Option<BinarySplit>>,
}

impl AlphaMetrics {
    pub fn new(sheet: &SpriteSheet, threshold: u8, valley_window: usize) -> Self {
        let (width, height) = sheet.image().dimensions();
        let (w, h) = (width as usize, height as usize);

        let alpha: Vec<u8> = sheet.image().pixels().map(|p| p.0[3]).collect();
        let mut row_sums = vec![0u64; h];
        let mut col_sums = vec![0u64; w];
        let mut row_opaque = vec![0u32; h];
        let mut col_opaque = vec![0u32; w];
        let mut opaque_count = 0u64;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0usize, 0usize);

        for y in 0..h {
            for x in 0..w {
                let a = alpha[y * w + x];
                row_sums[y] += a as u64;
                col_sums[x] += a as u64;
                if a > threshold {
                    row_opaque[y] += 1;
                    col_opaque[x] += 1;
                    opaque_count += 1;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        let opaque_bounds = (opaque_count > 0).then(|| {
            Rect::new(
                min_x as u32,
                min_y as u32,
                (max_x - min_x + 1) as u32,
                (max_y - min_y + 1) as u32,
            )
        });

        let row_smoothed = smooth(&row_sums, valley_window);
        let col_smoothed = smooth(&col_sums, valley_window);

        Self {
            width,
            height,
            threshold,
            alpha,
            row_sums,
            col_sums,
            row_opaque,
            col_opaque,
            row_smoothed,
            col_smoothed,
            opaque_count,
            opaque_bounds,
            split: OnceLock::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Alpha grid in row-major order.
    pub fn alpha(&self) -> &[u8] {
        &self.alpha
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.alpha[y as usize * self.width as usize + x as usize]
    }

    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        self.alpha_at(x, y) > self.threshold
    }

    pub fn row_sums(&self) -> &[u64] {
        &self.row_sums
    }

    pub fn col_sums(&self) -> &[u64] {
        &self.col_sums
    }

    pub fn row_smoothed(&self) -> &[f64] {
        &self.row_smoothed
    }

    pub fn col_smoothed(&self) -> &[f64] {
        &self.col_smoothed
    }

    pub fn opaque_count(&self) -> u64 {
        self.opaque_count
    }

    /// Fraction of pixels whose alpha is above the threshold.
    pub fn coverage(&self) -> f64 {
        let total = self.width as u64 * self.height as u64;
        if total == 0 {
            return 0.0;
        }
        self.opaque_count as f64 / total as f64
    }

    /// Tight box around every opaque pixel.
    pub fn opaque_bounds(&self) -> Option<Rect> {
        self.opaque_bounds
    }

    pub fn row_valley(&self) -> Option<Valley> {
        find_valley(&self.row_smoothed, &self.row_opaque)
    }

    pub fn col_valley(&self) -> Option<Valley> {
        find_valley(&self.col_smoothed, &self.col_opaque)
    }

    /// Splits the sheet in two at the deeper of the row and column valleys.
    ///
    /// Computed on first use and cached.
    pub fn find_best_binary_split(&self) -> Option<BinarySplit> {
        *self.split.get_or_init(|| self.compute_split())
    }

    fn compute_split(&self) -> Option<BinarySplit> {
        let candidates = [
            self.col_valley().map(|v| (SplitAxis::Columns, v)),
            self.row_valley().map(|v| (SplitAxis::Rows, v)),
        ];
        let (axis, valley) = candidates
            .into_iter()
            .flatten()
            .reduce(|best, next| if next.1.depth > best.1.depth { next } else { best })?;
        if valley.depth <= 0.0 {
            return None;
        }

        let index = valley.index as u32;
        let (first, second) = match axis {
            SplitAxis::Columns => (
                Rect::new(0, 0, index, self.height),
                Rect::new(index, 0, self.width - index, self.height),
            ),
            SplitAxis::Rows => (
                Rect::new(0, 0, self.width, index),
                Rect::new(0, index, self.width, self.height - index),
            ),
        };
        Some(BinarySplit {
            axis,
            index,
            depth: valley.depth,
            first,
            second,
        })
    }
}

/// Centered moving average; windows are truncated at the edges.
pub(crate) fn smooth(values: &[u64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let before = (window - 1) / 2;
    let after = window - 1 - before;

    let mut prefix = Vec::with_capacity(values.len() + 1);
    prefix.push(0u64);
    for v in values {
        prefix.push(prefix[prefix.len() - 1] + v);
    }

    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after).min(values.len() - 1);
            (prefix[hi + 1] - prefix[lo]) as f64 / (hi - lo + 1) as f64
        })
        .collect()
}

/// Deepest dip of `profile` strictly inside the occupied span.
///
/// A dip only counts when content rises on both sides of it, and its depth is
/// taken against the lower of the two flanking peaks, so a one-sided slope
/// (a tapered sprite edge) is never a valley. Both sides must also carry at
/// least [`MIN_SIDE_SHARE`] of the profile mass. A flat minimum resolves to
/// the center of its first plateau.
pub(crate) fn find_valley(profile: &[f64], occupancy: &[u32]) -> Option<Valley> {
    let first = occupancy.iter().position(|&c| c > 0)?;
    let last = occupancy.iter().rposition(|&c| c > 0)?;
    if last < first + 2 {
        return None;
    }

    let mut left_peak = vec![0f64; profile.len()];
    let mut running = 0f64;
    for i in first..=last {
        left_peak[i] = running;
        running = running.max(profile[i]);
    }
    let mut right_peak = vec![0f64; profile.len()];
    running = 0.0;
    for i in (first..=last).rev() {
        right_peak[i] = running;
        running = running.max(profile[i]);
    }

    let mut prefix = Vec::with_capacity(profile.len() + 1);
    prefix.push(0f64);
    for v in profile {
        prefix.push(prefix[prefix.len() - 1] + v);
    }
    let total = prefix[profile.len()];
    if total <= 0.0 {
        return None;
    }
    let balanced = |i: usize| prefix[i].min(total - prefix[i]) >= total * MIN_SIDE_SHARE;

    let depth_at = |i: usize| {
        let rim = left_peak[i].min(right_peak[i]);
        if rim > 0.0 {
            (1.0 - profile[i] / rim).max(0.0)
        } else {
            0.0
        }
    };

    let interior = first + 1..last;
    let (best, depth) = interior
        .clone()
        .filter(|&i| balanced(i))
        .map(|i| (i, depth_at(i)))
        .fold(None, |acc: Option<(usize, f64)>, (i, d)| match acc {
            Some((_, best)) if best >= d => acc,
            _ => Some((i, d)),
        })?;
    if depth <= 0.0 {
        return None;
    }

    let value = profile[best];
    let mut plateau_end = best;
    while plateau_end + 1 < interior.end && profile[plateau_end + 1] == value {
        plateau_end += 1;
    }
    let index = (best + plateau_end + 1) / 2;

    Some(Valley {
        index,
        value,
        depth,
    })
}
