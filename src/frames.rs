//! Materializes frame slices for each [`Decision`](crate::Decision).

use image::RgbaImage;
use tracing::debug;

use crate::cluster::FrameCluster;
use crate::metrics::AlphaMetrics;
use crate::pivot::PivotEstimator;
use crate::refine::FrameRefiner;
use crate::segmentation::Component;
use crate::sheet::{Rect, SpriteSheet};

/// One cropped animation frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSlice {
    pub index: usize,
    /// Source rectangle in sheet coordinates.
    pub rect: Rect,
    pub image: RgbaImage,
    /// Anchor point normalized to `rect`, within `[0, 1]²`.
    pub pivot: (f32, f32),
}

impl FrameSlice {
    pub fn from_sheet(sheet: &SpriteSheet, index: usize, rect: Rect) -> Self {
        Self {
            index,
            rect,
            image: sheet.crop(rect),
            pivot: (0.5, 0.5),
        }
    }

    /// Pivot in absolute sheet coordinates.
    pub fn pivot_in_sheet(&self) -> (f32, f32) {
        (
            self.rect.x as f32 + self.pivot.0 * self.rect.width as f32,
            self.rect.y as f32 + self.pivot.1 * self.rect.height as f32,
        )
    }
}

/// Everything a frame builder reads.
pub struct BuildContext<'a> {
    pub sheet: &'a SpriteSheet,
    pub metrics: &'a AlphaMetrics,
    pub components: &'a [Component],
    pub clusters: &'a [FrameCluster],
    pub estimator: &'a PivotEstimator<'a>,
    pub refiner: &'a FrameRefiner,
}

impl BuildContext<'_> {
    fn slices_with_pivots(&self, rects: impl IntoIterator<Item = Rect>) -> Vec<FrameSlice> {
        rects
            .into_iter()
            .filter(|r| !r.is_empty())
            .enumerate()
            .map(|(i, rect)| {
                let mut slice = FrameSlice::from_sheet(self.sheet, i, rect);
                slice.pivot = self.estimator.estimate(&slice, self.components);
                slice
            })
            .collect()
    }
}

/// The whole sheet, cropped to its opaque content. No content, no frame.
pub fn build_whole(ctx: &BuildContext<'_>) -> Vec<FrameSlice> {
    let Some(bounds) = ctx.metrics.opaque_bounds() else {
        debug!("sheet has no opaque pixels, emitting no frame");
        return Vec::new();
    };
    ctx.slices_with_pivots([bounds])
}

/// Two frames split at the deepest projection valley, then trimmed.
pub fn build_two(ctx: &BuildContext<'_>) -> Vec<FrameSlice> {
    let (first, second) = match ctx.metrics.find_best_binary_split() {
        Some(split) => (split.first, split.second),
        None => midpoint_split(ctx.sheet.bounds()),
    };
    let slices = ctx.slices_with_pivots([first, second]);
    ctx.refiner.refine_all(ctx.sheet, slices)
}

/// One frame per cluster, in cluster order, then trimmed.
pub fn build_many(ctx: &BuildContext<'_>) -> Vec<FrameSlice> {
    let slices = ctx.slices_with_pivots(ctx.clusters.iter().map(|c| c.bounds));
    ctx.refiner.refine_all(ctx.sheet, slices)
}

/// Halves `bounds` across its longer side.
fn midpoint_split(bounds: Rect) -> (Rect, Rect) {
    if bounds.width >= bounds.height {
        let half = bounds.width / 2;
        (
            Rect::new(bounds.x, bounds.y, half, bounds.height),
            Rect::new(bounds.x + half, bounds.y, bounds.width - half, bounds.height),
        )
    } else {
        let half = bounds.height / 2;
        (
            Rect::new(bounds.x, bounds.y, bounds.width, half),
            Rect::new(bounds.x, bounds.y + half, bounds.width, bounds.height - half),
        )
    }
}
