//! Trims transparent margins off frames and re-pads them.

use tracing::debug;

use crate::frames::FrameSlice;
use crate::pivot::clamp_unit;
use crate::sheet::{Rect, SpriteSheet};

#[derive(Debug, Clone, Copy)]
pub struct FrameRefiner {
    pub alpha_threshold: u8,
    pub padding: u32,
}

impl FrameRefiner {
    pub fn new(alpha_threshold: u8, padding: u32) -> Self {
        Self {
            alpha_threshold,
            padding,
        }
    }

    /// Refines every slice, drops the empty ones and renumbers the rest.
    pub fn refine_all(&self, sheet: &SpriteSheet, slices: Vec<FrameSlice>) -> Vec<FrameSlice> {
        slices
            .into_iter()
            .filter_map(|s| self.refine(sheet, s))
            .enumerate()
            .map(|(i, mut s)| {
                s.index = i;
                s
            })
            .collect()
    }

    /// Crops `slice` to its opaque content plus padding, re-read from `sheet`.
    /// Returns `None` when the slice holds no opaque pixel.
    pub fn refine(&self, sheet: &SpriteSheet, slice: FrameSlice) -> Option<FrameSlice> {
        let Some(local) = self.opaque_box(&slice) else {
            debug!(index = slice.index, rect = ?slice.rect, "dropping empty frame");
            return None;
        };
        let tight = Rect::new(
            slice.rect.x + local.x,
            slice.rect.y + local.y,
            local.width,
            local.height,
        );
        let rect = tight.padded_within(self.padding, &sheet.bounds());

        let (ax, ay) = slice.pivot_in_sheet();
        let pivot = clamp_unit((
            (ax - rect.x as f32) / rect.width as f32,
            (ay - rect.y as f32) / rect.height as f32,
        ));

        Some(FrameSlice {
            index: slice.index,
            rect,
            image: sheet.crop(rect),
            pivot,
        })
    }

    /// Tight box of opaque pixels, local to the slice image.
    fn opaque_box(&self, slice: &FrameSlice) -> Option<Rect> {
        let (w, h) = slice.image.dimensions();
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0u32, 0u32);
        let mut any = false;
        for (x, y, p) in slice.image.enumerate_pixels() {
            if p.0[3] <= self.alpha_threshold {
                continue;
            }
            any = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        any.then(|| Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }
}
