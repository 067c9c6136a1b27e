use crate::classifier::CoreVsFxClassifier;
use crate::frames::FrameSlice;
use crate::segmentation::Component;

/// Content-weighted anchor point estimation.
#[derive(Debug, Clone, Copy)]
pub struct PivotEstimator<'a> {
    classifier: &'a CoreVsFxClassifier,
    alpha_threshold: u8,
}

impl<'a> PivotEstimator<'a> {
    pub fn new(classifier: &'a CoreVsFxClassifier, alpha_threshold: u8) -> Self {
        Self {
            classifier,
            alpha_threshold,
        }
    }

    /// Normalized pivot of `slice`.
    ///
    /// Components intersecting the slice contribute their centroid weighted by
    /// `area * score`. Without any, the slice's own alpha centroid is used.
    pub fn estimate(&self, slice: &FrameSlice, components: &[Component]) -> (f32, f32) {
        let rect = slice.rect;
        let mut weight = 0f64;
        let mut sum_x = 0f64;
        let mut sum_y = 0f64;
        for c in components.iter().filter(|c| c.bounds.intersects(&rect)) {
            let w = c.area as f64 * self.classifier.score(c) as f64;
            sum_x += c.centroid.0 as f64 * w;
            sum_y += c.centroid.1 as f64 * w;
            weight += w;
        }

        if weight > 0.0 {
            let px = (sum_x / weight - rect.x as f64) / rect.width as f64;
            let py = (sum_y / weight - rect.y as f64) / rect.height as f64;
            return clamp_unit((px as f32, py as f32));
        }
        self.alpha_centroid(slice)
    }

    fn alpha_centroid(&self, slice: &FrameSlice) -> (f32, f32) {
        let (w, h) = slice.image.dimensions();
        let mut weight = 0f64;
        let mut sum_x = 0f64;
        let mut sum_y = 0f64;
        for (x, y, p) in slice.image.enumerate_pixels() {
            let a = p.0[3];
            if a <= self.alpha_threshold {
                continue;
            }
            let a = a as f64;
            sum_x += (x as f64 + 0.5) * a;
            sum_y += (y as f64 + 0.5) * a;
            weight += a;
        }
        if weight == 0.0 || w == 0 || h == 0 {
            return (0.5, 0.5);
        }
        clamp_unit((
            (sum_x / weight / w as f64) as f32,
            (sum_y / weight / h as f64) as f32,
        ))
    }
}

pub(crate) fn clamp_unit(p: (f32, f32)) -> (f32, f32) {
    let fix = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 };
    (fix(p.0), fix(p.1))
}
