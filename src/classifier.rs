//! Relevance weighting of components: solid character bodies ("core") over
//! particle and effect bursts ("fx").

use tracing::debug;

use crate::frames::FrameSlice;
use crate::segmentation::Component;
use crate::sheet::SpriteSheet;

const DENSITY_WEIGHT: f32 = 0.5;
const SOLIDITY_WEIGHT: f32 = 0.2;
const VARIANCE_WEIGHT: f32 = 0.3;
const VARIANCE_SCALE: f32 = 2500.0;
const LEARNING_RATE: f32 = 0.2;
const MIN_SCORE: f32 = 0.05;
/// Components larger than this multiple of the reference core area are
/// progressively discounted.
const OVERSIZE_RATIO: f32 = 2.0;
/// Components covering at least this share of the sheet are background.
const BACKGROUND_SHARE: f64 = 0.5;

/// Scores components and adapts to the sheets it has seen.
///
/// The only state shared across sheets. Own it outside the pipeline and pass
/// it in by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreVsFxClassifier {
    pub density_weight: f32,
    pub solidity_weight: f32,
    pub variance_weight: f32,
    pub learning_rate: f32,
    variance_scale: f32,
    reference_area: Option<f32>,
    sheets_seen: u32,
}

impl Default for CoreVsFxClassifier {
    fn default() -> Self {
        Self {
            density_weight: DENSITY_WEIGHT,
            solidity_weight: SOLIDITY_WEIGHT,
            variance_weight: VARIANCE_WEIGHT,
            learning_rate: LEARNING_RATE,
            variance_scale: VARIANCE_SCALE,
            reference_area: None,
            sheets_seen: 0,
        }
    }
}

impl CoreVsFxClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typical core component area learned so far.
    pub fn reference_area(&self) -> Option<f32> {
        self.reference_area
    }

    /// Luminance variance treated as "fully noisy".
    pub fn variance_scale(&self) -> f32 {
        self.variance_scale
    }

    pub fn sheets_seen(&self) -> u32 {
        self.sheets_seen
    }

    /// Relevance weight of `component`, in `(0, 1]`.
    pub fn score(&self, component: &Component) -> f32 {
        let total = self.density_weight + self.solidity_weight + self.variance_weight;
        if total <= 0.0 {
            return 1.0;
        }
        let noise = (component.luminance_variance / self.variance_scale.max(1.0)).min(1.0);
        let blend = (self.density_weight * component.density
            + self.solidity_weight * component.solidity
            + self.variance_weight * (1.0 - noise))
            / total;

        let size = match self.reference_area {
            Some(reference) if reference > 0.0 => {
                let limit = reference * OVERSIZE_RATIO;
                if component.area as f32 > limit {
                    (limit / component.area as f32).sqrt()
                } else {
                    1.0
                }
            }
            _ => 1.0,
        };

        (blend * size).clamp(MIN_SCORE, 1.0)
    }

    /// Folds the statistics of one processed sheet into the learned state.
    pub fn learn_from(&mut self, sheet: &SpriteSheet, components: &[Component], frames: &[FrameSlice]) {
        let sheet_area = sheet.bounds().area() as f64;
        let candidates: Vec<&Component> = components
            .iter()
            .filter(|c| (c.area as f64) < sheet_area * BACKGROUND_SHARE)
            .collect();

        let cores: Vec<&Component> = frames
            .iter()
            .filter_map(|frame| {
                candidates
                    .iter()
                    .copied()
                    .filter(|c| c.bounds.intersects(&frame.rect))
                    .max_by(|a, b| {
                        let wa = self.score(a) * a.area as f32;
                        let wb = self.score(b) * b.area as f32;
                        wa.total_cmp(&wb)
                    })
            })
            .collect();

        self.sheets_seen += 1;
        if cores.is_empty() {
            return;
        }

        let n = cores.len() as f32;
        let mean_area = cores.iter().map(|c| c.area as f32).sum::<f32>() / n;
        let mean_variance = cores.iter().map(|c| c.luminance_variance).sum::<f32>() / n;

        self.reference_area = Some(match self.reference_area {
            Some(current) => current + self.learning_rate * (mean_area - current),
            None => mean_area,
        });
        // Floored at a quarter of the default scale.
        let target_scale = (mean_variance * 4.0).max(VARIANCE_SCALE * 0.25);
        self.variance_scale += self.learning_rate * (target_scale - self.variance_scale);

        debug!(
            sheet = %sheet.source().display(),
            cores = cores.len(),
            reference_area = ?self.reference_area,
            variance_scale = self.variance_scale,
            "classifier updated"
        );
    }
}
