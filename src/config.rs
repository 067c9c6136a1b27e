use serde::{Deserialize, Serialize};

use crate::decision::{Decision, OverrideRule};

const ALPHA_THRESHOLD: u8 = 16;
const PADDING: u32 = 2;
const MIN_AREA: u32 = 16;
const EPS: f32 = 24.0;
const MIN_SAMPLES: usize = 1;
const VALLEY_WINDOW: usize = 5;
const WHOLE_COVERAGE: f32 = 0.6;
const TWO_GAP_IOU_MAX: f32 = 0.1;
const MATTE_COVERAGE_TRIGGER: f32 = 0.85;
const MATTE_TOLERANCE: f32 = 24.0;
const FRAME_DURATION_MS: u64 = 100;

/// Tuning knobs for one slicing run.
///
/// Every field has a default, so a configuration file only needs to name the
/// values it changes. Validate with [`SlicerConfig::validate`] before handing
/// the config to a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlicerConfig {
    /// Pixels with alpha strictly above this count as opaque.
    pub alpha_threshold: u8,
    /// Margin re-added around trimmed frames.
    pub padding: u32,
    /// Components smaller than this many pixels are discarded.
    pub min_area: u32,
    /// Centroid distance under which components join one cluster.
    pub eps: f32,
    pub min_samples: usize,
    /// Moving-average width applied to projections before valley search.
    pub valley_window: usize,
    pub whole_coverage: f32,
    /// Two clusters read as separate frames only when the IoU of their bounds
    /// is strictly below this.
    pub two_gap_iou_max: f32,
    /// Coverage above which the sheet is assumed to sit on a solid matte.
    pub matte_coverage_trigger: f32,
    /// RGB distance from the estimated matte colour still treated as background.
    pub matte_tolerance: f32,
    pub frame_duration_ms: u64,
    pub looping: bool,
    pub decision_overrides: Vec<OverrideRule<Decision>>,
    pub clip_name_overrides: Vec<OverrideRule<String>>,
}

impl Default for SlicerConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: ALPHA_THRESHOLD,
            padding: PADDING,
            min_area: MIN_AREA,
            eps: EPS,
            min_samples: MIN_SAMPLES,
            valley_window: VALLEY_WINDOW,
            whole_coverage: WHOLE_COVERAGE,
            two_gap_iou_max: TWO_GAP_IOU_MAX,
            matte_coverage_trigger: MATTE_COVERAGE_TRIGGER,
            matte_tolerance: MATTE_TOLERANCE,
            frame_duration_ms: FRAME_DURATION_MS,
            looping: true,
            decision_overrides: Vec::new(),
            clip_name_overrides: Vec::new(),
        }
    }
}

/// Configuration rejected before any sheet is processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        min: u64,
        value: u64,
    },

    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },

    #[error("{field} must be a finite non-negative number, got {value}")]
    NotFiniteNonNegative { field: &'static str, value: f32 },

    #[error("override rule #{index} has an empty pattern")]
    EmptyPattern { index: usize },
}

impl SlicerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        at_least("minSamples", self.min_samples as u64, 1)?;
        at_least("minArea", self.min_area as u64, 1)?;
        at_least("valleyWindow", self.valley_window as u64, 1)?;
        at_least("frameDurationMs", self.frame_duration_ms, 1)?;

        non_negative("eps", self.eps)?;
        non_negative("matteTolerance", self.matte_tolerance)?;

        unit_range("wholeCoverage", self.whole_coverage)?;
        unit_range("twoGapIouMax", self.two_gap_iou_max)?;
        unit_range("matteCoverageTrigger", self.matte_coverage_trigger)?;

        let patterns = self
            .decision_overrides
            .iter()
            .map(|r| r.pattern.as_str())
            .chain(self.clip_name_overrides.iter().map(|r| r.pattern.as_str()));
        for (index, pattern) in patterns.enumerate() {
            if pattern.trim().is_empty() {
                return Err(ConfigError::EmptyPattern { index });
            }
        }
        Ok(())
    }
}

fn at_least(field: &'static str, value: u64, min: u64) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::BelowMinimum { field, min, value });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::NotFiniteNonNegative { field, value });
    }
    Ok(())
}

fn unit_range(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfUnitRange { field, value });
    }
    Ok(())
}
