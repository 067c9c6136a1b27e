//! Drives one sheet through every stage, and batches of sheets in parallel.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::classifier::CoreVsFxClassifier;
use crate::clip::{AnimationClip, ClipNamer};
use crate::cluster::{ClusterFrameDetector, FrameCluster};
use crate::config::{ConfigError, SlicerConfig};
use crate::decision::{Decision, DecisionInput, DecisionModule, DecisionReason};
use crate::frames::{self, BuildContext, FrameSlice};
use crate::metrics::AlphaMetrics;
use crate::pivot::PivotEstimator;
use crate::refine::FrameRefiner;
use crate::segmentation::{self, Component, SegmentationConfig};
use crate::sheet::SpriteSheet;

/// Diagnostics for one processed sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetStats {
    pub frame_count: usize,
    pub coverage: f64,
    pub component_count: usize,
    pub cluster_count: usize,
    pub fallback_split: bool,
    pub alpha_threshold: u8,
    pub padding: u32,
    pub eps: f32,
    pub min_samples: usize,
    pub whole_coverage: f32,
    pub two_gap_iou_max: f32,
}

impl SheetStats {
    /// Flat name → value view for exporters and logs.
    pub fn as_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("frameCount".to_string(), self.frame_count as f64),
            ("coverage".to_string(), self.coverage),
            ("componentCount".to_string(), self.component_count as f64),
            ("clusterCount".to_string(), self.cluster_count as f64),
            ("fallbackSplit".to_string(), f64::from(u8::from(self.fallback_split))),
            ("alphaThreshold".to_string(), self.alpha_threshold as f64),
            ("padding".to_string(), self.padding as f64),
            ("eps".to_string(), self.eps as f64),
            ("minSamples".to_string(), self.min_samples as f64),
            ("wholeCoverage".to_string(), self.whole_coverage as f64),
            ("twoGapIouMax".to_string(), self.two_gap_iou_max as f64),
        ])
    }
}

/// Everything recovered from one sheet.
#[derive(Debug, Clone)]
pub struct SheetOutcome {
    pub source: PathBuf,
    pub decision: Decision,
    pub reason: DecisionReason,
    pub frames: Vec<FrameSlice>,
    pub clips: Vec<AnimationClip>,
    pub stats: SheetStats,
    pub components: Vec<Component>,
    pub clusters: Vec<FrameCluster>,
}

/// Configured slicing pipeline. Holds no per-sheet state.
#[derive(Debug, Clone)]
pub struct SheetPipeline {
    config: SlicerConfig,
    segmentation: SegmentationConfig,
    detector: ClusterFrameDetector,
    decisions: DecisionModule,
    refiner: FrameRefiner,
    namer: ClipNamer,
}

impl SheetPipeline {
    pub fn new(config: SlicerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            segmentation: SegmentationConfig::from(&config),
            detector: ClusterFrameDetector::new(config.eps, config.min_samples),
            decisions: DecisionModule::from_config(&config),
            refiner: FrameRefiner::new(config.alpha_threshold, config.padding),
            namer: ClipNamer::new(&config.clip_name_overrides),
            config,
        })
    }

    pub fn config(&self) -> &SlicerConfig {
        &self.config
    }

    /// Processes one sheet, then lets `classifier` learn from it.
    pub fn process(&self, sheet: &SpriteSheet, classifier: &mut CoreVsFxClassifier) -> SheetOutcome {
        let outcome = self.run(sheet, classifier);
        classifier.learn_from(sheet, &outcome.components, &outcome.frames);
        outcome
    }

    /// Processes sheets in parallel against a snapshot of `classifier`, then
    /// applies the learning updates serially in input order.
    pub fn process_batch(
        &self,
        sheets: &[SpriteSheet],
        classifier: &mut CoreVsFxClassifier,
    ) -> Vec<SheetOutcome> {
        let snapshot = classifier.clone();
        let outcomes: Vec<SheetOutcome> = sheets.par_iter().map(|s| self.run(s, &snapshot)).collect();
        for (sheet, outcome) in sheets.iter().zip(&outcomes) {
            classifier.learn_from(sheet, &outcome.components, &outcome.frames);
        }
        outcomes
    }

    fn run(&self, sheet: &SpriteSheet, classifier: &CoreVsFxClassifier) -> SheetOutcome {
        let config = &self.config;
        let file_name = sheet.file_name();

        let metrics = AlphaMetrics::new(sheet, config.alpha_threshold, config.valley_window);
        let components = segmentation::segment(sheet, &metrics, &self.segmentation);
        let clusters = self.detector.detect(&metrics, &components);
        let (decision, reason) = self.decisions.decide(&DecisionInput {
            file_name: &file_name,
            metrics: &metrics,
            components: &components,
            clusters: &clusters,
        });
        if decision != Decision::Whole && metrics.opaque_count() == 0 {
            warn!(file = %file_name, %decision, "split forced on a sheet with no opaque pixels");
        }

        let estimator = PivotEstimator::new(classifier, config.alpha_threshold);
        let ctx = BuildContext {
            sheet,
            metrics: &metrics,
            components: &components,
            clusters: &clusters.clusters,
            estimator: &estimator,
            refiner: &self.refiner,
        };
        let frames = match decision {
            Decision::Whole => frames::build_whole(&ctx),
            Decision::Two => frames::build_two(&ctx),
            Decision::Many => frames::build_many(&ctx),
        };

        let clips = if frames.is_empty() {
            Vec::new()
        } else {
            vec![AnimationClip {
                name: self.namer.name_for(sheet),
                frames: (0..frames.len()).collect(),
                frame_duration: Duration::from_millis(config.frame_duration_ms),
                looping: config.looping,
            }]
        };

        let stats = SheetStats {
            frame_count: frames.len(),
            coverage: metrics.coverage(),
            component_count: components.len(),
            cluster_count: clusters.clusters.len(),
            fallback_split: clusters.fallback,
            alpha_threshold: config.alpha_threshold,
            padding: config.padding,
            eps: config.eps,
            min_samples: config.min_samples,
            whole_coverage: config.whole_coverage,
            two_gap_iou_max: config.two_gap_iou_max,
        };

        info!(
            file = %file_name,
            %decision,
            ?reason,
            frames = stats.frame_count,
            components = stats.component_count,
            clusters = stats.cluster_count,
            coverage = stats.coverage,
            "sheet processed"
        );

        SheetOutcome {
            source: sheet.source().to_path_buf(),
            decision,
            reason,
            frames,
            clips,
            stats,
            components,
            clusters: clusters.clusters,
        }
    }
}
