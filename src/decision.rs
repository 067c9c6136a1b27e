//! Chooses how a sheet is split: whole, in two, or into many frames.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::ClusterResult;
use crate::metrics::{AlphaMetrics, BinarySplit};
use crate::segmentation::Component;

/// Sheets the generic heuristics get wrong, pinned by name.
pub const BUILTIN_WHOLE_PATTERN: &str = "portrait_full*";
pub const BUILTIN_TWO_PATTERN: &str = "dual_slash*";

/// Minimum valley depth for a split to count as a clean two-frame gap.
const NEAR_BINARY_DEPTH: f64 = 0.85;
/// Share of component area a cluster needs to dominate the sheet.
const DOMINANT_SHARE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Whole,
    Two,
    Many,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Decision::Whole => "WHOLE",
            Decision::Two => "TWO",
            Decision::Many => "MANY",
        })
    }
}

/// Why a [`Decision`] was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Override { pattern: String },
    NoContent,
    DominantCoverage,
    SeparatedClusters,
    ValleySplit,
    SingleCluster,
}

/// One `(pattern, value)` rule keyed on the sheet file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule<T> {
    pub pattern: String,
    #[serde(alias = "decision", alias = "name")]
    pub value: T,
}

impl<T> OverrideRule<T> {
    pub fn new(pattern: impl Into<String>, value: T) -> Self {
        Self {
            pattern: pattern.into(),
            value,
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        pattern_matches(&self.pattern, file_name)
    }
}

/// Ordered rules; the first match wins.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideTable<T> {
    rules: Vec<OverrideRule<T>>,
}

impl<T: Clone> OverrideTable<T> {
    pub fn new(rules: Vec<OverrideRule<T>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[OverrideRule<T>] {
        &self.rules
    }

    pub fn lookup(&self, file_name: &str) -> Option<&OverrideRule<T>> {
        self.rules.iter().find(|r| r.matches(file_name))
    }
}

impl OverrideTable<Decision> {
    /// Built-in rules first, then the caller's rules in order.
    pub fn with_builtins(rules: &[OverrideRule<Decision>]) -> Self {
        let mut all = vec![
            OverrideRule::new(BUILTIN_WHOLE_PATTERN, Decision::Whole),
            OverrideRule::new(BUILTIN_TWO_PATTERN, Decision::Two),
        ];
        all.extend(rules.iter().cloned());
        Self::new(all)
    }
}

/// Matches `name` against `exact`, `prefix*`, `*suffix` or `*contains*`,
/// ignoring ASCII case.
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    let name = name.to_ascii_lowercase();
    let starts = pattern.starts_with('*');
    let ends = pattern.len() > 1 && pattern.ends_with('*');
    let core = pattern.trim_matches('*');

    match (starts, ends) {
        _ if core.is_empty() => pattern.starts_with('*'),
        (true, true) => name.contains(core),
        (true, false) => name.ends_with(core),
        (false, true) => name.starts_with(core),
        (false, false) => name == core,
    }
}

/// Signals the decision is computed from, gathered by the pipeline.
pub struct DecisionInput<'a> {
    pub file_name: &'a str,
    pub metrics: &'a AlphaMetrics,
    pub components: &'a [Component],
    pub clusters: &'a ClusterResult,
}

#[derive(Debug, Clone)]
pub struct DecisionModule {
    overrides: OverrideTable<Decision>,
    whole_coverage: f64,
    two_gap_iou_max: f32,
}

impl DecisionModule {
    pub fn new(overrides: OverrideTable<Decision>, whole_coverage: f32, two_gap_iou_max: f32) -> Self {
        Self {
            overrides,
            whole_coverage: whole_coverage as f64,
            two_gap_iou_max,
        }
    }

    pub fn from_config(config: &crate::SlicerConfig) -> Self {
        Self::new(
            OverrideTable::with_builtins(&config.decision_overrides),
            config.whole_coverage,
            config.two_gap_iou_max,
        )
    }

    pub fn overrides(&self) -> &OverrideTable<Decision> {
        &self.overrides
    }

    pub fn decide(&self, input: &DecisionInput<'_>) -> (Decision, DecisionReason) {
        if let Some(rule) = self.overrides.lookup(input.file_name) {
            debug!(file = input.file_name, pattern = %rule.pattern, decision = %rule.value, "override matched");
            return (
                rule.value,
                DecisionReason::Override {
                    pattern: rule.pattern.clone(),
                },
            );
        }

        if input.metrics.opaque_count() == 0 {
            return (Decision::Whole, DecisionReason::NoContent);
        }

        let near_binary = input
            .metrics
            .find_best_binary_split()
            .filter(|s| is_near_binary(s));

        let natural = input.clusters.natural_count();
        let coverage = input.metrics.coverage();
        if coverage >= self.whole_coverage && self.has_dominant_cluster(input, near_binary.is_some()) {
            return (Decision::Whole, DecisionReason::DominantCoverage);
        }

        match natural {
            n if n >= 3 => (Decision::Many, DecisionReason::SeparatedClusters),
            2 => {
                let a = &input.clusters.clusters[0].bounds;
                let b = &input.clusters.clusters[1].bounds;
                if a.iou(b) < self.two_gap_iou_max && near_binary.is_some() {
                    (Decision::Two, DecisionReason::ValleySplit)
                } else {
                    (Decision::Many, DecisionReason::SeparatedClusters)
                }
            }
            _ if near_binary.is_some() => (Decision::Two, DecisionReason::ValleySplit),
            _ => (Decision::Whole, DecisionReason::SingleCluster),
        }
    }

    /// With no natural cluster (segmentation came up empty) the sheet only
    /// counts as one piece when there is no clean split either.
    fn has_dominant_cluster(&self, input: &DecisionInput<'_>, has_split: bool) -> bool {
        match input.clusters.natural_count() {
            0 => return !has_split,
            1 => return true,
            _ => {}
        }
        let total: u64 = input.components.iter().map(|c| c.area as u64).sum();
        let largest = input
            .clusters
            .clusters
            .iter()
            .map(|c| c.area(input.components))
            .max()
            .unwrap_or(0);
        total > 0 && largest as f64 >= total as f64 * DOMINANT_SHARE
    }
}

fn is_near_binary(split: &BinarySplit) -> bool {
    split.depth >= NEAR_BINARY_DEPTH
}
