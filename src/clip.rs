use std::time::Duration;

use serde::Serialize;

use crate::decision::{OverrideRule, OverrideTable};
use crate::sheet::SpriteSheet;

/// Named playback sequence over a sheet's frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationClip {
    pub name: String,
    /// Indices into the sheet's frame list, in playback order.
    pub frames: Vec<usize>,
    pub frame_duration: Duration,
    pub looping: bool,
}

impl AnimationClip {
    pub fn total_duration(&self) -> Duration {
        self.frame_duration * self.frames.len() as u32
    }
}

/// Resolves clip names: configured overrides first, the file stem otherwise.
#[derive(Debug, Clone)]
pub struct ClipNamer {
    overrides: OverrideTable<String>,
}

impl ClipNamer {
    pub fn new(rules: &[OverrideRule<String>]) -> Self {
        Self {
            overrides: OverrideTable::new(rules.to_vec()),
        }
    }

    pub fn name_for(&self, sheet: &SpriteSheet) -> String {
        match self.overrides.lookup(&sheet.file_name()) {
            Some(rule) => rule.value.clone(),
            None => sheet.stem(),
        }
    }
}
