//! Sprite sheet slicing: recovers animation frames, trims them and estimates
//! a pivot per frame from a single packed RGBA sheet.

pub mod classifier;
pub mod clip;
pub mod cluster;
pub mod config;
pub mod decision;
pub mod frames;
pub mod metrics;
pub mod overlay;
pub mod pipeline;
pub mod pivot;
pub mod refine;
pub mod segmentation;
pub mod sheet;
pub mod synth;

pub use classifier::CoreVsFxClassifier;
pub use clip::AnimationClip;
pub use config::{ConfigError, SlicerConfig};
pub use decision::Decision;
pub use frames::FrameSlice;
pub use pipeline::{SheetOutcome, SheetPipeline, SheetStats};
pub use sheet::{Rect, SheetError, SpriteSheet};
