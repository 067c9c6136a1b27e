mod common;

use common::{approx, five_squares, squares, two_squares, BLUE, RED, WHITE};
use sprite_slicer::decision::{DecisionReason, OverrideRule};
use sprite_slicer::synth::block_sheet;
use sprite_slicer::{CoreVsFxClassifier, Decision, Rect, SheetPipeline, SlicerConfig, SpriteSheet};

fn run(sheet: &SpriteSheet, config: SlicerConfig) -> sprite_slicer::SheetOutcome {
    let pipeline = SheetPipeline::new(config).expect("valid config");
    pipeline.process(sheet, &mut CoreVsFxClassifier::new())
}

#[test]
fn opaque_square_is_one_whole_frame() {
    let sheet = SpriteSheet::new(block_sheet(64, 64, &[(Rect::new(0, 0, 64, 64), RED)]), "block.png");
    let out = run(&sheet, SlicerConfig::default());

    assert_eq!(out.decision, Decision::Whole);
    assert_eq!(out.frames.len(), 1);
    assert_eq!(out.frames[0].rect, Rect::new(0, 0, 64, 64));
    assert_eq!(out.frames[0].image.dimensions(), (64, 64));
    assert_eq!(out.clips.len(), 1);
    assert_eq!(out.clips[0].frames, vec![0]);
}

#[test]
fn two_separated_squares_give_two_frames() {
    let sheet = two_squares("pair.png");
    let out = run(&sheet, SlicerConfig::default());

    assert_eq!(out.stats.component_count, 2);
    assert_eq!(out.stats.cluster_count, 2);
    assert!(!out.stats.fallback_split);
    assert_eq!(out.decision, Decision::Two);
    assert_eq!(out.frames.len(), 2);
    assert_eq!(out.frames[0].rect, Rect::new(2, 2, 60, 60));
    assert_eq!(out.frames[1].rect, Rect::new(66, 2, 60, 60));
    for frame in &out.frames {
        assert!(approx(frame.pivot.0, 0.5), "pivot {:?}", frame.pivot);
        assert!(approx(frame.pivot.1, 0.5), "pivot {:?}", frame.pivot);
    }
}

#[test]
fn two_squares_stay_two_frames_when_overlap_rule_is_strict() {
    let sheet = two_squares("pair.png");
    for config in [
        SlicerConfig {
            eps: 8.0,
            ..SlicerConfig::default()
        },
        SlicerConfig {
            two_gap_iou_max: 0.0,
            padding: 0,
            ..SlicerConfig::default()
        },
    ] {
        let out = run(&sheet, config);
        assert!(matches!(out.decision, Decision::Two | Decision::Many));
        assert_eq!(out.frames.len(), 2);
    }
}

#[test]
fn forced_two_override_beats_five_clusters() {
    let sheet = five_squares("combo_burst.png");

    let natural = run(&sheet, SlicerConfig::default());
    assert_eq!(natural.decision, Decision::Many);
    assert_eq!(natural.frames.len(), 5);

    let config = SlicerConfig {
        decision_overrides: vec![OverrideRule::new("combo_*", Decision::Two)],
        ..SlicerConfig::default()
    };
    let out = run(&sheet, config);
    assert_eq!(out.decision, Decision::Two);
    assert_eq!(
        out.reason,
        DecisionReason::Override {
            pattern: "combo_*".to_string()
        }
    );
    assert_eq!(out.frames.len(), 2);
    assert_eq!(out.frames[0].rect, Rect::new(6, 6, 28, 28));
    assert_eq!(out.frames[1].rect, Rect::new(54, 6, 172, 28));
}

#[test]
fn builtin_two_override_applies_without_config() {
    let sheet = five_squares("dual_slash_v2.png");
    let out = run(&sheet, SlicerConfig::default());
    assert_eq!(out.decision, Decision::Two);
    assert_eq!(out.frames.len(), 2);
}

#[test]
fn transparent_sheet_yields_nothing() {
    let sheet = SpriteSheet::new(block_sheet(32, 32, &[]), "empty.png");
    let out = run(&sheet, SlicerConfig::default());

    assert_eq!(out.decision, Decision::Whole);
    assert_eq!(out.reason, DecisionReason::NoContent);
    assert!(out.frames.is_empty());
    assert!(out.clips.is_empty());
    assert_eq!(out.stats.coverage, 0.0);
}

#[test]
fn forced_two_on_transparent_sheet_yields_nothing() {
    let sheet = SpriteSheet::new(block_sheet(32, 16, &[]), "dual_slash_empty.png");
    let out = run(&sheet, SlicerConfig::default());
    assert_eq!(out.decision, Decision::Two);
    assert!(out.frames.is_empty());
}

#[test]
fn whole_override_keeps_many_squares_together() {
    let sheet = squares("portrait_full_knight.png", 96, 32, &[(2, 2, 20), (40, 2, 20), (74, 2, 20)]);
    let out = run(&sheet, SlicerConfig::default());
    assert_eq!(out.decision, Decision::Whole);
    assert_eq!(out.frames.len(), 1);
    assert_eq!(out.frames[0].rect, Rect::new(2, 2, 92, 20));

    let config = SlicerConfig {
        decision_overrides: vec![OverrideRule::new("*knight*", Decision::Many)],
        ..SlicerConfig::default()
    };
    let out = run(&sheet, config);
    assert_eq!(out.decision, Decision::Whole);
}

#[test]
fn grid_of_frames_is_read_row_by_row() {
    let sheet = squares(
        "walk.png",
        96,
        96,
        &[(56, 56, 30), (8, 56, 30), (56, 8, 30), (8, 8, 30)],
    );
    let out = run(&sheet, SlicerConfig::default());

    assert_eq!(out.decision, Decision::Many);
    let origins: Vec<(u32, u32)> = out.frames.iter().map(|f| (f.rect.x, f.rect.y)).collect();
    assert_eq!(origins, vec![(6, 6), (54, 6), (6, 54), (54, 54)]);
    let indices: Vec<usize> = out.frames.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(out.clips[0].name, "walk");
    assert_eq!(out.clips[0].frames, vec![0, 1, 2, 3]);
}

#[test]
fn lone_sprite_is_whole_and_unpadded() {
    let sheet = squares("idle.png", 64, 64, &[(22, 22, 20)]);
    let out = run(&sheet, SlicerConfig::default());

    assert_eq!(out.decision, Decision::Whole);
    assert_eq!(out.frames.len(), 1);
    assert_eq!(out.frames[0].rect, Rect::new(22, 22, 20, 20));
}

#[test]
fn repeated_runs_are_identical() {
    let sheet = five_squares("repeat.png");
    let a = run(&sheet, SlicerConfig::default());
    let b = run(&sheet, SlicerConfig::default());

    assert_eq!(a.decision, b.decision);
    assert_eq!(a.stats, b.stats);
    assert_eq!(a.frames, b.frames);
}

#[test]
fn clip_name_override_and_timing() {
    let sheet = two_squares("hero_attack_02.png");
    let config = SlicerConfig {
        clip_name_overrides: vec![OverrideRule::new("hero_attack*", "attack".to_string())],
        frame_duration_ms: 80,
        looping: false,
        ..SlicerConfig::default()
    };
    let out = run(&sheet, config);

    let clip = &out.clips[0];
    assert_eq!(clip.name, "attack");
    assert_eq!(clip.frames, vec![0, 1]);
    assert_eq!(clip.frame_duration.as_millis(), 80);
    assert_eq!(clip.total_duration().as_millis(), 160);
    assert!(!clip.looping);
}

#[test]
fn stats_map_reports_thresholds() {
    let sheet = two_squares("pair.png");
    let out = run(&sheet, SlicerConfig::default());
    let map = out.stats.as_map();

    assert_eq!(map["frameCount"], 2.0);
    assert_eq!(map["clusterCount"], 2.0);
    assert_eq!(map["alphaThreshold"], 16.0);
    assert_eq!(map["fallbackSplit"], 0.0);
    assert!((map["coverage"] - 6272.0 / 8192.0).abs() < 1e-9);
}

fn diamond(name: &str, size: u32, radius: i32) -> SpriteSheet {
    let c = (size / 2) as i32;
    let mut img = block_sheet(size, size, &[]);
    for (x, y, p) in img.enumerate_pixels_mut() {
        if (x as i32 - c).abs() + (y as i32 - c).abs() <= radius {
            *p = RED;
        }
    }
    SpriteSheet::new(img, name)
}

#[test]
fn tapered_lone_sprite_is_not_split() {
    let sheet = diamond("gem.png", 64, 20);
    let out = run(&sheet, SlicerConfig::default());

    assert_eq!(out.stats.component_count, 1);
    assert!(!out.stats.fallback_split);
    assert_eq!(out.decision, Decision::Whole);
    assert_eq!(out.frames.len(), 1);
    assert_eq!(out.frames[0].rect, Rect::new(12, 12, 41, 41));
}

#[test]
fn dense_pair_with_transparent_gap_splits_in_two() {
    let sheet = SpriteSheet::new(
        block_sheet(
            128,
            64,
            &[(Rect::new(0, 0, 60, 64), RED), (Rect::new(68, 0, 60, 64), RED)],
        ),
        "dense_pair.png",
    );
    let out = run(&sheet, SlicerConfig::default());

    assert!(out.stats.coverage > 0.85);
    assert!(out.stats.fallback_split);
    assert_eq!(out.decision, Decision::Two);
    assert_eq!(out.reason, DecisionReason::ValleySplit);
    let rects: Vec<Rect> = out.frames.iter().map(|f| f.rect).collect();
    assert_eq!(rects, vec![Rect::new(0, 0, 62, 64), Rect::new(66, 0, 62, 64)]);
}

#[test]
fn matte_backed_row_gives_one_frame_per_sprite() {
    let sheet = SpriteSheet::new(
        block_sheet(
            160,
            64,
            &[
                (Rect::new(0, 0, 160, 64), WHITE),
                (Rect::new(10, 10, 30, 40), RED),
                (Rect::new(60, 10, 30, 40), BLUE),
                (Rect::new(110, 10, 30, 40), RED),
            ],
        ),
        "matte_row.png",
    );
    let out = run(&sheet, SlicerConfig::default());

    assert_eq!(out.stats.component_count, 3);
    assert_eq!(out.decision, Decision::Many);
    let rects: Vec<Rect> = out.frames.iter().map(|f| f.rect).collect();
    assert_eq!(
        rects,
        vec![
            Rect::new(8, 8, 34, 44),
            Rect::new(58, 8, 34, 44),
            Rect::new(108, 8, 34, 44),
        ]
    );
}

#[test]
fn overlap_limit_is_exclusive() {
    let sheet = two_squares("pair.png");
    let config = SlicerConfig {
        two_gap_iou_max: 0.0,
        ..SlicerConfig::default()
    };
    let out = run(&sheet, config);

    assert_eq!(out.decision, Decision::Many);
    assert_eq!(out.reason, DecisionReason::SeparatedClusters);
    assert_eq!(out.frames.len(), 2);
}
