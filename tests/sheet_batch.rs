mod common;

use common::{five_squares, squares, two_squares};
use image::Rgba;
use sprite_slicer::overlay::render_overlay;
use sprite_slicer::{CoreVsFxClassifier, Rect, SheetPipeline, SlicerConfig, SpriteSheet};

fn sheets() -> Vec<SpriteSheet> {
    vec![
        two_squares("pair.png"),
        five_squares("row.png"),
        squares("idle.png", 64, 64, &[(22, 22, 20)]),
        squares("walk.png", 96, 96, &[(8, 8, 30), (56, 8, 30), (8, 56, 30), (56, 56, 30)]),
    ]
}

#[test]
fn batch_matches_sequential_decisions() {
    let pipeline = SheetPipeline::new(SlicerConfig::default()).expect("valid config");
    let sheets = sheets();

    let mut batch_classifier = CoreVsFxClassifier::new();
    let batch = pipeline.process_batch(&sheets, &mut batch_classifier);

    let mut serial_classifier = CoreVsFxClassifier::new();
    let serial: Vec<_> = sheets
        .iter()
        .map(|s| pipeline.process(s, &mut serial_classifier))
        .collect();

    assert_eq!(batch.len(), sheets.len());
    for (b, s) in batch.iter().zip(&serial) {
        assert_eq!(b.source, s.source);
        assert_eq!(b.decision, s.decision);
        let rects_b: Vec<Rect> = b.frames.iter().map(|f| f.rect).collect();
        let rects_s: Vec<Rect> = s.frames.iter().map(|f| f.rect).collect();
        assert_eq!(rects_b, rects_s);
    }
    assert_eq!(batch_classifier.sheets_seen(), 4);
    assert_eq!(serial_classifier.sheets_seen(), 4);
}

#[test]
fn batch_runs_are_reproducible() {
    let pipeline = SheetPipeline::new(SlicerConfig::default()).expect("valid config");
    let sheets = sheets();

    let mut first = CoreVsFxClassifier::new();
    let mut second = CoreVsFxClassifier::new();
    let a = pipeline.process_batch(&sheets, &mut first);
    let b = pipeline.process_batch(&sheets, &mut second);

    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.frames, y.frames);
        assert_eq!(x.stats, y.stats);
    }
    assert_eq!(first, second);
}

#[test]
fn empty_batch_still_leaves_classifier_untouched() {
    let pipeline = SheetPipeline::new(SlicerConfig::default()).expect("valid config");
    let mut classifier = CoreVsFxClassifier::new();
    assert!(pipeline.process_batch(&[], &mut classifier).is_empty());
    assert_eq!(classifier, CoreVsFxClassifier::new());
}

#[test]
fn overlay_outlines_frames_in_decision_colour() {
    let sheet = two_squares("pair.png");
    let pipeline = SheetPipeline::new(SlicerConfig::default()).expect("valid config");
    let outcome = pipeline.process(&sheet, &mut CoreVsFxClassifier::new());

    let overlay = render_overlay(&sheet, &outcome);
    assert_eq!(overlay.dimensions(), sheet.image().dimensions());
    assert_eq!(*overlay.get_pixel(2, 2), Rgba([230, 130, 30, 255]));
    assert_eq!(*overlay.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
}
