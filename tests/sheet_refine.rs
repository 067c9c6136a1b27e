mod common;

use common::{approx, squares};
use sprite_slicer::frames::FrameSlice;
use sprite_slicer::refine::FrameRefiner;
use sprite_slicer::Rect;

#[test]
fn trims_to_content_and_pads() {
    let sheet = squares("one.png", 64, 64, &[(20, 20, 10)]);
    let mut slice = FrameSlice::from_sheet(&sheet, 0, sheet.bounds());
    slice.pivot = (25.0 / 64.0, 25.0 / 64.0);

    let refined = FrameRefiner::new(16, 2).refine(&sheet, slice).expect("content");
    assert_eq!(refined.rect, Rect::new(18, 18, 14, 14));
    assert_eq!(refined.image.dimensions(), (14, 14));
    assert!(approx(refined.pivot.0, 0.5));
    assert!(approx(refined.pivot.1, 0.5));
}

#[test]
fn padding_stops_at_sheet_edge() {
    let sheet = squares("corner.png", 32, 32, &[(0, 0, 10), (26, 26, 6)]);
    let refiner = FrameRefiner::new(16, 4);

    let top_left = FrameSlice::from_sheet(&sheet, 0, Rect::new(0, 0, 16, 16));
    assert_eq!(refiner.refine(&sheet, top_left).map(|f| f.rect), Some(Rect::new(0, 0, 14, 14)));

    let bottom_right = FrameSlice::from_sheet(&sheet, 1, Rect::new(16, 16, 16, 16));
    assert_eq!(
        refiner.refine(&sheet, bottom_right).map(|f| f.rect),
        Some(Rect::new(22, 22, 10, 10))
    );
}

#[test]
fn padding_may_reach_outside_the_original_slice() {
    let sheet = squares("edge.png", 64, 32, &[(30, 8, 2)]);
    let slice = FrameSlice::from_sheet(&sheet, 0, Rect::new(30, 0, 34, 32));

    let refined = FrameRefiner::new(16, 3).refine(&sheet, slice).expect("content");
    assert_eq!(refined.rect, Rect::new(27, 5, 8, 8));
}

#[test]
fn empty_slice_is_dropped() {
    let sheet = squares("sparse.png", 64, 64, &[(0, 0, 8)]);
    let slice = FrameSlice::from_sheet(&sheet, 0, Rect::new(32, 32, 32, 32));
    assert!(FrameRefiner::new(16, 2).refine(&sheet, slice).is_none());
}

#[test]
fn refine_all_renumbers_survivors() {
    let sheet = squares("gaps.png", 96, 32, &[(4, 4, 8), (68, 4, 8)]);
    let slices = vec![
        FrameSlice::from_sheet(&sheet, 0, Rect::new(0, 0, 32, 32)),
        FrameSlice::from_sheet(&sheet, 1, Rect::new(32, 0, 32, 32)),
        FrameSlice::from_sheet(&sheet, 2, Rect::new(64, 0, 32, 32)),
    ];

    let refined = FrameRefiner::new(16, 0).refine_all(&sheet, slices);
    let summary: Vec<(usize, Rect)> = refined.iter().map(|f| (f.index, f.rect)).collect();
    assert_eq!(
        summary,
        vec![(0, Rect::new(4, 4, 8, 8)), (1, Rect::new(68, 4, 8, 8))]
    );
}
