//! Debug overlay: frame rectangles and pivots drawn over the sheet.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as DrawRect;

use crate::decision::Decision;
use crate::pipeline::SheetOutcome;
use crate::sheet::SpriteSheet;

const COLOR_WHOLE: Rgba<u8> = Rgba([110, 170, 90, 255]);
const COLOR_TWO: Rgba<u8> = Rgba([230, 130, 30, 255]);
const COLOR_MANY: Rgba<u8> = Rgba([60, 110, 220, 255]);
const COLOR_PIVOT: Rgba<u8> = Rgba([210, 70, 210, 255]);
const COLOR_COMPONENT: Rgba<u8> = Rgba([200, 200, 200, 255]);

fn decision_color(decision: Decision) -> Rgba<u8> {
    match decision {
        Decision::Whole => COLOR_WHOLE,
        Decision::Two => COLOR_TWO,
        Decision::Many => COLOR_MANY,
    }
}

/// Renders the sheet with component boxes, frame boxes (coloured by
/// decision) and a cross on every pivot.
pub fn render_overlay(sheet: &SpriteSheet, outcome: &SheetOutcome) -> RgbaImage {
    let mut canvas = sheet.image().clone();

    for c in &outcome.components {
        let r = c.bounds;
        draw_hollow_rect_mut(
            &mut canvas,
            DrawRect::at(r.x as i32, r.y as i32).of_size(r.width, r.height),
            COLOR_COMPONENT,
        );
    }

    let frame_color = decision_color(outcome.decision);
    for frame in &outcome.frames {
        let r = frame.rect;
        draw_hollow_rect_mut(
            &mut canvas,
            DrawRect::at(r.x as i32, r.y as i32).of_size(r.width, r.height),
            frame_color,
        );
        let (px, py) = frame.pivot_in_sheet();
        draw_cross_mut(&mut canvas, COLOR_PIVOT, px.round() as i32, py.round() as i32);
    }

    canvas
}
