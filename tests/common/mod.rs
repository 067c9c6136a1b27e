#![allow(dead_code)]

use image::Rgba;
use sprite_slicer::synth::block_sheet;
use sprite_slicer::{Rect, SpriteSheet};

pub const RED: Rgba<u8> = Rgba([200, 40, 40, 255]);
pub const BLUE: Rgba<u8> = Rgba([40, 60, 200, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Transparent sheet with red squares `(x, y, size)`.
pub fn squares(name: &str, width: u32, height: u32, squares: &[(u32, u32, u32)]) -> SpriteSheet {
    let blocks: Vec<(Rect, Rgba<u8>)> = squares
        .iter()
        .map(|&(x, y, s)| (Rect::new(x, y, s, s), RED))
        .collect();
    SpriteSheet::new(block_sheet(width, height, &blocks), name)
}

/// Two 56×56 squares with an 8px transparent gap.
pub fn two_squares(name: &str) -> SpriteSheet {
    squares(name, 128, 64, &[(4, 4, 56), (68, 4, 56)])
}

/// Five 24×24 squares in one row, 24px apart.
pub fn five_squares(name: &str) -> SpriteSheet {
    let cells: Vec<(u32, u32, u32)> = (0..5).map(|i| (8 + i * 48, 8, 24)).collect();
    squares(name, 240, 40, &cells)
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
