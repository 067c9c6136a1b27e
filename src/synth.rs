use image::{Rgba, RgbaImage};

use crate::sheet::Rect;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Builds a transparent sheet with solid blocks painted at `blocks`.
///
/// Blocks are clipped to the canvas; later blocks paint over earlier ones.
pub fn block_sheet(width: u32, height: u32, blocks: &[(Rect, Rgba<u8>)]) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, TRANSPARENT);
    for (rect, color) in blocks {
        for y in rect.y..rect.bottom().min(height) {
            for x in rect.x..rect.right().min(width) {
                img.put_pixel(x, y, *color);
            }
        }
    }
    img
}

/// Demo sheet: a row of `frames` figures, each a solid body with a small
/// spark trail to its right.
///
/// Cells are 64×64 with the body at a fixed offset, so every frame has the
/// same expected pivot.
pub fn demo_sheet(frames: u32) -> RgbaImage {
    let body = Rgba([70, 90, 160, 255]);
    let spark = Rgba([255, 230, 80, 255]);
    let mut blocks = Vec::new();
    for i in 0..frames {
        let x0 = i * 64;
        blocks.push((Rect::new(x0 + 18, 14, 24, 40), body));
        for k in 0..3 {
            blocks.push((Rect::new(x0 + 45 + k * 5, 20 + k * 4, 4, 4), spark));
        }
    }
    block_sheet(frames.max(1) * 64, 64, &blocks)
}

/// Writes [`demo_sheet`] as a PNG.
pub fn generate_demo_sheet(path: &str, frames: u32) -> Result<(), String> {
    demo_sheet(frames)
        .save(path)
        .map_err(|e| format!("Failed to save image: {}", e))
}
