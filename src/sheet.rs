use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};

/// Axis-aligned integer rectangle in sheet pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Smallest rectangle covering both. Empty rectangles are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    pub fn iou(&self, other: &Rect) -> f32 {
        let inter = self.intersection(other).map(|r| r.area()).unwrap_or(0);
        let union = self.area() + other.area() - inter;
        if union == 0 {
            0.0
        } else {
            inter as f32 / union as f32
        }
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Grows the rectangle by `pad` on every side without leaving `bounds`.
    pub fn padded_within(&self, pad: u32, bounds: &Rect) -> Rect {
        let x = self.x.saturating_sub(pad).max(bounds.x);
        let y = self.y.saturating_sub(pad).max(bounds.y);
        let right = self.right().saturating_add(pad).min(bounds.right());
        let bottom = self.bottom().saturating_add(pad).min(bounds.bottom());
        Rect::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y))
    }
}

/// Errors raised while wrapping a raster into a [`SpriteSheet`].
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("rgba buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// One packed input raster and the path it came from.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    image: RgbaImage,
    source: PathBuf,
}

impl SpriteSheet {
    pub fn new(image: RgbaImage, source: impl Into<PathBuf>) -> Self {
        Self {
            image,
            source: source.into(),
        }
    }

    pub fn from_dynamic(image: &DynamicImage, source: impl Into<PathBuf>) -> Self {
        Self::new(image.to_rgba8(), source)
    }

    pub fn from_rgba(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        source: impl Into<PathBuf>,
    ) -> Result<Self, SheetError> {
        let expected = width as usize * height as usize * 4;
        let actual = pixels.len();
        match RgbaImage::from_raw(width, height, pixels) {
            Some(image) if actual == expected => Ok(Self::new(image, source)),
            _ => Err(SheetError::BufferSize {
                width,
                height,
                expected,
                actual,
            }),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name used for override matching and clip naming.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn stem(&self) -> String {
        self.source
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sheet".to_string())
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    /// Copies `rect` out of the sheet. Panics when `rect` leaves the sheet.
    pub fn crop(&self, rect: Rect) -> RgbaImage {
        assert!(
            self.bounds().contains_rect(&rect),
            "crop {rect:?} outside sheet {}x{}",
            self.width(),
            self.height()
        );
        image::imageops::crop_imm(&self.image, rect.x, rect.y, rect.width, rect.height).to_image()
    }
}
