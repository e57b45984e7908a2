//! Captured-frame primitives.
//!
//! The capture path hands the detectors an owned RGBA snapshot. RGB channels
//! live in a flat `Vec<Color>`; the alpha channel is collapsed at ingestion
//! into a packed opacity bitmask so the per-pixel hot path stays a single bit
//! test. Frames also support simple painting and PNG export for synthetic
//! scenes and annotated debug output.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point};

/// Alpha floor below which a pixel is invisible to every detector. Loose
/// enough to keep anti-aliased glyph edges, strict enough to drop compositor
/// artifacts.
pub const OPAQUE_FLOOR: u8 = 250;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// True iff every channel delta is within `tolerance`. Symmetric in the
    /// two colors.
    #[inline]
    pub fn matches(&self, other: Color, tolerance: u8) -> bool {
        self.r.abs_diff(other.r) <= tolerance
            && self.g.abs_diff(other.g) <= tolerance
            && self.b.abs_diff(other.b) <= tolerance
    }
}

/// Owned frame snapshot: RGB data plus the packed opacity mask.
#[derive(Clone, Debug)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<Color>,
    mask: Vec<u8>,
}

impl Frame {
    /// Build a `Frame` from tightly packed RGBA bytes (`width * height * 4`).
    ///
    /// The mask bit for a pixel is set iff its alpha is >= [`OPAQUE_FLOOR`].
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        let height = bytes.len() / width / 4;
        let mut data = Vec::with_capacity(width * height);
        let mut mask = vec![0u8; width * height / 8 + 1];

        for (i, px) in bytes.chunks_exact(4).enumerate() {
            data.push(Color::new(px[0], px[1], px[2]));
            if px[3] >= OPAQUE_FLOOR {
                mask[i / 8] |= 1 << (i % 8);
            }
        }

        Self {
            width: width as u32,
            height: height as u32,
            data,
            mask,
        }
    }

    /// Decode an RGBA PNG into a `Frame`.
    pub fn from_png(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .context("decode png")?
            .to_rgba8();
        Ok(Self::from_rgba(img.width() as usize, img.as_raw()))
    }

    /// A fully opaque frame filled with one color. Starting point for painted
    /// synthetic scenes.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            data: vec![color; len],
            mask: vec![0xff; len / 8 + 1],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.width as i32 / 2, self.height as i32 / 2)
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.data[(x + y * self.width) as usize]
    }

    #[inline]
    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        let i = (x + y * self.width) as usize;
        (self.mask[i / 8] >> (i % 8)) & 1 == 1
    }

    fn clip(&self, rect: Bounds) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = (rect.x + rect.w).min(self.width as i32 - 1);
        let y1 = (rect.y + rect.h).min(self.height as i32 - 1);
        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    /// Paint a solid rectangle (clipped to the frame). Painted pixels are
    /// fully opaque.
    pub fn fill_rect(&mut self, rect: Bounds, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let i = (x + y * self.width) as usize;
                self.data[i] = color;
                self.mask[i / 8] |= 1 << (i % 8);
            }
        }
    }

    /// Punch a transparent hole: pixels keep their color but drop below the
    /// opacity floor.
    pub fn clear_rect(&mut self, rect: Bounds) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let i = (x + y * self.width) as usize;
                self.mask[i / 8] &= !(1 << (i % 8));
            }
        }
    }

    /// Outline a rectangle (clipped). Used for annotated probe output.
    pub fn draw_rect(&mut self, rect: Bounds, color: Color) {
        self.fill_rect(Bounds::new(rect.x, rect.y, rect.w, 0), color);
        self.fill_rect(Bounds::new(rect.x, rect.y + rect.h, rect.w, 0), color);
        self.fill_rect(Bounds::new(rect.x, rect.y, 0, rect.h), color);
        self.fill_rect(Bounds::new(rect.x + rect.w, rect.y, 0, rect.h), color);
    }

    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let mut bytes = vec![0u8; self.data.len() * 3];
        for (i, c) in self.data.iter().enumerate() {
            bytes[i * 3] = c.r;
            bytes[i * 3 + 1] = c.g;
            bytes[i * 3 + 2] = c.b;
        }
        let img = image::RgbImage::from_raw(self.width, self.height, bytes)
            .context("RgbImage::from_raw failed")?;
        img.save_with_format(path, image::ImageFormat::Png)
            .context("save png")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_matches_is_symmetric_and_bounded() {
        let a = Color::new(100, 100, 100);
        let b = Color::new(105, 96, 103);
        assert!(a.matches(b, 5));
        assert!(b.matches(a, 5));
        assert!(!a.matches(b, 4));
        assert!(a.matches(a, 0));
    }

    #[test]
    fn from_rgba_applies_opacity_floor() {
        // Three pixels: opaque, just below the floor, exactly at the floor.
        let bytes = [
            10, 20, 30, 255, //
            10, 20, 30, OPAQUE_FLOOR - 1, //
            10, 20, 30, OPAQUE_FLOOR,
        ];
        let frame = Frame::from_rgba(3, &bytes);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 1);
        assert!(frame.is_opaque(0, 0));
        assert!(!frame.is_opaque(1, 0));
        assert!(frame.is_opaque(2, 0));
        assert_eq!(frame.pixel(1, 0), Color::new(10, 20, 30));
    }

    #[test]
    fn fill_rect_clips_and_sets_opacity() {
        let mut frame = Frame::filled(10, 10, Color::BLACK);
        frame.clear_rect(Bounds::new(0, 0, 9, 9));
        // Partially off-frame rectangle.
        frame.fill_rect(Bounds::new(8, 8, 5, 5), Color::WHITE);
        assert_eq!(frame.pixel(9, 9), Color::WHITE);
        assert!(frame.is_opaque(9, 9));
        assert_eq!(frame.pixel(7, 7), Color::BLACK);
        assert!(!frame.is_opaque(7, 7));
    }

    #[test]
    fn rect_fully_outside_is_ignored() {
        let mut frame = Frame::filled(4, 4, Color::BLACK);
        frame.fill_rect(Bounds::new(10, 10, 3, 3), Color::WHITE);
        frame.fill_rect(Bounds::new(-8, -8, 3, 3), Color::WHITE);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(frame.pixel(x, y), Color::BLACK);
            }
        }
    }
}
