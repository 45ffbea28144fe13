// Copyright 2026 the Lectern Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The backing pixel image the viewer renders into.

use alloc::vec;
use alloc::vec::Vec;

/// An XRGB8888 image, row-major, one `u32` per pixel.
///
/// The alpha byte is ignored by the server. The run loop owns a single
/// canvas and reallocates it only when the window size changes.
#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Canvas {
    /// Allocates a black canvas.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[must_use]
    pub const fn stride(&self) -> u32 {
        self.width * 4
    }

    /// All pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// All pixels, row-major, mutably.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// The pixel at `(x, y)`, or `None` outside the canvas.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Sets one pixel; coordinates outside the canvas are ignored.
    pub fn put(&mut self, x: i32, y: i32, color: u32) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        if let Some(px) = self.pixels.get_mut(idx) {
            *px = color;
        }
    }

    /// Fills the whole canvas.
    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Fills a rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: u32) {
        let x0 = clamp_coord(i64::from(x), self.width);
        let y0 = clamp_coord(i64::from(y), self.height);
        let x1 = clamp_coord(i64::from(x) + i64::from(w), self.width);
        let y1 = clamp_coord(i64::from(y) + i64::from(h), self.height);
        if x0 >= x1 {
            return;
        }
        let stride = self.width as usize;
        for row in y0..y1 {
            let start = row * stride;
            self.pixels[start + x0..start + x1].fill(color);
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "clamped to 0..=u32::MAX, which fits usize on supported targets"
)]
fn clamp_coord(v: i64, limit: u32) -> usize {
    v.clamp(0, i64::from(limit)) as usize
}

impl core::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_canvas_is_black() {
        let canvas = Canvas::new(4, 3);
        assert_eq!(canvas.pixels().len(), 12);
        assert!(canvas.pixels().iter().all(|&p| p == 0));
        assert_eq!(canvas.stride(), 16);
    }

    #[test]
    fn fill_rect_clips_to_bounds() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(-2, 2, 4, 10, 0xff);
        assert_eq!(canvas.pixel(0, 2), Some(0xff));
        assert_eq!(canvas.pixel(1, 3), Some(0xff));
        assert_eq!(canvas.pixel(2, 2), Some(0));
        assert_eq!(canvas.pixel(0, 1), Some(0));
    }

    #[test]
    fn fill_rect_fully_outside_is_noop() {
        let mut canvas = Canvas::new(2, 2);
        canvas.fill_rect(5, 5, 3, 3, 1);
        canvas.fill_rect(-10, 0, 3, 3, 1);
        assert!(canvas.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn put_ignores_out_of_range() {
        let mut canvas = Canvas::new(2, 2);
        canvas.put(-1, 0, 7);
        canvas.put(2, 0, 7);
        canvas.put(1, 1, 7);
        assert_eq!(canvas.pixel(1, 1), Some(7));
        assert_eq!(canvas.pixels().iter().filter(|&&p| p == 7).count(), 1);
    }
}
