//! Software pixel buffer and the emulated display built on it.
//!
//! [`PixelBuffer`] is the plain row-major RGB store shared by both display
//! adapters.  [`FrameBufferDisplay`] implements [`DisplayPort`] entirely in
//! memory and publishes every refreshed frame to a [`FrameFeed`] that the
//! control surface serves to remote viewers in emulator mode.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::app::ports::{BLACK, DisplayPort, Rgb};
use crate::error::DisplayError;

// ───────────────────────────────────────────────────────────────
// Pixel buffer
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn set(&mut self, x: i32, y: i32, colour: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = colour;
        }
    }

    /// Out-of-range reads return black.
    pub fn get(&self, x: i32, y: i32) -> Rgb {
        self.index(x, y).map_or(BLACK, |i| self.pixels[i])
    }

    pub fn fill(&mut self, colour: Rgb) {
        self.pixels.fill(colour);
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Copy of the buffer with every channel scaled by `percent`.
    pub fn scaled(&self, percent: u8) -> Vec<Rgb> {
        let scale = |c: u8| (u16::from(c) * u16::from(percent.min(100)) / 100) as u8;
        self.pixels.iter().map(|&(r, g, b)| (scale(r), scale(g), scale(b))).collect()
    }
}

// ───────────────────────────────────────────────────────────────
// Frame feed (emulator viewers)
// ───────────────────────────────────────────────────────────────

/// Last frame pushed by [`FrameBufferDisplay::refresh`].
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    /// Row-major `[r, g, b]` triples.
    pub pixels: Vec<Rgb>,
}

/// Cloneable handle to the most recently published frame.
#[derive(Debug, Clone, Default)]
pub struct FrameFeed(Arc<Mutex<Frame>>);

impl FrameFeed {
    pub fn latest(&self) -> Frame {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn publish(&self, frame: Frame) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = frame;
    }
}

// ───────────────────────────────────────────────────────────────
// Emulated display
// ───────────────────────────────────────────────────────────────

pub struct FrameBufferDisplay {
    buffer: PixelBuffer,
    brightness: u8,
    feed: FrameFeed,
    refresh_count: u64,
}

impl FrameBufferDisplay {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            buffer: PixelBuffer::new(width, height),
            brightness: 100,
            feed: FrameFeed::default(),
            refresh_count: 0,
        }
    }

    /// Handle viewers use to read published frames.
    pub fn feed(&self) -> FrameFeed {
        self.feed.clone()
    }

    /// Pixel in the working (not yet published) buffer.
    pub fn pixel(&self, x: i32, y: i32) -> Rgb {
        self.buffer.get(x, y)
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }
}

impl DisplayPort for FrameBufferDisplay {
    fn width(&self) -> usize {
        self.buffer.width()
    }

    fn height(&self) -> usize {
        self.buffer.height()
    }

    fn set_pixel(&mut self, x: i32, y: i32, colour: Rgb) {
        self.buffer.set(x, y, colour);
    }

    fn fill(&mut self, colour: Rgb) {
        self.buffer.fill(colour);
    }

    fn refresh(&mut self) -> Result<(), DisplayError> {
        self.refresh_count += 1;
        self.feed.publish(Frame {
            width: self.buffer.width(),
            height: self.buffer.height(),
            pixels: self.buffer.scaled(self.brightness),
        });
        Ok(())
    }

    fn set_brightness(&mut self, percent: u8) {
        self.brightness = percent.min(100);
    }
}
