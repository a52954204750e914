//! Panel display adapter.
//!
//! The HUB75 panel itself is driven by an external process; this adapter
//! composes frames in a [`PixelBuffer`] and writes each refreshed frame to
//! the driver's sink (a FIFO or character device) as raw RGB24, row-major.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use log::info;

use crate::adapters::matrix::PixelBuffer;
use crate::app::ports::{DisplayPort, Rgb};
use crate::error::DisplayError;

pub struct PanelDisplay {
    buffer: PixelBuffer,
    brightness: u8,
    sink: File,
    scratch: Vec<u8>,
}

impl PanelDisplay {
    /// Open the driver sink.  Fails if the panel driver is not running.
    pub fn open(path: &Path, width: usize, height: usize) -> Result<Self, DisplayError> {
        let sink = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| DisplayError::Open(format!("{}: {e}", path.display())))?;
        info!("Panel: {}x{} via {}", width, height, path.display());
        Ok(Self {
            buffer: PixelBuffer::new(width, height),
            brightness: 100,
            sink,
            scratch: Vec::with_capacity(width * height * 3),
        })
    }
}

impl DisplayPort for PanelDisplay {
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
        self.scratch.clear();
        for (r, g, b) in self.buffer.scaled(self.brightness) {
            self.scratch.extend_from_slice(&[r, g, b]);
        }
        self.sink
            .write_all(&self.scratch)
            .and_then(|()| self.sink.flush())
            .map_err(|e| DisplayError::Refresh(e.to_string()))
    }

    fn set_brightness(&mut self, percent: u8) {
        self.brightness = percent.min(100);
    }
}
