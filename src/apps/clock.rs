//! Clock face: blue frame, blinking colon, seconds sweep along the bottom.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::ports::{Application, DisplayPort, Rgb};

const FRAME: Rgb = (0, 0, 255);
const COLON: Rgb = (255, 255, 255);
const SWEEP: Rgb = (0, 160, 255);

#[derive(Debug, Default)]
pub struct ClockApp {
    seconds: u64,
}

impl ClockApp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Application for ClockApp {
    fn update(&mut self) -> anyhow::Result<()> {
        self.seconds = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        Ok(())
    }

    fn draw(&mut self, display: &mut dyn DisplayPort) -> anyhow::Result<()> {
        let w = display.width() as i32;
        let h = display.height() as i32;

        for x in 0..w {
            display.set_pixel(x, 0, FRAME);
            display.set_pixel(x, h - 1, FRAME);
        }
        for y in 0..h {
            display.set_pixel(0, y, FRAME);
            display.set_pixel(w - 1, y, FRAME);
        }

        if self.seconds % 2 == 0 {
            let (cx, cy) = (w / 2, h / 2);
            display.set_pixel(cx, cy - 2, COLON);
            display.set_pixel(cx, cy + 2, COLON);
        }

        let sweep = ((self.seconds % 60) as i32 * (w - 4)) / 59;
        for x in 0..=sweep {
            display.set_pixel(2 + x, h - 3, SWEEP);
        }
        Ok(())
    }
}
