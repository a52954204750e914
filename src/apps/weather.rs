//! Weather card: a sun over a dotted horizon.
//!
//! No forecast source is wired in yet; the card always shows clear skies.

use crate::app::ports::{Application, DisplayPort, Rgb};

const SUN: Rgb = (255, 255, 0);
const GROUND: Rgb = (0, 0, 200);

#[derive(Debug)]
pub struct WeatherApp {
    sun_radius: i32,
}

impl Default for WeatherApp {
    fn default() -> Self {
        Self { sun_radius: 8 }
    }
}

impl WeatherApp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Application for WeatherApp {
    fn update(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn draw(&mut self, display: &mut dyn DisplayPort) -> anyhow::Result<()> {
        let w = display.width() as i32;
        let h = display.height() as i32;
        let (cx, cy, r) = (w / 2, h * 20 / 64, self.sun_radius);

        for x in cx - r..=cx + r {
            for y in cy - r..=cy + r {
                if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                    display.set_pixel(x, y, SUN);
                }
            }
        }
        for x in (0..w).step_by(4) {
            display.set_pixel(x, h - 4, GROUND);
        }
        Ok(())
    }
}
