//! Setup screen shown while the device waits for provisioning.
//!
//! Alternates every few seconds between the hotspot QR code and an
//! instructions screen (pulsing border, WiFi arcs, blinking arrow).  The QR
//! module grid comes from the `qrcode` encoder; without one, only the
//! instructions screen is shown.

use std::time::{Duration, Instant};

use anyhow::Context;
use log::warn;
use qrcode::{Color, QrCode};

use crate::app::ports::{Application, DisplayPort, Rgb};

/// Time each screen stays up before toggling.
pub const TOGGLE_INTERVAL: Duration = Duration::from_secs(5);

const QR_DARK: Rgb = (0, 0, 0);
const QR_LIGHT: Rgb = (255, 255, 255);
const ICON: Rgb = (100, 100, 255);
const ARROW: Rgb = (0, 100, 255);

/// Square grid of QR modules, `true` = dark.
pub type QrModules = Vec<Vec<bool>>;

/// Encode `payload` into a square module grid.
pub fn encode_qr(payload: &str) -> anyhow::Result<QrModules> {
    let code = QrCode::new(payload.as_bytes()).context("encoding setup QR")?;
    let width = code.width();
    let colors = code.to_colors();
    Ok(colors
        .chunks(width)
        .map(|row| row.iter().map(|c| *c == Color::Dark).collect())
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupScreen {
    Qr,
    Instructions,
}

pub struct SetupApp {
    ap_ssid: String,
    qr_payload: String,
    modules: Option<QrModules>,
    screen: SetupScreen,
    last_toggle: Instant,
    interval: Duration,
    started: Instant,
}

impl SetupApp {
    pub fn new(ap_ssid: &str, qr_payload: &str) -> Self {
        let now = Instant::now();
        Self {
            ap_ssid: ap_ssid.to_string(),
            qr_payload: qr_payload.to_string(),
            modules: None,
            screen: SetupScreen::Instructions,
            last_toggle: now,
            interval: TOGGLE_INTERVAL,
            started: now,
        }
    }

    /// Setup screen for the hotspot, opening on the QR code for `qr_payload`.
    pub fn for_hotspot(ap_ssid: &str, qr_payload: &str) -> Self {
        let app = Self::new(ap_ssid, qr_payload);
        match encode_qr(qr_payload) {
            Ok(modules) => app.with_qr_modules(modules),
            Err(e) => {
                warn!("SETUP: {:#}, showing instructions only", e);
                app
            }
        }
    }

    /// Attach a pre-rendered QR grid; the QR screen is shown first.
    pub fn with_qr_modules(mut self, modules: QrModules) -> Self {
        self.modules = Some(modules).filter(|m| !m.is_empty());
        if self.modules.is_some() {
            self.screen = SetupScreen::Qr;
        }
        self
    }

    pub fn with_toggle_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn ap_ssid(&self) -> &str {
        &self.ap_ssid
    }

    pub fn qr_payload(&self) -> &str {
        &self.qr_payload
    }

    pub fn screen(&self) -> SetupScreen {
        self.screen
    }

    fn draw_qr(&self, display: &mut dyn DisplayPort, modules: &QrModules) {
        let w = display.width() as i32;
        let h = display.height() as i32;
        // One quiet-zone module on each side.
        let size = modules.len() as i32 + 2;
        let scale = (w.min(h) / size).max(1);
        let x0 = (w - size * scale) / 2;
        let y0 = (h - size * scale) / 2;

        for my in 0..size {
            for mx in 0..size {
                let dark = usize::try_from(my - 1)
                    .ok()
                    .zip(usize::try_from(mx - 1).ok())
                    .and_then(|(r, c)| modules.get(r).and_then(|row| row.get(c)))
                    .copied()
                    .unwrap_or(false);
                let colour = if dark { QR_DARK } else { QR_LIGHT };
                for dy in 0..scale {
                    for dx in 0..scale {
                        display.set_pixel(x0 + mx * scale + dx, y0 + my * scale + dy, colour);
                    }
                }
            }
        }
    }

    fn draw_instructions(&self, display: &mut dyn DisplayPort) {
        let w = display.width() as i32;
        let h = display.height() as i32;
        let t = self.started.elapsed().as_secs_f32();

        let pulse = (128.0 + 127.0 * (0.5 + 0.5 * (t * 2.0).sin())).min(255.0) as u8;
        let border = (0, 0, pulse);
        for x in 0..w {
            display.set_pixel(x, 0, border);
            display.set_pixel(x, h - 1, border);
        }
        for y in 0..h {
            display.set_pixel(0, y, border);
            display.set_pixel(w - 1, y, border);
        }

        let (cx, cy) = (w / 2, h * 28 / 64);
        for radius in [5.0_f32, 10.0, 15.0] {
            for angle in 60..=120 {
                let rad = ((angle + 180) as f32).to_radians();
                let x = cx + (radius * rad.cos()) as i32;
                let y = cy + (radius * rad.sin()) as i32;
                display.set_pixel(x, y, ICON);
            }
        }
        for dx in -1..=1 {
            for dy in -1..=1 {
                display.set_pixel(cx + dx, cy + dy, ICON);
            }
        }

        if (t * 2.0) as u32 % 2 == 0 {
            let y = h * 56 / 64;
            for x in (w * 24 / 64)..(w * 40 / 64) {
                display.set_pixel(x, y, ARROW);
            }
        }
    }
}

impl Application for SetupApp {
    fn start(&mut self) -> anyhow::Result<()> {
        log::info!("SETUP: showing join instructions for '{}'", self.ap_ssid);
        self.last_toggle = Instant::now();
        Ok(())
    }

    fn update(&mut self) -> anyhow::Result<()> {
        if self.modules.is_some() && self.last_toggle.elapsed() >= self.interval {
            self.screen = match self.screen {
                SetupScreen::Qr => SetupScreen::Instructions,
                SetupScreen::Instructions => SetupScreen::Qr,
            };
            self.last_toggle = Instant::now();
        }
        Ok(())
    }

    fn draw(&mut self, display: &mut dyn DisplayPort) -> anyhow::Result<()> {
        match (&self.modules, self.screen) {
            (Some(modules), SetupScreen::Qr) => self.draw_qr(display, modules),
            _ => self.draw_instructions(display),
        }
        Ok(())
    }
}
