//! On-device diagnostic frames and panic logging.
//!
//! Two fixed frames exist:
//!
//! - **Error frame**: red 2-pixel border with a `!` glyph in the centre,
//!   drawn after a failed app frame and by
//!   [`LifecycleManager::draw_error_frame`](crate::app::lifecycle::LifecycleManager::draw_error_frame).
//! - **Fatal frame**: full-screen red diagonal hatch, drawn once before the
//!   process exits on a startup failure.
//!
//! Neither frame calls `refresh`; the caller decides when to push.

use crate::app::ports::{DisplayPort, Rgb};

const BORDER: Rgb = (255, 0, 0);
const GLYPH: Rgb = (255, 50, 50);
const HATCH: Rgb = (255, 0, 0);

/// Red border plus a centred exclamation mark.
pub fn draw_error_frame(display: &mut dyn DisplayPort) {
    let w = display.width() as i32;
    let h = display.height() as i32;

    display.clear();

    for x in 0..w {
        for y in [0, 1, h - 2, h - 1] {
            display.set_pixel(x, y, BORDER);
        }
    }
    for y in 0..h {
        for x in [0, 1, w - 2, w - 1] {
            display.set_pixel(x, y, BORDER);
        }
    }

    // Glyph proportions are taken from a 64-row panel and scaled.
    let cx = w / 2;
    let bar_top = h * 20 / 64;
    let bar_bottom = h * 38 / 64;
    let dot_top = h * 42 / 64;
    let dot_bottom = (h * 45 / 64).max(dot_top + 1);
    for y in (bar_top..bar_bottom).chain(dot_top..dot_bottom) {
        display.set_pixel(cx, y, GLYPH);
        display.set_pixel(cx - 1, y, GLYPH);
    }
}

/// Diagonal hatch covering the whole panel.
pub fn draw_fatal_frame(display: &mut dyn DisplayPort) {
    let w = display.width() as i32;
    let h = display.height() as i32;
    display.clear();
    for x in 0..w {
        for y in 0..h {
            if (x + y) % 4 == 0 {
                display.set_pixel(x, y, HATCH);
            }
        }
    }
}

/// Log panics (with the thread name) before the default hook runs.
pub fn install_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");
        log::error!("PANIC in thread '{}': {}", name, info);
        default_hook(info);
    }));
}
