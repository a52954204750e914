//! Application core: lifecycle logic with no direct I/O.
//!
//! This module contains the rules for which app is on screen, how frames
//! are driven, and how a failing app is replaced.  All interaction with the
//! panel and the logger happens through **port traits** defined in
//! [`ports`], keeping this layer testable without real hardware.

pub mod events;
pub mod lifecycle;
pub mod ports;
