//! Pixie device control plane.
//!
//! Exposes the app lifecycle, network provisioning, and HTTP surfaces as a
//! library so the boot binary and the integration tests share one build.
//! Hardware and the host network stack are reached only through the port
//! traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod apps;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod provisioning;
pub mod task;
