//! Pixie main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  PanelDisplay / FrameBufferDisplay   SystemCommandRunner       │
//! │  (DisplayPort)                       (CommandRunner → nmcli)   │
//! │  LogEventSink (EventSink)            axum (control · portal)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  LifecycleManager · ProvisioningManager (pure logic)   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Boot: config → display → runtime → provisioning gate → apps → control
//! surface → render loop until interrupt.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{error, info, warn};
use tokio::runtime::Runtime;

use pixie::adapters::command::SystemCommandRunner;
use pixie::adapters::log_sink::LogEventSink;
use pixie::adapters::matrix::{FrameBufferDisplay, FrameFeed};
use pixie::adapters::panel::PanelDisplay;
use pixie::app::lifecycle::{LifecycleManager, SharedLifecycle};
use pixie::app::ports::{DisplayPort, EventSink};
use pixie::apps::{ClockApp, SetupApp, WeatherApp};
use pixie::config::PixieConfig;
use pixie::diagnostics;
use pixie::error::LifecycleError;
use pixie::http::{self, control, portal::PortalSession};
use pixie::provisioning::ProvisioningManager;
use pixie::task::{self, Shutdown};

const RENDER_STACK_KB: usize = 256;

#[derive(Debug, Parser)]
#[command(name = "pixie", version, about = "Pixel-matrix display controller")]
struct Cli {
    /// Render into the in-memory frame buffer and serve it to viewers
    #[arg(long)]
    emulator: bool,

    /// App to show after boot (defaults to the configured app)
    #[arg(long, value_name = "NAME")]
    app: Option<String>,

    /// JSON config file (falls back to $PIXIE_CONFIG, then defaults)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip the WiFi check and setup portal
    #[arg(long)]
    skip_provisioning: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    diagnostics::install_panic_handler();
    let cli = Cli::parse();

    info!("Pixie v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("FATAL: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    // ── 1. Config ─────────────────────────────────────────────
    let config = PixieConfig::load(cli.config.as_deref()).context("loading config")?;

    // ── 2. Display (one per process, never swapped) ──────────
    let (mut display, feed) = open_display(&config, cli.emulator)?;
    display.set_brightness(config.brightness);

    // ── 3. Async runtime for the HTTP surfaces ────────────────
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("pixie-http")
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            show_fatal(display.as_mut());
            return Err(e).context("building async runtime");
        }
    };

    let events: Arc<dyn EventSink> = Arc::new(LogEventSink::new());

    // ── 4. Provisioning gate ──────────────────────────────────
    if cli.emulator || cli.skip_provisioning {
        info!("Boot: provisioning skipped");
    } else {
        display = provision(&config, display, &runtime, &events)?;
    }

    // ── 5. Apps ───────────────────────────────────────────────
    let mut manager = LifecycleManager::new(display, Arc::clone(&events))
        .with_error_threshold(config.frame_error_threshold);
    if let Err(e) = start_apps(&mut manager, cli.app.as_deref(), &config.default_app) {
        abandon(manager);
        return Err(e).context("starting apps");
    }
    let lifecycle = SharedLifecycle::new(manager);

    // ── 6. Control surface ────────────────────────────────────
    let port = config.control_port(cli.emulator);
    let router = control::router(lifecycle.clone(), feed);
    runtime.spawn(async move {
        if let Err(e) = http::serve(router, port).await {
            error!("HTTP: control surface stopped: {:#}", e);
        }
    });

    // ── 7. Render loop until interrupt ────────────────────────
    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, shutting down");
                shutdown.request();
            }
        });
    }

    let render = {
        let lifecycle = lifecycle.clone();
        let shutdown = shutdown.clone();
        let fps = config.fps;
        task::spawn_named("pixie-render", RENDER_STACK_KB, move || {
            lifecycle.run_loop(fps, &shutdown)
        })
        .context("spawning render thread")?
    };
    render
        .join()
        .map_err(|_| anyhow!("render thread panicked"))?
        .context("render loop")?;

    lifecycle.lock().stop_active();
    runtime.shutdown_timeout(Duration::from_secs(1));
    info!("Pixie stopped");
    Ok(())
}

/// Real panel, or the in-memory buffer plus its viewer feed.
fn open_display(
    config: &PixieConfig,
    emulator: bool,
) -> Result<(Box<dyn DisplayPort>, Option<FrameFeed>)> {
    if emulator {
        let display = FrameBufferDisplay::new(config.width, config.height);
        let feed = display.feed();
        info!("Display: emulator {}x{}", config.width, config.height);
        return Ok((Box::new(display), Some(feed)));
    }
    let panel = PanelDisplay::open(&config.panel_device, config.width, config.height)
        .context("opening panel")?;
    Ok((Box::new(panel), None))
}

/// Block until the device has a network.  Hands the display back afterwards.
fn provision(
    config: &PixieConfig,
    mut display: Box<dyn DisplayPort>,
    runtime: &Runtime,
    events: &Arc<dyn EventSink>,
) -> Result<Box<dyn DisplayPort>> {
    let runner = Arc::new(SystemCommandRunner::new());
    let provisioning = Arc::new(ProvisioningManager::new(config, runner, Arc::clone(events)));

    if provisioning.is_connected() {
        info!("Boot: network already configured");
        return Ok(display);
    }

    info!("Boot: no network, starting setup");
    if let Err(e) = provisioning.start_access_point() {
        show_fatal(display.as_mut());
        return Err(e).context("starting setup hotspot");
    }

    let mut setup = LifecycleManager::new(display, Arc::clone(events))
        .with_error_threshold(config.frame_error_threshold);
    let app = SetupApp::for_hotspot(provisioning.ap_ssid(), &provisioning.wifi_qr_payload());
    if let Err(e) = setup
        .register("setup", Box::new(app))
        .and_then(|()| setup.switch_to("setup"))
    {
        provisioning.stop_access_point();
        abandon(setup);
        return Err(e).context("starting setup screen");
    }
    let setup = SharedLifecycle::new(setup);

    let setup_done = Shutdown::new();
    let render = {
        let setup = setup.clone();
        let done = setup_done.clone();
        let fps = config.setup_fps;
        task::spawn_named("pixie-setup", RENDER_STACK_KB, move || setup.run_loop(fps, &done))
    };
    let render = match render {
        Ok(handle) => handle,
        Err(e) => {
            provisioning.stop_access_point();
            return Err(e).context("spawning setup render thread");
        }
    };

    let session = PortalSession::new(Arc::clone(&provisioning), config.connect_signal_delay());
    let outcome = session.run_until_connected(runtime.handle(), config.portal_port);

    setup_done.request();
    if render.join().is_err() {
        warn!("Boot: setup render thread panicked");
    }
    provisioning.stop_access_point();

    let address = outcome?;
    info!("Boot: online at {}", address);

    let setup = setup
        .try_into_inner()
        .map_err(|_| anyhow!("setup lifecycle still in use"))?;
    Ok(setup.into_display())
}

/// Register the steady-state apps and switch to the initial one.
fn start_apps(
    manager: &mut LifecycleManager,
    requested: Option<&str>,
    default: &str,
) -> Result<(), LifecycleError> {
    manager.register("clock", Box::new(ClockApp::new()))?;
    manager.register("weather", Box::new(WeatherApp::new()))?;
    let initial = initial_app(requested, default, &manager.available_apps());
    manager.switch_to(&initial)
}

/// Give up on `manager`, leaving the fatal frame on its display.
fn abandon(manager: LifecycleManager) {
    let mut display = manager.into_display();
    show_fatal(display.as_mut());
}

/// `--app` if registered, else the configured default, else the first app.
fn initial_app(requested: Option<&str>, default: &str, available: &[String]) -> String {
    let registered = |name: &str| available.iter().any(|a| a == name);
    match requested {
        Some(name) if registered(name) => return name.to_string(),
        Some(name) => warn!("Boot: unknown app '{}', using default", name),
        None => {}
    }
    if registered(default) {
        return default.to_string();
    }
    available.first().cloned().unwrap_or_else(|| default.to_string())
}

fn show_fatal(display: &mut dyn DisplayPort) {
    diagnostics::draw_fatal_frame(display);
    if let Err(e) = display.refresh() {
        warn!("Display: could not show fatal frame: {}", e);
    }
}
