//! Shell entry point

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};

use roundel_bus::SdNotifier;
use roundel_drivers::channels::{button_queue, touch_queue};
use roundel_drivers::{ButtonChannel, FrameBufferDisplay, MonotonicClock, Poller, SharedPointer, TouchChannel};
use roundel_hal_linux::backlight::BACKLIGHT_CLASS_DIR;
use roundel_hal_linux::{open_i2c, DrmScanout, EvdevKeySource, SysfsBacklight};
use roundel_shell::{
    scan_apps, AppLifecycleManager, AppRegistry, CanvasToolkit, DirectoryStore, LoopTiming, ShellConfig,
    ShellCoordinator, ShellRuntime,
};

#[derive(Debug, Parser)]
#[command(name = "roundel-shell", version, about = "Round-display wearable shell")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "/etc/roundel/shell.toml")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("roundel-shell {}", env!("CARGO_PKG_VERSION"));
    let config = ShellConfig::load(&args.config)?;
    let clock = MonotonicClock::new();

    // Display
    let scanout = DrmScanout::open(&config.display_device)
        .with_context(|| format!("opening display {}", config.display_device.display()))?;
    let backlight = match &config.backlight {
        Some(dir) => SysfsBacklight::open(dir)
            .map_err(|e| warn!("Backlight {} unavailable: {}", dir.display(), e))
            .ok(),
        None => SysfsBacklight::first_available(BACKLIGHT_CLASS_DIR),
    };
    let display = FrameBufferDisplay::open(scanout, backlight).context("initializing display")?;

    // Input
    let i2c = open_i2c(&config.touch.bus).context("opening touch controller")?;
    let touch = TouchChannel::new(i2c, config.touch.address);
    let keys = EvdevKeySource::find(&config.button.device_names, config.button.key_code)
        .context("locating button device")?;
    let button = ButtonChannel::new(keys, config.button.timing);

    // Apps
    let registry = AppRegistry::new();
    let catalog = scan_apps(&config.apps_dir);
    let store = DirectoryStore::from_scan(&config.apps_dir, &catalog);
    let apps = AppLifecycleManager::new(registry, store, &config.interpreter);
    let coordinator = ShellCoordinator::new(CanvasToolkit::new(display), apps, catalog);

    let touch_events = touch_queue();
    let button_events = button_queue();
    let mut touch_poller = Poller::spawn_touch(
        touch,
        clock,
        touch_events.clone(),
        Arc::new(SharedPointer::default()),
        config.touch.poll_interval(),
    )?;
    let mut button_poller = Poller::spawn_button(button, clock, button_events.clone())?;

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, shutdown.clone()).context("installing SIGINT handler")?;
    signal_hook::flag::register(SIGTERM, shutdown.clone()).context("installing SIGTERM handler")?;

    let mut runtime = ShellRuntime::new(
        coordinator,
        touch_events,
        button_events,
        clock,
        SdNotifier,
        LoopTiming::from(&config),
    );
    runtime.run(&shutdown);

    touch_poller.stop();
    button_poller.stop();
    Ok(())
}
