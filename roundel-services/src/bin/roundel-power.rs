//! Power service daemon

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use roundel_bus::ServiceBus;
use roundel_drivers::{FrameBufferDisplay, MonotonicClock};
use roundel_hal_linux::backlight::BACKLIGHT_CLASS_DIR;
use roundel_hal_linux::{DrmScanout, SysfsBacklight};
use roundel_services::power::{POWER_PATH, POWER_SERVICE};
use roundel_services::runloop::shutdown_flag;
use roundel_services::{PowerConfig, PowerService, ServiceLoop, SystemPowerActions};

#[derive(Debug, Parser)]
#[command(name = "roundel-power", version, about = "Roundel power management service")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "/etc/roundel/power.toml")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("roundel-power {}", env!("CARGO_PKG_VERSION"));
    let config = PowerConfig::load(&args.config)?;

    let scanout = DrmScanout::open(&config.display_device)
        .with_context(|| format!("opening display {}", config.display_device.display()))?;
    let backlight = match &config.backlight {
        Some(dir) => SysfsBacklight::open(dir)
            .map_err(|e| warn!("Backlight {} unavailable: {}", dir.display(), e))
            .ok(),
        None => SysfsBacklight::first_available(BACKLIGHT_CLASS_DIR),
    };
    let display = FrameBufferDisplay::open(scanout, backlight).context("initializing display")?;

    let actions = SystemPowerActions::new(display, &config);
    let service = PowerService::new(&config, actions, Box::new(MonotonicClock::new()));

    let mut bus = ServiceBus::init(POWER_SERVICE, POWER_PATH).context("claiming bus name")?;
    PowerService::register(&mut bus)?;

    let shutdown = shutdown_flag().context("installing signal handlers")?;
    ServiceLoop::new(bus, service).run(&shutdown);
    Ok(())
}
