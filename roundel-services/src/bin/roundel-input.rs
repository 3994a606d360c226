//! Input service daemon

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;

use roundel_bus::ServiceBus;
use roundel_drivers::channels::{button_queue, touch_queue};
use roundel_drivers::{ButtonChannel, MonotonicClock, Poller, SharedPointer, TouchChannel};
use roundel_hal_linux::{open_i2c, EvdevKeySource};
use roundel_services::input::{INPUT_PATH, INPUT_SERVICE};
use roundel_services::runloop::shutdown_flag;
use roundel_services::{InputConfig, InputService, ServiceLoop};

#[derive(Debug, Parser)]
#[command(name = "roundel-input", version, about = "Roundel touch and button event service")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "/etc/roundel/input.toml")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("roundel-input {}", env!("CARGO_PKG_VERSION"));
    let config = InputConfig::load(&args.config)?;
    let clock = MonotonicClock::new();

    let i2c = open_i2c(&config.touch.bus).context("opening touch controller")?;
    let touch = TouchChannel::new(i2c, config.touch.address);
    let keys = EvdevKeySource::find(&config.button.device_names, config.button.key_code)
        .context("locating button device")?;
    let button = ButtonChannel::new(keys, config.button.timing);

    let touch_events = touch_queue();
    let button_events = button_queue();

    let mut bus = ServiceBus::init(INPUT_SERVICE, INPUT_PATH).context("claiming bus name")?;
    InputService::register(&mut bus)?;

    let mut touch_poller = Poller::spawn_touch(
        touch,
        clock,
        touch_events.clone(),
        Arc::new(SharedPointer::default()),
        config.touch.poll_interval(),
    )?;
    let mut button_poller = Poller::spawn_button(button, clock, button_events.clone())?;

    let shutdown = shutdown_flag().context("installing signal handlers")?;
    ServiceLoop::new(bus, InputService::new(touch_events, button_events)).run(&shutdown);

    touch_poller.stop();
    button_poller.stop();
    Ok(())
}
