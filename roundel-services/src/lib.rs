//! Always-on background services
//!
//! - [`power::PowerService`] - `org.roundel.Power`: power state, screen
//!   idle timeout, CPU governor and shutdown
//! - [`input::InputService`] - `org.roundel.Input`: broadcasts touch and
//!   button events and answers last-event queries
//!
//! Both run the same [`runloop::ServiceLoop`]: pump the bus, do periodic
//! work, publish signals, ping the watchdog, sleep 100 ms.

pub mod config;
pub mod input;
pub mod power;
pub mod runloop;

pub use config::{ConfigError, InputConfig, PowerConfig};
pub use input::InputService;
pub use power::{PowerActions, PowerService, SystemPowerActions};
pub use runloop::{Outbound, Service, ServiceLoop};
