//! Service bus for the Roundel background services
//!
//! A small request/response and signal layer over the system message bus
//! (D-Bus). A service builds a [`ServiceBus`], registers its methods in a
//! plain table before the loop starts, then calls [`ServiceBus::process`]
//! once per loop iteration.
//!
//! # Dispatch
//!
//! ```text
//! bus ──► Transport::try_recv ──► MethodTable lookup (interface, member)
//!                                      │
//!                         ┌────────────┴────────────┐
//!                         ▼                         ▼
//!                  handler(state, call)        no route: dropped,
//!                         │                    caller sees no reply
//!                         ▼
//!                  Transport::reply
//! ```
//!
//! Process supervision (`READY=1`, `WATCHDOG=1`) goes through a
//! [`Notifier`], normally systemd's notify socket.

pub mod dbus;
pub mod error;
pub mod loopback;
pub mod message;
pub mod notify;
pub mod service;
pub mod table;
pub mod transport;

pub use dbus::SystemBusTransport;
pub use error::BusError;
pub use loopback::{LoopbackClient, LoopbackTransport};
pub use message::{MethodCall, Reply, Value};
pub use notify::{Notifier, RecordingNotifier, SdNotifier};
pub use service::ServiceBus;
pub use table::{Handler, MethodTable};
pub use transport::{Signal, Transport};
