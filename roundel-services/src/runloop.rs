//! The shared service loop
//!
//! ```text
//!  notify_ready
//!       │
//!       ▼
//!  ┌─► bus.process(service) ──► service.tick() ──► publish signals
//!  │                                                    │
//!  │         every 100th iteration: watchdog ◄──────────┘
//!  │                     │
//!  └──── sleep 100 ms ◄──┘          (until SIGINT / SIGTERM)
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};

use roundel_bus::{Notifier, ServiceBus, Transport};

/// Sleep between iterations
pub const LOOP_INTERVAL: Duration = Duration::from_millis(100);

/// Iterations between watchdog pings (about 10 s)
pub const WATCHDOG_EVERY: u64 = 100;

/// A signal a service wants published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub interface: &'static str,
    pub name: &'static str,
    pub payload: Option<String>,
}

/// Service state driven by [`ServiceLoop`]
pub trait Service {
    fn name(&self) -> &'static str;

    /// Periodic work after the bus has been pumped
    fn tick(&mut self);

    /// Signals queued since the last call, oldest first
    fn take_outbound(&mut self) -> Vec<Outbound>;
}

/// A service plus its bus presence
pub struct ServiceLoop<S, T, N> {
    bus: ServiceBus<S, T, N>,
    service: S,
    iterations: u64,
}

impl<S: Service, T: Transport, N: Notifier> ServiceLoop<S, T, N> {
    pub fn new(bus: ServiceBus<S, T, N>, service: S) -> Self {
        Self {
            bus,
            service,
            iterations: 0,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// One iteration without the sleep
    pub fn step(&mut self) {
        let handled = self.bus.process(&mut self.service);
        if handled > 0 {
            debug!("{}: answered {} call(s)", self.service.name(), handled);
        }

        self.service.tick();

        for signal in self.service.take_outbound() {
            if let Err(e) = self
                .bus
                .send_signal(signal.interface, signal.name, signal.payload.as_deref())
            {
                warn!("{}: failed to emit {}: {}", self.service.name(), signal.name, e);
            }
        }

        self.iterations += 1;
        if self.iterations % WATCHDOG_EVERY == 0 {
            self.bus.send_watchdog();
        }
    }

    /// Announce readiness and loop until `shutdown` is set
    pub fn run(&mut self, shutdown: &AtomicBool) {
        self.bus.notify_ready();
        info!("{} service running", self.service.name());

        while !shutdown.load(Ordering::Relaxed) {
            self.step();
            thread::sleep(LOOP_INTERVAL);
        }

        info!("{} service stopping", self.service.name());
    }
}

/// Flag set by SIGINT or SIGTERM
pub fn shutdown_flag() -> io::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, flag.clone())?;
    signal_hook::flag::register(SIGTERM, flag.clone())?;
    Ok(flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundel_bus::{LoopbackTransport, MethodCall, RecordingNotifier, Reply, Value};

    #[derive(Default)]
    struct Ticker {
        ticks: u32,
        pending: Vec<Outbound>,
    }

    impl Service for Ticker {
        fn name(&self) -> &'static str {
            "ticker"
        }

        fn tick(&mut self) {
            self.ticks += 1;
            if self.ticks == 2 {
                self.pending.push(Outbound {
                    interface: "org.roundel.Ticker",
                    name: "Second",
                    payload: Some("2".to_string()),
                });
            }
        }

        fn take_outbound(&mut self) -> Vec<Outbound> {
            std::mem::take(&mut self.pending)
        }
    }

    fn ticks(state: &mut Ticker, _call: &MethodCall) -> Reply {
        Reply::values(vec![Value::U32(state.ticks)])
    }

    #[test]
    fn test_step_dispatches_ticks_and_publishes() {
        let transport = LoopbackTransport::new();
        let client = transport.client();
        let mut bus = ServiceBus::with_transport(
            "org.roundel.Ticker",
            "/org/roundel/Ticker",
            transport,
            RecordingNotifier::default(),
        );
        bus.register_method("org.roundel.Ticker", "Ticks", ticks).unwrap();
        let mut lp = ServiceLoop::new(bus, Ticker::default());

        let t = client.call("org.roundel.Ticker", "Ticks", vec![]);
        lp.step();
        // Calls are answered before the tick runs
        assert_eq!(client.take_reply(t), Some(Reply::values(vec![Value::U32(0)])));
        assert!(client.take_signals().is_empty());

        lp.step();
        let signals = client.take_signals();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].name, "Second");
        assert_eq!(signals[0].path, "/org/roundel/Ticker");
    }

    #[test]
    fn test_watchdog_cadence() {
        let notifier = RecordingNotifier::default();
        let bus: ServiceBus<Ticker, _, _> = ServiceBus::with_transport(
            "org.roundel.Ticker",
            "/org/roundel/Ticker",
            LoopbackTransport::new(),
            notifier.clone(),
        );
        let mut lp = ServiceLoop::new(bus, Ticker::default());

        for _ in 0..99 {
            lp.step();
        }
        assert_eq!(notifier.watchdog_count(), 0);
        lp.step();
        assert_eq!(notifier.watchdog_count(), 1);
        for _ in 0..100 {
            lp.step();
        }
        assert_eq!(notifier.watchdog_count(), 2);
        assert_eq!(lp.iterations(), 200);
    }

    #[test]
    fn test_run_stops_on_flag() {
        let notifier = RecordingNotifier::default();
        let bus: ServiceBus<Ticker, _, _> = ServiceBus::with_transport(
            "org.roundel.Ticker",
            "/org/roundel/Ticker",
            LoopbackTransport::new(),
            notifier.clone(),
        );
        let mut lp = ServiceLoop::new(bus, Ticker::default());

        let stop = AtomicBool::new(true);
        lp.run(&stop);
        assert_eq!(notifier.ready_count(), 1);
        assert_eq!(lp.service().ticks, 0);
    }
}
