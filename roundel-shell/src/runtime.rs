//! Shell main loop
//!
//! One iteration, strictly in this order:
//!
//! 1. drain the touch and button queues into the coordinator
//! 2. coordinator tick (app reaping and updates)
//! 3. clock refresh, at most once per refresh interval
//! 4. toolkit timers and flush
//! 5. watchdog ping every N iterations
//!
//! then sleep for the toolkit's requested delay, capped at the ceiling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{info, trace};

use roundel_bus::Notifier;
use roundel_core::elapsed_ms;
use roundel_drivers::channels::drain;
use roundel_drivers::{ButtonQueue, Clock, TouchQueue};

use crate::config::ShellConfig;
use crate::coordinator::ShellCoordinator;
use crate::manifest::ManifestStore;
use crate::toolkit::Toolkit;

/// Loop timing knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    pub ceiling: Duration,
    pub clock_refresh_ms: u32,
    pub watchdog_every: u64,
}

impl From<&ShellConfig> for LoopTiming {
    fn from(config: &ShellConfig) -> Self {
        Self {
            ceiling: config.loop_ceiling(),
            clock_refresh_ms: config.clock_refresh_ms,
            watchdog_every: config.watchdog_every.max(1),
        }
    }
}

pub struct ShellRuntime<T, S, C, N> {
    coordinator: ShellCoordinator<T, S>,
    touch: Arc<TouchQueue>,
    button: Arc<ButtonQueue>,
    clock: C,
    notifier: N,
    timing: LoopTiming,
    last_tick_ms: u32,
    last_clock_ms: u32,
    iterations: u64,
}

impl<T: Toolkit, S: ManifestStore, C: Clock, N: Notifier> ShellRuntime<T, S, C, N> {
    pub fn new(
        coordinator: ShellCoordinator<T, S>,
        touch: Arc<TouchQueue>,
        button: Arc<ButtonQueue>,
        clock: C,
        notifier: N,
        timing: LoopTiming,
    ) -> Self {
        let now = clock.now_ms();
        Self {
            coordinator,
            touch,
            button,
            clock,
            notifier,
            timing,
            last_tick_ms: now,
            last_clock_ms: now,
            iterations: 0,
        }
    }

    pub fn coordinator(&self) -> &ShellCoordinator<T, S> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut ShellCoordinator<T, S> {
        &mut self.coordinator
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// One iteration; returns how long to sleep before the next
    pub fn step(&mut self) -> Duration {
        for sample in drain(&self.touch) {
            trace!("touch {:?}", sample);
            self.coordinator.handle_touch(&sample);
        }
        for sample in drain(&self.button) {
            trace!("button {:?}", sample);
            self.coordinator.handle_button(&sample);
        }

        let now = self.clock.now_ms();
        let delta = elapsed_ms(now, self.last_tick_ms);
        self.last_tick_ms = now;
        self.coordinator.tick(delta);

        if elapsed_ms(now, self.last_clock_ms) >= self.timing.clock_refresh_ms {
            self.last_clock_ms = now;
            self.coordinator.refresh_clock();
        }

        let requested = self.coordinator.toolkit_mut().timer_handler();

        self.iterations += 1;
        if self.iterations % self.timing.watchdog_every == 0 {
            self.notifier.watchdog();
        }

        requested.min(self.timing.ceiling)
    }

    /// Announce readiness, loop until `shutdown` is set, then stop all apps
    pub fn run(&mut self, shutdown: &AtomicBool) {
        self.notifier.ready();
        info!("Shell running");

        while !shutdown.load(Ordering::Relaxed) {
            let delay = self.step();
            thread::sleep(delay);
        }

        info!("Shell stopping");
        self.coordinator.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundel_bus::RecordingNotifier;
    use roundel_core::input::{ButtonKind, ButtonSample, TouchKind, TouchSample};
    use roundel_core::state::NavState;
    use roundel_drivers::channels::{button_queue, offer, touch_queue};
    use roundel_drivers::ManualClock;

    use crate::app::manager::tests::registry;
    use crate::app::AppLifecycleManager;
    use crate::manifest::MemoryStore;
    use crate::toolkit::fake::FakeToolkit;

    type Runtime = ShellRuntime<FakeToolkit, MemoryStore, ManualClock, RecordingNotifier>;

    fn runtime() -> (Runtime, Arc<TouchQueue>, Arc<ButtonQueue>, ManualClock, RecordingNotifier) {
        let apps = AppLifecycleManager::new(registry(), MemoryStore::default(), "/bin/false");
        let coordinator = ShellCoordinator::new(FakeToolkit::default(), apps, Vec::new());
        let touch = touch_queue();
        let button = button_queue();
        let clock = ManualClock::new(0);
        let notifier = RecordingNotifier::default();
        let rt = ShellRuntime::new(
            coordinator,
            touch.clone(),
            button.clone(),
            clock.clone(),
            notifier.clone(),
            LoopTiming::from(&ShellConfig::default()),
        );
        (rt, touch, button, clock, notifier)
    }

    #[test]
    fn test_queued_input_reaches_coordinator() {
        let (mut rt, touch, button, _clock, _n) = runtime();
        offer(
            &touch,
            TouchSample { x: 120, y: 200, kind: TouchKind::SwipeUp, timestamp_ms: 5 },
            "touch",
        );
        rt.step();
        assert_eq!(rt.coordinator().state(), NavState::Launcher);

        offer(
            &button,
            ButtonSample { kind: ButtonKind::DoublePress, timestamp_ms: 9, duration_ms: 60 },
            "button",
        );
        rt.step();
        assert_eq!(rt.coordinator().state(), NavState::Home);
    }

    #[test]
    fn test_sleep_capped_at_ceiling() {
        let (mut rt, ..) = runtime();
        // The fake toolkit asks for 250 ms
        assert_eq!(rt.step(), Duration::from_millis(100));
        assert_eq!(rt.coordinator().toolkit().timer_runs, 1);
    }

    #[test]
    fn test_clock_refresh_interval() {
        let (mut rt, _t, _b, clock, _n) = runtime();
        let base = rt.coordinator().toolkit().clock_refreshes;

        clock.set(999);
        rt.step();
        assert_eq!(rt.coordinator().toolkit().clock_refreshes, base);

        clock.set(1_000);
        rt.step();
        assert_eq!(rt.coordinator().toolkit().clock_refreshes, base + 1);
    }

    #[test]
    fn test_ready_and_watchdog() {
        let (mut rt, _t, _b, _c, notifier) = runtime();
        for _ in 0..250 {
            rt.step();
        }
        assert_eq!(notifier.watchdog_count(), 2);

        let stop = AtomicBool::new(true);
        rt.run(&stop);
        assert_eq!(notifier.ready_count(), 1);
        assert_eq!(rt.iterations(), 250);
    }
}
