//! Background polling threads
//!
//! A [`Poller`] owns one driver on its own thread and pushes samples into a
//! queue. Stopping clears the running flag and joins the thread; the driver
//! (and the descriptor inside it) is dropped on that thread after its last
//! read, never while a read may still be in flight.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use roundel_hal::KeyEventSource;

use crate::button::ButtonChannel;
use crate::channels::{offer, ButtonQueue, TouchQueue};
use crate::clock::Clock;
use crate::pointer::SharedPointer;
use crate::touch::TouchChannel;

/// Handle to a running polling thread
pub struct Poller {
    name: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Run `step` repeatedly on a new thread until stopped
    pub fn spawn<F>(name: &str, mut step: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let thread_name = name.to_string();

        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            info!("{} poller started", thread_name);
            while flag.load(Ordering::Acquire) {
                step();
            }
            debug!("{} poller exiting", thread_name);
        })?;

        Ok(Self {
            name: name.to_string(),
            running,
            handle: Some(handle),
        })
    }

    /// Poll a touch controller every `interval`
    pub fn spawn_touch<I, C>(
        mut channel: TouchChannel<I>,
        clock: C,
        queue: Arc<TouchQueue>,
        pointer: Arc<SharedPointer>,
        interval: Duration,
    ) -> io::Result<Self>
    where
        I: I2c + Send + 'static,
        C: Clock + 'static,
    {
        Self::spawn("touch", move || {
            let poll = channel.poll(clock.now_ms());
            pointer.store(poll.pointer);
            for sample in poll.samples {
                offer(&queue, sample, "touch");
            }
            thread::sleep(interval);
        })
    }

    /// Run a button state machine; each step blocks for at most the key
    /// source's wait timeout
    pub fn spawn_button<K, C>(mut channel: ButtonChannel<K>, clock: C, queue: Arc<ButtonQueue>) -> io::Result<Self>
    where
        K: KeyEventSource + Send + 'static,
        C: Clock + 'static,
    {
        Self::spawn("button", move || {
            for sample in channel.step(&clock) {
                offer(&queue, sample, "button");
            }
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Clear the running flag and wait for the thread to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("{} poller panicked", self.name);
            } else {
                info!("{} poller stopped", self.name);
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Instant;

    use roundel_core::input::{ButtonKind, ButtonTiming, TouchKind};
    use roundel_hal::KeyEdge;

    use crate::channels::{button_queue, drain, touch_queue};
    use crate::clock::{ManualClock, MonotonicClock};
    use crate::touch::tests::ScriptedBus;

    #[test]
    fn test_stop_joins_thread() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let mut p = Poller::spawn("counter", move || {
            c.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
        })
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        p.stop();
        assert!(!p.is_running());
        let after = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(count.load(Ordering::SeqCst), after);
    }

    #[test]
    fn test_touch_samples_reach_queue() {
        let mut bus = ScriptedBus::default();
        bus.touch(140, 140);
        bus.lift();
        let queue = touch_queue();
        let pointer = Arc::new(SharedPointer::default());

        let mut p = Poller::spawn_touch(
            TouchChannel::new(bus, 0x15),
            MonotonicClock::new(),
            queue.clone(),
            pointer.clone(),
            Duration::from_millis(1),
        )
        .unwrap();

        let mut got = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while got.len() < 2 && Instant::now() < deadline {
            got.extend(drain(&queue).map(|s| s.kind));
            thread::sleep(Duration::from_millis(1));
        }
        p.stop();

        assert_eq!(got, vec![TouchKind::Press, TouchKind::Tap]);
        assert!(!pointer.load().pressed);
    }

    #[test]
    fn test_button_samples_reach_queue() {
        let clock = ManualClock::new(0);
        let keys = crate::button::tests::ScriptedKeys {
            clock: clock.clone(),
            script: [(Some(KeyEdge::Pressed), 0), (Some(KeyEdge::Released), 600)]
                .into_iter()
                .collect(),
        };
        let queue = button_queue();
        let mut p = Poller::spawn_button(ButtonChannel::new(keys, ButtonTiming::default()), clock, queue.clone())
            .unwrap();

        let mut got = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while got.len() < 2 && Instant::now() < deadline {
            got.extend(drain(&queue).map(|s| s.kind));
            thread::sleep(Duration::from_millis(1));
        }
        p.stop();

        assert_eq!(got, vec![ButtonKind::LongPress, ButtonKind::Release]);
    }
}
