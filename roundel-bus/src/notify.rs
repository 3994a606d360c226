//! Process supervisor notifications

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, info};
use sd_notify::NotifyState;

/// Readiness and liveness reporting to a process supervisor
pub trait Notifier {
    /// Startup finished
    fn ready(&self);

    /// Still alive; must be called more often than the supervisor's
    /// watchdog interval
    fn watchdog(&self);
}

/// systemd `sd_notify`; silently inert when not started by systemd
#[derive(Debug, Default, Clone, Copy)]
pub struct SdNotifier;

impl Notifier for SdNotifier {
    fn ready(&self) {
        match sd_notify::notify(false, &[NotifyState::Ready]) {
            Ok(()) => info!("Notified supervisor: READY"),
            Err(e) => debug!("sd_notify READY failed: {}", e),
        }
    }

    fn watchdog(&self) {
        if let Err(e) = sd_notify::notify(false, &[NotifyState::Watchdog]) {
            debug!("sd_notify WATCHDOG failed: {}", e);
        }
    }
}

/// Counts notifications
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    ready: Arc<AtomicU32>,
    watchdog: Arc<AtomicU32>,
}

impl RecordingNotifier {
    pub fn ready_count(&self) -> u32 {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn watchdog_count(&self) -> u32 {
        self.watchdog.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    fn ready(&self) {
        self.ready.fetch_add(1, Ordering::SeqCst);
    }

    fn watchdog(&self) {
        self.watchdog.fetch_add(1, Ordering::SeqCst);
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn ready(&self) {
        (**self).ready()
    }

    fn watchdog(&self) {
        (**self).watchdog()
    }
}
