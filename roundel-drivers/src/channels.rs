//! Poller to main-loop queues
//!
//! Each polling thread owns the sending side of one bounded queue; the main
//! loop drains it once per iteration. Producers never block: a full queue
//! drops the sample with a warning.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use roundel_core::input::{ButtonSample, TouchSample};

/// Capacity of each input queue
pub const QUEUE_DEPTH: usize = 16;

/// Touch samples from the touch poller
pub type TouchQueue = Channel<CriticalSectionRawMutex, TouchSample, QUEUE_DEPTH>;

/// Button samples from the button poller
pub type ButtonQueue = Channel<CriticalSectionRawMutex, ButtonSample, QUEUE_DEPTH>;

/// New shared touch queue
pub fn touch_queue() -> Arc<TouchQueue> {
    Arc::new(Channel::new())
}

/// New shared button queue
pub fn button_queue() -> Arc<ButtonQueue> {
    Arc::new(Channel::new())
}

/// Send without blocking, dropping the item if the queue is full
pub fn offer<T, const N: usize>(queue: &Channel<CriticalSectionRawMutex, T, N>, item: T, what: &str) -> bool {
    if queue.try_send(item).is_err() {
        warn!("{} queue full, dropping event", what);
        return false;
    }
    true
}

/// Take everything currently queued, in arrival order
pub fn drain<T, const N: usize>(queue: &Channel<CriticalSectionRawMutex, T, N>) -> impl Iterator<Item = T> + '_ {
    core::iter::from_fn(move || queue.try_receive().ok())
}
