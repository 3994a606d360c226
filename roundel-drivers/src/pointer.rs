//! Latest pointer state, shared between the touch thread and readers

use std::sync::{Mutex, MutexGuard};

use log::warn;

use roundel_core::input::PointerState;

/// Last [`PointerState`] published by the touch poller
#[derive(Debug, Default)]
pub struct SharedPointer(Mutex<PointerState>);

impl SharedPointer {
    pub fn store(&self, state: PointerState) {
        *self.lock() = state;
    }

    pub fn load(&self) -> PointerState {
        *self.lock()
    }

    /// Lock, logging and clearing poison left by a panicked holder
    fn lock(&self) -> MutexGuard<'_, PointerState> {
        self.0.lock().unwrap_or_else(|poisoned| {
            warn!("pointer state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
