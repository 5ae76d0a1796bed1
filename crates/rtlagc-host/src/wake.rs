use std::time::Duration;
use crossbeam::channel::{self, Receiver, Sender};

/// Edge-triggered wake-up between the sample thread and the actuator.
/// A single-slot channel: a second `set` before the consumer wakes coalesces.
#[derive(Clone)]
pub struct WakeSignal {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl WakeSignal {
    pub fn new() -> Self {
        let (tx, rx) = channel::bounded(1);
        Self { tx, rx }
    }

    /// Never blocks. Idempotent while a wake is pending.
    #[inline]
    pub fn set(&self) {
        // Full: a wake is already pending.
        let _ = self.tx.try_send(());
    }

    /// Block up to `timeout`. Returns true (and clears the signal) if it was set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.rx.recv_timeout(timeout).is_ok()
    }

    pub fn is_set(&self) -> bool {
        !self.rx.is_empty()
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}
