use rtlagc_ctl::{ControlState, SharedStepper};

use crate::exit::ExitFlag;
use crate::wake::WakeSignal;

/// The per-block callback handed to the capture side.
/// INVARIANT: no blocking, no sleeping, no tuner I/O.
pub struct SampleProcessor {
    state: ControlState,
    wake: WakeSignal,
    exit: ExitFlag,
    windows: u64,
}

impl SampleProcessor {
    pub fn new(state: ControlState, wake: WakeSignal, exit: ExitFlag) -> Self {
        Self { state, wake, exit, windows: 0 }
    }

    pub fn process_block(&mut self, block: &[u8]) {
        if self.exit.is_raised() {
            return;
        }
        let wake = &self.wake;
        self.windows += self.state.process_block(block, |_| wake.set()) as u64;
    }

    /// Windows closed since start.
    pub fn windows(&self) -> u64 { self.windows }

    pub fn stepper(&self) -> SharedStepper { self.state.stepper() }
}
