use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use log::{debug, info, warn};

use rtlagc_ctl::{GainTable, SharedStepper};
use rtlagc_hal::TunerGain;

use crate::exit::ExitFlag;
use crate::wake::WakeSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState { Waiting, Applying, Stopped }

/// Off-path gain writer. Owns the tuner once the loop is running.
pub struct Actuator {
    stepper: SharedStepper,
    gains: Arc<GainTable>,
    tuner: Box<dyn TunerGain>,
    wake: WakeSignal,
    exit: ExitFlag,
    timeout: Duration,
    state: ActuatorState,
}

impl Actuator {
    pub fn new(
        stepper: SharedStepper,
        gains: Arc<GainTable>,
        tuner: Box<dyn TunerGain>,
        wake: WakeSignal,
        exit: ExitFlag,
        timeout: Duration,
    ) -> Self {
        Self { stepper, gains, tuner, wake, exit, timeout, state: ActuatorState::Waiting }
    }

    pub fn state(&self) -> ActuatorState { self.state }

    /// One state-machine transition.
    pub fn tick(&mut self) -> ActuatorState {
        let current = self.state;
        self.state = match current {
            _ if self.exit.is_raised() => ActuatorState::Stopped,
            ActuatorState::Waiting => {
                if self.wake.wait_timeout(self.timeout) {
                    ActuatorState::Applying
                } else {
                    ActuatorState::Waiting
                }
            }
            ActuatorState::Applying => {
                self.apply_pending();
                ActuatorState::Waiting
            }
            ActuatorState::Stopped => ActuatorState::Stopped,
        };
        self.state
    }

    pub fn run(mut self) {
        info!(">>> [AGC] gain actuator started");
        while self.tick() != ActuatorState::Stopped {}
        info!(">>> [AGC] gain actuator stopped");
    }

    /// Step the integrator and write the gain if the index moved.
    /// The new index is committed before the write; a failed write is not replayed.
    /// Returns: the gain value written (or attempted).
    pub fn apply_pending(&mut self) -> Option<i32> {
        let (previous, next) = {
            let mut s = self.stepper.lock();
            let previous = s.gain_index();
            let next = s.step();
            s.set_gain_index(next);
            (previous, next)
        };
        if next == previous {
            return None;
        }

        let value = self.gains.value(next)?;
        debug!(
            "gain_index:{}=>{} (gains:{:?}=>{})",
            previous, next, self.gains.value(previous), value
        );
        if let Err(e) = self.tuner.apply_gain(value) {
            warn!("Failed to set tuner gain {:.1} dB: {}", value as f32 / 10.0, e);
        }
        Some(value)
    }

    pub fn spawn(self) -> anyhow::Result<ActuatorHandle> {
        let join = thread::Builder::new()
            .name("agc-actuator".into())
            .spawn(move || self.run())
            .context("spawning gain actuator thread")?;
        Ok(ActuatorHandle { join })
    }
}

pub struct ActuatorHandle {
    join: JoinHandle<()>,
}

impl ActuatorHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Returns within one wake timeout of the exit flag being raised.
    pub fn join(self) -> anyhow::Result<()> {
        self.join.join().map_err(|_| anyhow::anyhow!("gain actuator thread panicked"))
    }
}
