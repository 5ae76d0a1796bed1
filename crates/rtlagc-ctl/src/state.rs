use std::sync::Arc;

use log::debug;
use spin::Mutex;

use rtlagc_core::{AgcConfig, AgcResult};

use crate::gains::GainTable;
use crate::power::PowerTable;
use crate::step::StepController;
use crate::window::WindowPeakTracker;

/// The integrator handle shared by the sample thread and the actuator.
/// Spin lock: the sample thread must never park, and every critical section
/// is a few integer ops.
pub type SharedStepper = Arc<Mutex<StepController>>;

/// One closed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowReport {
    pub target: i32,
    pub peak: i32,
    /// target - peak. Positive means the signal is too quiet.
    pub error: i32,
}

/// Sample-side half of the control loop.
pub struct ControlState {
    target_level: i32,
    table: Arc<PowerTable>,
    window: WindowPeakTracker,
    stepper: SharedStepper,
}

impl ControlState {
    pub fn new(config: &AgcConfig, gains: &GainTable, table: Arc<PowerTable>) -> AgcResult<Self> {
        config.validate()?;
        gains.ensure_controllable()?;

        let window_length = config.window_length()?;
        let stepper = StepController::new(
            config.step_threshold,
            gains.initial_index(),
            gains.min_index(),
            gains.max_index(),
        );

        Ok(Self {
            target_level: config.target_level,
            table,
            window: WindowPeakTracker::new(window_length),
            stepper: Arc::new(Mutex::new(stepper)),
        })
    }

    pub fn stepper(&self) -> SharedStepper {
        self.stepper.clone()
    }

    pub fn window(&self) -> &WindowPeakTracker { &self.window }

    /// Feed one power level. On window closure the error goes into the integrator
    /// before `on_close` sees the report.
    #[inline]
    pub fn observe<F: FnMut(WindowReport)>(&mut self, level: i32, on_close: &mut F) {
        if let Some(peak) = self.window.push(level) {
            let error = self.target_level.saturating_sub(peak);
            self.stepper.lock().accumulate(error);
            debug!("window closed: target={} peak={} delta={}", self.target_level, peak, error);
            on_close(WindowReport { target: self.target_level, peak, error });
        }
    }

    /// Walk a block of interleaved I/Q bytes. A trailing odd byte is ignored.
    /// Returns: windows closed inside this block.
    pub fn process_block<F: FnMut(WindowReport)>(&mut self, block: &[u8], mut on_close: F) -> usize {
        let mut closed = 0;
        let mut hook = |r: WindowReport| {
            closed += 1;
            on_close(r);
        };
        for pair in block.chunks_exact(2) {
            let level = self.table.level(pair[0], pair[1]);
            self.observe(level, &mut hook);
        }
        closed
    }
}
