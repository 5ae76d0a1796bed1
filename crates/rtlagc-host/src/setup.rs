use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use log::{info, warn};

use rtlagc_core::{AgcConfig, AgcError, GainMode};
use rtlagc_ctl::{ControlState, GainTable, PowerTable};
use rtlagc_hal::TunerGain;

use crate::actuator::{Actuator, ActuatorHandle};
use crate::exit::ExitFlag;
use crate::processor::SampleProcessor;
use crate::wake::WakeSignal;

/// A running closed loop: the sample-side callback plus its actuator thread.
pub struct AgcRuntime {
    pub processor: SampleProcessor,
    actuator: ActuatorHandle,
}

impl AgcRuntime {
    pub fn actuator_finished(&self) -> bool {
        self.actuator.is_finished()
    }

    /// Raises `exit` and waits for the actuator to leave its wait loop.
    pub fn shutdown(self, exit: &ExitFlag) -> anyhow::Result<()> {
        exit.raise();
        self.actuator.join()
    }
}

/// What `configure_gain` left the tuner doing.
pub enum GainControl {
    Auto,
    Manual(i32),
    Agc(AgcRuntime),
}

impl GainControl {
    /// Per-block hook. Only the closed loop looks at samples.
    pub fn process_block(&mut self, block: &[u8]) {
        if let GainControl::Agc(rt) = self {
            rt.processor.process_block(block);
        }
    }

    pub fn shutdown(self, exit: &ExitFlag) -> anyhow::Result<()> {
        match self {
            GainControl::Agc(rt) => rt.shutdown(exit),
            _ => Ok(()),
        }
    }
}

/// Put the tuner into `mode`. The loop and its thread exist only for `GainMode::Agc`.
pub fn configure_gain(
    mode: GainMode,
    mut tuner: Box<dyn TunerGain>,
    config: AgcConfig,
    exit: &ExitFlag,
) -> anyhow::Result<GainControl> {
    match mode {
        GainMode::Auto => {
            tuner.enable_auto_gain().context("enabling tuner auto gain")?;
            info!("Tuner gain set to automatic.");
            Ok(GainControl::Auto)
        }
        GainMode::Manual(requested) => {
            let gains = GainTable::new(tuner.read_gain_table()?)?;
            let gain = gains.nearest(requested);
            tuner.apply_gain(gain).context("setting manual tuner gain")?;
            info!("Tuner gain set to {:.1} dB.", gain as f32 / 10.0);
            Ok(GainControl::Manual(gain))
        }
        GainMode::Agc { target } => {
            let config = AgcConfig { target_level: target, ..config };
            start_agc(config, tuner, exit).map(GainControl::Agc)
        }
    }
}

/// Read the gain table, program the starting gain and start the actuator.
/// Any configuration error returns before a thread is spawned.
pub fn start_agc(
    config: AgcConfig,
    mut tuner: Box<dyn TunerGain>,
    exit: &ExitFlag,
) -> anyhow::Result<AgcRuntime> {
    if config.target_level >= 0 {
        bail!(AgcError::NotAgcMode);
    }

    let gains = GainTable::new(tuner.read_gain_table()?).context("reading tuner gain table")?;
    info!("Supported gain values ({}): {}", gains.len(), gains);

    let state = ControlState::new(&config, &gains, Arc::new(PowerTable::new()))
        .context("building AGC control state")?;
    let stepper = state.stepper();

    let start = stepper.lock().gain_index();
    if let Some(gain) = gains.value(start) {
        match tuner.apply_gain(gain) {
            Ok(()) => info!("Tuner gain set to {:.1} dB.", gain as f32 / 10.0),
            Err(e) => warn!("Failed to set initial tuner gain: {}", e),
        }
    }
    info!(
        ">>> [AGC] target {:.1} dBFS, window {} samples, step threshold {}",
        config.target_level as f32 / 10.0,
        state.window().length(),
        config.step_threshold
    );

    let wake = WakeSignal::new();
    let actuator = Actuator::new(
        stepper,
        Arc::new(gains),
        tuner,
        wake.clone(),
        exit.clone(),
        Duration::from_millis(config.wake_timeout_ms),
    )
    .spawn()?;

    Ok(AgcRuntime {
        processor: SampleProcessor::new(state, wake, exit.clone()),
        actuator,
    })
}
