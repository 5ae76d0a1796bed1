pub mod wake;
pub mod exit;
pub mod actuator;
pub mod processor;
pub mod setup;
pub mod capture;
pub mod sim;

pub use wake::WakeSignal;
pub use exit::ExitFlag;
pub use actuator::{Actuator, ActuatorHandle, ActuatorState};
pub use processor::SampleProcessor;
pub use setup::{GainControl, AgcRuntime, configure_gain, start_agc};
pub use capture::{CaptureDriver, CaptureStats};
pub use sim::{SimFrontEnd, SimTuner, SimSource};
