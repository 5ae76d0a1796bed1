#![forbid(unsafe_code)]

mod power;
mod gains;
mod window;
mod step;
mod state;

pub use power::{PowerTable, estimate_level};
pub use gains::GainTable;
pub use window::WindowPeakTracker;
pub use step::StepController;
pub use state::{ControlState, SharedStepper, WindowReport};
