#![no_std]
#[cfg(feature = "std")]
extern crate std;

/// Floor for the power estimate, in tenths of dBFS. Stands in for log(0).
pub const DBFS_MIN: i32 = -480;

/// Raw sample value read as zero on the I rail (calibration offset).
pub const I_CENTER: i32 = 158;
/// Raw sample value read as zero on the Q rail.
pub const Q_CENTER: i32 = 128;
/// Squared magnitude of a full-scale single tone (128^2). Reads as 0 dBFS.
pub const FULL_SCALE_MAG: f32 = 16384.0;

pub const DEFAULT_SAMPLE_RATE: u32 = 2_048_000;
/// Peak windows closed per second.
pub const DEFAULT_CONTROL_RATE_HZ: u32 = 5;
/// Accumulated error (tenths of dB) worth one gain step.
pub const DEFAULT_STEP_THRESHOLD: i32 = 300;
pub const DEFAULT_TARGET_LEVEL: i32 = -100;
/// Upper bound on how long the actuator sleeps before re-checking the exit flag.
pub const DEFAULT_WAKE_TIMEOUT_MS: u64 = 1000;

/// Lowest gain index the control loop may select. Index 0 stays out of reach.
pub const MIN_GAIN_INDEX: usize = 1;

// Capture block sizing (bytes)
pub const DEFAULT_BUF_LENGTH: usize = 16 * 16384;
pub const MINIMAL_BUF_LENGTH: usize = 512;
pub const MAXIMAL_BUF_LENGTH: usize = 256 * 16384;

pub type AgcResult<T> = Result<T, AgcError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgcError {
    EmptyGainTable,
    GainTableTooShort,
    InvalidControlRate,
    InvalidSampleRate,
    InvalidThreshold,
    InvalidTarget,
    NotAgcMode,
    HalError,
    SourceClosed,
}

impl core::fmt::Display for AgcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AgcError {}

/// How the tuner gain is driven, decoded from a single signed level in tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainMode {
    /// Tuner runs its own gain control.
    Auto,
    /// Fixed gain, tenths of dB. Snapped to the nearest supported step.
    Manual(i32),
    /// Closed loop toward `target`, tenths of dBFS.
    Agc { target: i32 },
}

impl GainMode {
    pub fn from_tenths(level: i32) -> Self {
        match level {
            0 => GainMode::Auto,
            l if l > 0 => GainMode::Manual(l),
            l => GainMode::Agc { target: l },
        }
    }
}

/// Read once at startup. Never re-read while the loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgcConfig {
    /// Setpoint in tenths of dBFS. Must lie in [DBFS_MIN, 0).
    pub target_level: i32,
    pub sample_rate: u32,
    pub control_rate_hz: u32,
    pub step_threshold: i32,
    pub wake_timeout_ms: u64,
}

impl Default for AgcConfig {
    fn default() -> Self {
        Self {
            target_level: DEFAULT_TARGET_LEVEL,
            sample_rate: DEFAULT_SAMPLE_RATE,
            control_rate_hz: DEFAULT_CONTROL_RATE_HZ,
            step_threshold: DEFAULT_STEP_THRESHOLD,
            wake_timeout_ms: DEFAULT_WAKE_TIMEOUT_MS,
        }
    }
}

impl AgcConfig {
    pub fn with_target(target_level: i32) -> Self {
        Self { target_level, ..Self::default() }
    }

    /// Samples per peak window.
    pub fn window_length(&self) -> AgcResult<u32> {
        if self.control_rate_hz == 0 {
            return Err(AgcError::InvalidControlRate);
        }
        match self.sample_rate / self.control_rate_hz {
            0 => Err(AgcError::InvalidSampleRate),
            n => Ok(n),
        }
    }

    pub fn validate(&self) -> AgcResult<()> {
        if self.target_level >= 0 {
            return Err(AgcError::NotAgcMode);
        }
        // Peaks never read below the floor.
        if self.target_level < DBFS_MIN {
            return Err(AgcError::InvalidTarget);
        }
        if self.step_threshold <= 0 {
            return Err(AgcError::InvalidThreshold);
        }
        self.window_length().map(|_| ())
    }
}
