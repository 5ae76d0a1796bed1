#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;
use alloc::vec::Vec;

use rtlagc_core::{AgcError, AgcResult};

/// The Tuner Gain Stage.
/// Writes may be slow (USB control transfers); never call from the sample path.
pub trait TunerGain: Send {
    /// Supported gain steps in tenths of dB, ascending.
    fn read_gain_table(&mut self) -> AgcResult<Vec<i32>>;

    /// Switch to manual gain and program `tenths_db`.
    /// Failures are reported here and are not fatal to the caller.
    fn apply_gain(&mut self, tenths_db: i32) -> AgcResult<()>;

    /// Hand gain control back to the tuner.
    fn enable_auto_gain(&mut self) -> AgcResult<()>;
}

/// The Capture Side.
/// INVARIANT: Must be Non-Blocking.
pub trait SampleSource: Send {
    /// Fill `buf` with interleaved I/Q bytes.
    /// Returns: bytes written. `Ok(0)` marks end of stream.
    fn read_block(&mut self, buf: &mut [u8]) -> nb::Result<usize, AgcError>;

    // Default: nothing to tear down.
    fn cancel(&mut self) {}
}
