use std::time::Duration;

use log::{info, warn};

use rtlagc_core::{AgcError, DEFAULT_BUF_LENGTH, MAXIMAL_BUF_LENGTH, MINIMAL_BUF_LENGTH};
use rtlagc_hal::SampleSource;

use crate::exit::ExitFlag;

/// Idle back-off when the source has nothing ready.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub blocks: u64,
    pub bytes: u64,
}

/// Synchronous read loop: pulls blocks from a source and hands each to a callback.
pub struct CaptureDriver {
    buf: Vec<u8>,
    bytes_to_read: u64, // 0 = unlimited
    exit: ExitFlag,
}

impl CaptureDriver {
    /// `block_size` outside [512, 256*16384] falls back to the default.
    /// `samples`: I/Q pairs to read before stopping, 0 for no limit.
    pub fn new(block_size: usize, samples: u64, exit: ExitFlag) -> Self {
        let block_size = if (MINIMAL_BUF_LENGTH..=MAXIMAL_BUF_LENGTH).contains(&block_size) {
            block_size
        } else {
            warn!(
                "Output block size wrong value, falling back to default (min {}, max {})",
                MINIMAL_BUF_LENGTH, MAXIMAL_BUF_LENGTH
            );
            DEFAULT_BUF_LENGTH
        };
        Self { buf: vec![0u8; block_size], bytes_to_read: samples.saturating_mul(2), exit }
    }

    pub fn block_size(&self) -> usize { self.buf.len() }

    /// Runs until the exit flag, end of stream, a source error, or the sample budget.
    /// Raises the exit flag itself once the budget is spent.
    pub fn run<S, F>(&mut self, source: &mut S, mut on_block: F) -> Result<CaptureStats, AgcError>
    where
        S: SampleSource + ?Sized,
        F: FnMut(&[u8]),
    {
        let mut stats = CaptureStats::default();
        info!("Reading samples in sync mode...");

        while !self.exit.is_raised() {
            let mut n = match source.read_block(&mut self.buf) {
                Ok(0) => {
                    info!("Sample source drained.");
                    break;
                }
                Ok(n) => n,
                Err(nb::Error::WouldBlock) => {
                    std::thread::sleep(IDLE_SLEEP);
                    continue;
                }
                Err(nb::Error::Other(e)) => {
                    warn!("WARNING: sync read failed: {}", e);
                    source.cancel();
                    return Err(e);
                }
            };

            if self.bytes_to_read > 0 && self.bytes_to_read <= n as u64 {
                n = self.bytes_to_read as usize;
                self.exit.raise();
                source.cancel();
            }

            on_block(&self.buf[..n]);
            stats.blocks += 1;
            stats.bytes += n as u64;

            if self.bytes_to_read > 0 {
                self.bytes_to_read -= n as u64;
            }
        }

        Ok(stats)
    }
}
