use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::time::{Duration, Instant};

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rtlagc_core::{AgcError, AgcResult, I_CENTER, Q_CENTER};
use rtlagc_hal::{SampleSource, TunerGain};

/// R820T gain steps, tenths of dB.
pub const R820T_GAINS: [i32; 29] = [
    0, 9, 14, 27, 37, 77, 87, 125, 144, 157, 166, 197, 207, 229, 254,
    280, 297, 328, 338, 364, 372, 386, 402, 421, 434, 439, 445, 480, 496,
];

/// Shared register file of a simulated receiver.
/// A tone at `input_level` (tenths of dBFS at 0 dB gain) is raised by the
/// programmed gain, one level unit per tenth of a dB.
#[derive(Clone)]
pub struct SimFrontEnd {
    gain: Arc<AtomicI32>,
    auto_gain: Arc<AtomicBool>,
    writes: Arc<AtomicU32>,
}

impl SimFrontEnd {
    pub fn new() -> Self {
        Self {
            gain: Arc::new(AtomicI32::new(0)),
            auto_gain: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn tuner(&self, gains: Vec<i32>, fail_every: u32) -> SimTuner {
        SimTuner { front: self.clone(), gains, fail_every }
    }

    pub fn source(&self, input_level: i32, noise: f32, sample_rate: u32, seed: u64) -> SimSource {
        SimSource {
            front: self.clone(),
            input_level,
            noise,
            sample_rate,
            phase: 0.0,
            rng: StdRng::seed_from_u64(seed),
            next_due: None,
            closed: false,
        }
    }

    /// Currently programmed gain, tenths of dB.
    pub fn gain(&self) -> i32 { self.gain.load(Ordering::SeqCst) }
    pub fn auto_gain(&self) -> bool { self.auto_gain.load(Ordering::SeqCst) }
    /// Gain writes attempted, failed ones included.
    pub fn writes(&self) -> u32 { self.writes.load(Ordering::SeqCst) }
}

impl Default for SimFrontEnd {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SimTuner {
    front: SimFrontEnd,
    gains: Vec<i32>,
    fail_every: u32, // 0 = never
}

impl TunerGain for SimTuner {
    fn read_gain_table(&mut self) -> AgcResult<Vec<i32>> {
        Ok(self.gains.clone())
    }

    fn apply_gain(&mut self, tenths_db: i32) -> AgcResult<()> {
        let n = self.front.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_every > 0 && n % self.fail_every == 0 {
            warn!("WARNING: Failed to set tuner gain.");
            return Err(AgcError::HalError);
        }
        self.front.auto_gain.store(false, Ordering::SeqCst);
        self.front.gain.store(tenths_db, Ordering::SeqCst);
        Ok(())
    }

    fn enable_auto_gain(&mut self) -> AgcResult<()> {
        self.front.auto_gain.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Paced tone generator. Delivers blocks no faster than `sample_rate`.
pub struct SimSource {
    front: SimFrontEnd,
    input_level: i32,
    noise: f32,
    sample_rate: u32,
    phase: f32,
    rng: StdRng,
    next_due: Option<Instant>,
    closed: bool,
}

impl SimSource {
    /// Tone amplitude in raw counts for a level in tenths of dBFS:
    /// level = 100 * ln(A^2 / 128^2)  =>  A = 128 * exp(level / 200).
    pub fn amplitude(level: i32) -> f32 {
        128.0 * (level as f32 / 200.0).exp()
    }

    fn fill(&mut self, buf: &mut [u8]) {
        let level = if self.front.auto_gain() {
            self.input_level
        } else {
            self.input_level + self.front.gain()
        };
        let amp = Self::amplitude(level);
        // 1/64 of a cycle per sample.
        let dphi = core::f32::consts::TAU / 64.0;

        for pair in buf.chunks_exact_mut(2) {
            let (s, c) = self.phase.sin_cos();
            let ni = self.rng.gen_range(-1.0f32..=1.0) * self.noise;
            let nq = self.rng.gen_range(-1.0f32..=1.0) * self.noise;
            pair[0] = (I_CENTER as f32 + amp * c + ni).round().clamp(0.0, 255.0) as u8;
            pair[1] = (Q_CENTER as f32 + amp * s + nq).round().clamp(0.0, 255.0) as u8;
            self.phase = (self.phase + dphi) % core::f32::consts::TAU;
        }
    }
}

impl SampleSource for SimSource {
    fn read_block(&mut self, buf: &mut [u8]) -> nb::Result<usize, AgcError> {
        if self.closed {
            return Ok(0);
        }
        let now = Instant::now();
        if let Some(due) = self.next_due {
            if now < due {
                return Err(nb::Error::WouldBlock);
            }
        }

        let len = buf.len() & !1;
        self.fill(&mut buf[..len]);

        let pairs = (len / 2) as u64;
        let span = Duration::from_nanos(pairs * 1_000_000_000 / self.sample_rate.max(1) as u64);
        self.next_due = Some(self.next_due.unwrap_or(now) + span);
        Ok(len)
    }

    fn cancel(&mut self) {
        if !self.closed {
            info!("Sample source cancelled.");
        }
        self.closed = true;
    }
}
