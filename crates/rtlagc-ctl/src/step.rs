/// Hysteretic integrator turning accumulated level error into unit gain steps.
///
/// `accumulate` runs on the sample thread once per closed window; `step` runs
/// on the actuator thread. Both go through the same lock (see `SharedStepper`).
///
/// While the index sits at a bound, error pushing further past that bound is
/// capped at one threshold. The integrator never drifts while the gain is pinned,
/// and at most `2T` of reversed error releases it.
#[derive(Debug, Clone)]
pub struct StepController {
    threshold: i32,
    accumulated: i32,
    gain_index: usize,
    min_index: usize,
    max_index: usize,
}

impl StepController {
    /// `initial` is clamped into `[min_index, max_index]`.
    pub fn new(threshold: i32, initial: usize, min_index: usize, max_index: usize) -> Self {
        let max_index = max_index.max(min_index);
        Self {
            threshold,
            accumulated: 0,
            gain_index: initial.clamp(min_index, max_index),
            min_index,
            max_index,
        }
    }

    pub fn accumulate(&mut self, error: i32) {
        self.accumulated = self.accumulated.saturating_add(error);
        self.saturate(self.gain_index);
    }

    /// Drain whole thresholds out of the integrator.
    /// Returns: candidate index, already inside the bounds.
    pub fn step(&mut self) -> usize {
        let t = self.threshold;
        let mut candidate = self.gain_index;

        while self.accumulated > t && candidate < self.max_index {
            self.accumulated -= t;
            candidate += 1;
        }
        while self.accumulated < -t && candidate > self.min_index {
            self.accumulated += t;
            candidate -= 1;
        }

        self.saturate(candidate);
        candidate
    }

    fn saturate(&mut self, index: usize) {
        let t = self.threshold;
        if index >= self.max_index && self.accumulated > t {
            self.accumulated = t;
        }
        if index <= self.min_index && self.accumulated < -t {
            self.accumulated = -t;
        }
    }

    pub fn gain_index(&self) -> usize { self.gain_index }

    /// Record the index the actuator settled on.
    pub fn set_gain_index(&mut self, index: usize) {
        self.gain_index = index.clamp(self.min_index, self.max_index);
    }

    pub fn accumulated_error(&self) -> i32 { self.accumulated }
    pub fn bounds(&self) -> (usize, usize) { (self.min_index, self.max_index) }
}
