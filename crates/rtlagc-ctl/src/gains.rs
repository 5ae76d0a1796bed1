use core::fmt;
use rtlagc_core::{AgcError, AgcResult, MIN_GAIN_INDEX};

/// Supported tuner gain steps, tenths of dB, in the order the tuner reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GainTable {
    values: Vec<i32>,
}

impl GainTable {
    pub fn new(values: Vec<i32>) -> AgcResult<Self> {
        if values.is_empty() {
            return Err(AgcError::EmptyGainTable);
        }
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn value(&self, index: usize) -> Option<i32> {
        self.values.get(index).copied()
    }

    /// The closed loop needs at least one step above the reserved index 0.
    pub fn ensure_controllable(&self) -> AgcResult<()> {
        if self.values.len() <= MIN_GAIN_INDEX {
            return Err(AgcError::GainTableTooShort);
        }
        Ok(())
    }

    pub fn min_index(&self) -> usize {
        MIN_GAIN_INDEX
    }

    pub fn max_index(&self) -> usize {
        self.values.len() - 1
    }

    /// Mid-table start point, kept inside the controllable range.
    pub fn initial_index(&self) -> usize {
        (self.values.len() / 2).clamp(self.min_index(), self.max_index().max(self.min_index()))
    }

    /// Closest supported gain to `tenths_db`. Ties go to the earlier entry.
    pub fn nearest(&self, tenths_db: i32) -> i32 {
        let mut best = self.values[0];
        for &g in &self.values[1..] {
            if (g - tenths_db).abs() < (best - tenths_db).abs() {
                best = g;
            }
        }
        best
    }
}

impl fmt::Display for GainTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, g) in self.values.iter().enumerate() {
            if n > 0 { f.write_str(" ")?; }
            write!(f, "{:.1}", *g as f32 / 10.0)?;
        }
        Ok(())
    }
}
