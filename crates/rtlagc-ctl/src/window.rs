use rtlagc_core::DBFS_MIN;

/// Tracks the Maximum level over a fixed count of samples.
/// Runs on the sample-delivery thread: O(1) per sample, no locks.
#[derive(Debug, Clone)]
pub struct WindowPeakTracker {
    length: u32,
    remaining: u32,
    peak: i32,
}

impl WindowPeakTracker {
    /// `length` of 0 is promoted to 1.
    pub fn new(length: u32) -> Self {
        let length = length.max(1);
        Self { length, remaining: length, peak: DBFS_MIN }
    }

    /// Feed one level. Returns the window peak when this sample closes the window.
    #[inline]
    pub fn push(&mut self, level: i32) -> Option<i32> {
        if level > self.peak {
            self.peak = level;
        }
        self.remaining -= 1;
        if self.remaining > 0 {
            return None;
        }
        let peak = self.peak;
        self.remaining = self.length;
        self.peak = DBFS_MIN;
        Some(peak)
    }

    pub fn length(&self) -> u32 { self.length }
    pub fn remaining(&self) -> u32 { self.remaining }
    /// Running maximum of the open window.
    pub fn peak(&self) -> i32 { self.peak }
}
