use rtlagc_core::{DBFS_MIN, FULL_SCALE_MAG, I_CENTER, Q_CENTER};

/// Power of one I/Q pair in tenths of dBFS (natural-log scale, x100).
/// Total over the input domain: a zero magnitude reads as `DBFS_MIN`.
pub fn estimate_level(i: u8, q: u8) -> i32 {
    let ci = i as i32 - I_CENTER;
    let cq = q as i32 - Q_CENTER;
    let mag = ci * ci + cq * cq;
    if mag == 0 {
        return DBFS_MIN;
    }
    // 0dBFS => |I|=128,|Q|=0 ; |I|=|Q|=128 => ~+69
    (100.0 * (mag as f32 / FULL_SCALE_MAG).ln()) as i32
}

/// Look Up Table in tenths of dBFS, indexed [i][q].
/// Built once, read-only afterwards; share it behind an `Arc`.
pub struct PowerTable {
    lut: Box<[[i16; 256]]>,
}

impl PowerTable {
    pub fn new() -> Self {
        let mut lut = vec![[0i16; 256]; 256].into_boxed_slice();
        for (i, row) in lut.iter_mut().enumerate() {
            for (q, cell) in row.iter_mut().enumerate() {
                // Range is [-970, +93]; fits i16.
                *cell = estimate_level(i as u8, q as u8) as i16;
            }
        }
        Self { lut }
    }

    #[inline(always)]
    pub fn level(&self, i: u8, q: u8) -> i32 {
        self.lut[i as usize][q as usize] as i32
    }
}

impl Default for PowerTable {
    fn default() -> Self {
        Self::new()
    }
}
