//! Seeded "Jenkins small fast" generator used to produce reproducible coordinates.
//!
//! Not cryptographic. A seed yields the same draws on every platform; the
//! constants and the update rule below fix the sequence.

const STATE_A: u32 = 0xF1EA_5EED;
const OFFSET_B: u32 = 6871;
const OFFSET_C: u32 = 1889;
const SEED_STRIDE: f64 = 37237.0;
const WARM_UP_DRAWS: usize = 7;

/// One round of the 32-bit JSF mixer, mapped to `[0, 1)`.
///
/// Only the `d` word of the mixed state is returned, and it depends on the
/// first three input words alone, so the fourth word is not taken.
fn jsf32(a: u32, b: u32, c: u32) -> f64 {
    let t = a.wrapping_sub(b.rotate_left(23));
    let d = (b ^ c.rotate_left(16)).wrapping_add(t);
    f64::from(d) / 4_294_967_296.0
}

/// Deterministic draw source. Each instance owns its state; nothing is global.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    pub fn new(seed: i64) -> Self {
        let mut rng = Self { state: 0 };
        rng.set_seed(seed);
        rng
    }

    /// Restarts the stream from `seed` and throws away the warm-up draws.
    pub fn set_seed(&mut self, seed: i64) {
        // Only the low 32 bits ever reach the mixer.
        self.state = seed as u32;
        for _ in 0..WARM_UP_DRAWS {
            self.next_f64();
        }
    }

    /// Next draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        let s = self.state;
        let draw = jsf32(STATE_A, s.wrapping_add(OFFSET_B), s.wrapping_add(OFFSET_C));
        self.state = s.wrapping_add((draw * SEED_STRIDE).floor() as u32);
        draw
    }
}
