// Seeded pseudo-random source for the Lurker navigation crates.
//
// xoshiro256++ (Blackman & Vigna, 2019) expanded from a single `u64` seed
// with SplitMix64. No external RNG crate: every random choice the navigation
// core makes (room picks, interest-node visiting order) must replay exactly
// from the same seed, so the generator is small, hand-rolled, and integer-only.
//
// Besides raw output, the generator offers the two selection helpers the
// exploration layer needs: `pick` (uniform element index) and
// `shuffle_by_removal`, which builds a permutation by repeatedly removing a
// uniformly chosen element from the input and appending it to the output.
//
// **Critical constraint: determinism.** Given identical prior state every
// method returns identical values on every platform. No floats in the core
// step, no OS entropy, no thread-local state.

use serde::{Deserialize, Serialize};

/// xoshiro256++ state. Owned by whoever needs a reproducible random stream;
/// `lurker_nav::manager::NavManager` owns exactly one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LurkerRng {
    s: [u64; 4],
}

impl LurkerRng {
    /// Seed the generator. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        let s = [
            splitmix64(&mut sm),
            splitmix64(&mut sm),
            splitmix64(&mut sm),
            splitmix64(&mut sm),
        ];
        Self { s }
    }

    pub fn next_u64(&mut self) -> u64 {
        let [s0, s1, s2, s3] = self.s;
        let result = s0.wrapping_add(s3).rotate_left(23).wrapping_add(s0);

        let t = s1 << 17;
        let mut next = [s0, s1, s2 ^ s0, s3 ^ s1];
        next[1] ^= next[2];
        next[0] ^= next[3];
        next[2] ^= t;
        next[3] = next[3].rotate_left(45);
        self.s = next;

        result
    }

    /// Uniform `f64` in [0, 1) built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)` without modulo bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: empty range {low}..{high}");
        let span = high - low;
        if span.is_power_of_two() {
            return low + (self.next_u64() & (span - 1));
        }
        // Values below `zone` would over-represent the low residues.
        let zone = span.wrapping_neg() % span;
        loop {
            let r = self.next_u64();
            if r >= zone {
                return low + r % span;
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Index of a uniformly chosen element of a slice of length `len`, or
    /// `None` when `len == 0`.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.range_usize(0, len))
    }

    /// Permute `items` by repeated uniform removal: each step takes a random
    /// remaining element out of the pool and appends it to the result.
    pub fn shuffle_by_removal<T>(&mut self, mut items: Vec<T>) -> Vec<T> {
        let mut out = Vec::with_capacity(items.len());
        while let Some(idx) = self.pick(items.len()) {
            out.push(items.swap_remove(idx));
        }
        out
    }
}

/// SplitMix64 step, only used to spread one seed word over the 256-bit state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
