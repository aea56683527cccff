//! Frequency Sketch Module
//!
//! Count-min sketch of 4-bit counters used to estimate how often a key is read.
//! Counters are halved periodically so the estimate tracks recent popularity.

const ROWS: usize = 4;
const MIN_WIDTH: u64 = 16;
/// Upper bound on counters per row (128 MiB per row).
const MAX_WIDTH: u64 = 1 << 28;
const COUNTER_MAX: u8 = 0x0f;
const SEEDS: [u64; ROWS] = [
    0xc3a5_c85c_97cb_3127,
    0xb492_b66f_be98_f273,
    0x9ae1_6a3b_2f90_404f,
    0xcbf2_9ce4_8422_2325,
];

// == Frequency Sketch ==
/// Approximate per-key access counter with bounded memory.
///
/// Each row packs two counters per byte. The estimate for a key is the minimum
/// of its counters across all rows, so it can over-count but never under-count
/// (until the next aging pass).
#[derive(Debug)]
pub struct FrequencySketch {
    rows: [Vec<u8>; ROWS],
    mask: u64,
    additions: u64,
    reset_at: u64,
}

impl FrequencySketch {
    // == Constructor ==
    /// Creates a sketch sized for roughly `num_counters` distinct keys.
    pub fn new(num_counters: u64) -> Self {
        let width = Self::width_for(num_counters);
        let bytes = (width / 2) as usize;
        Self {
            rows: std::array::from_fn(|_| vec![0u8; bytes]),
            mask: width - 1,
            additions: 0,
            reset_at: width,
        }
    }

    /// Counters per row for a capacity hint: a power of two within bounds.
    fn width_for(num_counters: u64) -> u64 {
        num_counters.clamp(MIN_WIDTH, MAX_WIDTH).next_power_of_two()
    }

    // == Increment ==
    /// Records one access for the given key hash.
    pub fn increment(&mut self, hash: u64) {
        for (row, seed) in self.rows.iter_mut().zip(SEEDS) {
            let (byte, shift) = Self::slot(hash, seed, self.mask);
            let counter = (row[byte] >> shift) & COUNTER_MAX;
            if counter < COUNTER_MAX {
                row[byte] += 1 << shift;
            }
        }

        self.additions += 1;
        if self.additions >= self.reset_at {
            self.reset();
        }
    }

    // == Estimate ==
    /// Returns the estimated access count for the given key hash.
    pub fn estimate(&self, hash: u64) -> u8 {
        self.rows
            .iter()
            .zip(SEEDS)
            .map(|(row, seed)| {
                let (byte, shift) = Self::slot(hash, seed, self.mask);
                (row[byte] >> shift) & COUNTER_MAX
            })
            .min()
            .unwrap_or(0)
    }

    // == Reset ==
    /// Halves every counter.
    pub fn reset(&mut self) {
        for row in self.rows.iter_mut() {
            for byte in row.iter_mut() {
                *byte = (*byte >> 1) & 0x77;
            }
        }
        self.additions = 0;
    }

    fn slot(hash: u64, seed: u64, mask: u64) -> (usize, u32) {
        let mixed = (hash ^ seed).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let index = mixed.rotate_left(32) & mask;
        ((index / 2) as usize, ((index & 1) * 4) as u32)
    }
}
