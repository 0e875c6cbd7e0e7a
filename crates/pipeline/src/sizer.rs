//! Group size sampling
//!
//! The random source sits behind a narrow trait so tests can drive the
//! pipeline with deterministic sizes.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Target group sizes are sampled uniformly from this range
pub const GROUP_SIZE_RANGE: RangeInclusive<usize> = 5..=50;

/// Source of per-group target sizes
pub trait GroupSizer {
    fn sample_group_size(&mut self) -> usize;
}

/// Uniform sampler over [`GROUP_SIZE_RANGE`]
pub struct UniformGroupSizer {
    rng: StdRng,
}

impl UniformGroupSizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded sampler for reproducible runs
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for UniformGroupSizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupSizer for UniformGroupSizer {
    fn sample_group_size(&mut self) -> usize {
        self.rng.gen_range(GROUP_SIZE_RANGE)
    }
}

/// Constant group size, for deterministic pipelines
pub struct FixedGroupSizer {
    size: usize,
}

impl FixedGroupSizer {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl GroupSizer for FixedGroupSizer {
    fn sample_group_size(&mut self) -> usize {
        self.size
    }
}
