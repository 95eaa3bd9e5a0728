//! Deterministic RNG streams derived from the run seed.
//!
//! Each random decision in the pipeline draws from its own stream so that
//! changing one stage (for example the number of conflict groups) never
//! perturbs another.

use rand::{SeedableRng, rngs::SmallRng};

/// SplitMix64 increment (the 64-bit golden ratio) used to space streams.
const STREAM_SEED_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;
const SPLITMIX_MULT_A: u64 = 0xBF58_476D_1CE4_E5B9;
const SPLITMIX_MULT_B: u64 = 0x94D0_49BB_1331_11EB;

/// Named random streams used by the pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RngStream {
    /// Drawing seeds from the labeled sites.
    SeedSelection,
    /// Permuting seeds into train/validation/test.
    SplitPermutation,
    /// Shuffling one conflict group; the index identifies the group.
    ConflictGroup(u8),
}

impl RngStream {
    const fn index(self) -> u64 {
        match self {
            Self::SeedSelection => 0,
            Self::SplitPermutation => 1,
            Self::ConflictGroup(group) => 2 + group as u64,
        }
    }
}

#[inline]
pub(crate) fn mix_stream_seed(base_seed: u64, stream: RngStream) -> u64 {
    splitmix64(base_seed ^ (stream.index() + 1).wrapping_mul(STREAM_SEED_SPACING))
}

#[inline]
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(STREAM_SEED_SPACING);
    state = (state ^ (state >> 30)).wrapping_mul(SPLITMIX_MULT_A);
    state = (state ^ (state >> 27)).wrapping_mul(SPLITMIX_MULT_B);
    state ^ (state >> 31)
}

/// Builds the generator for `stream` under `base_seed`.
pub(crate) fn stream_rng(base_seed: u64, stream: RngStream) -> SmallRng {
    SmallRng::seed_from_u64(mix_stream_seed(base_seed, stream))
}
