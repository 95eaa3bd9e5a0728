//! Benchmark parameter types.

use std::fmt;

/// Parameters for a sampling benchmark run.
#[derive(Clone, Debug)]
pub struct SamplerBenchParams {
    /// Number of sites in the layout.
    pub site_count: usize,
    /// Strategy name, `radius` or `hop`.
    pub strategy: &'static str,
}

impl fmt::Display for SamplerBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},n={}", self.strategy, self.site_count)
    }
}

/// Parameters for a partitioning benchmark run.
#[derive(Clone, Debug)]
pub struct PartitionBenchParams {
    /// Number of neighbourhoods being partitioned.
    pub neighborhoods: usize,
    /// Number of shared-site occurrences across those neighbourhoods.
    pub occurrences: usize,
}

impl fmt::Display for PartitionBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hoods={},occ={}", self.neighborhoods, self.occurrences)
    }
}
