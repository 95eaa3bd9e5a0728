//! Builder for configuring [`SiteGraph`] runs.
//!
//! Every numeric option is validated in [`SiteGraphBuilder::build`] so a
//! constructed [`SiteGraph`] always carries a usable configuration.

use crate::{
    Result,
    error::SiteGraphError,
    pipeline::SiteGraph,
    preparation::{DEFAULT_MIN_AREA, SitePreparer},
    sampler::SamplingStrategy,
    seeds::DEFAULT_SEED_FRACTION,
    split::{ConflictPolicy, SplitRatios},
};

/// Default base seed for every random stream.
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Configures and constructs [`SiteGraph`] instances.
///
/// # Examples
/// ```
/// use sitegraph_core::{HopParams, SamplingStrategy, SiteGraphBuilder};
///
/// let graph = SiteGraphBuilder::new()
///     .with_seed_fraction(0.05)
///     .with_strategy(SamplingStrategy::Hop(HopParams::new(2).expect("two hops")))
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(graph.seed_fraction(), 0.05);
/// assert_eq!(graph.strategy().name(), "hop");
/// ```
#[derive(Debug, Clone)]
pub struct SiteGraphBuilder {
    seed_fraction: f64,
    seed: u64,
    strategy: SamplingStrategy,
    min_area: f64,
    drop_nested: bool,
    train_ratio: f64,
    validation_ratio: f64,
    three_way: [f64; 3],
    pairwise: f64,
}

impl Default for SiteGraphBuilder {
    fn default() -> Self {
        let ratios = SplitRatios::default();
        let policy = ConflictPolicy::default();
        Self {
            seed_fraction: DEFAULT_SEED_FRACTION,
            seed: DEFAULT_SEED,
            strategy: SamplingStrategy::default(),
            min_area: DEFAULT_MIN_AREA,
            drop_nested: true,
            train_ratio: ratios.train(),
            validation_ratio: ratios.validation(),
            three_way: policy.three_way(),
            pairwise: policy.pairwise(),
        }
    }
}

impl SiteGraphBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use sitegraph_core::SiteGraphBuilder;
    ///
    /// let builder = SiteGraphBuilder::new();
    /// assert_eq!(builder.seed_fraction(), 0.01);
    /// assert_eq!(builder.strategy().name(), "radius");
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fraction of sites drawn as seeds.
    #[must_use]
    pub fn with_seed_fraction(mut self, fraction: f64) -> Self {
        self.seed_fraction = fraction;
        self
    }

    /// Sets the base seed shared by every random stream.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Selects the neighbourhood growth strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: SamplingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the exclusive minimum footprint area.
    #[must_use]
    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    /// Controls whether footprints nested in other footprints are removed.
    #[must_use]
    pub fn with_drop_nested(mut self, drop_nested: bool) -> Self {
        self.drop_nested = drop_nested;
        self
    }

    /// Sets the train and validation fractions; test takes the rest.
    #[must_use]
    pub fn with_split_ratios(mut self, train: f64, validation: f64) -> Self {
        self.train_ratio = train;
        self.validation_ratio = validation;
        self
    }

    /// Sets the conflict redistribution shares.
    ///
    /// # Examples
    /// ```
    /// use sitegraph_core::SiteGraphBuilder;
    ///
    /// let err = SiteGraphBuilder::new()
    ///     .with_conflict_policy([0.5, 0.5, 0.5], 1.0)
    ///     .build()
    ///     .expect_err("three-way shares must sum to one");
    /// assert!(err.is_configuration());
    /// ```
    #[must_use]
    pub fn with_conflict_policy(mut self, three_way: [f64; 3], pairwise: f64) -> Self {
        self.three_way = three_way;
        self.pairwise = pairwise;
        self
    }

    /// Returns the fraction of labeled sites drawn as seeds.
    #[must_use]
    #[rustfmt::skip]
    pub fn seed_fraction(&self) -> f64 { self.seed_fraction }

    /// Returns the RNG seed.
    #[must_use]
    #[rustfmt::skip]
    pub fn seed(&self) -> u64 { self.seed }

    /// Returns the sampling strategy.
    #[must_use]
    #[rustfmt::skip]
    pub fn strategy(&self) -> &SamplingStrategy { &self.strategy }

    /// Validates the configuration and constructs a [`SiteGraph`].
    ///
    /// # Errors
    /// Returns the configuration variant of [`SiteGraphError`] naming the
    /// first invalid option.
    pub fn build(self) -> Result<SiteGraph> {
        let fraction = self.seed_fraction;
        if !(fraction.is_finite() && fraction > 0.0 && fraction <= 1.0) {
            return Err(SiteGraphError::InvalidSeedFraction { got: fraction });
        }
        if !(self.min_area.is_finite() && self.min_area >= 0.0) {
            return Err(SiteGraphError::InvalidMinArea { got: self.min_area });
        }
        self.strategy.validate()?;
        let ratios = SplitRatios::new(self.train_ratio, self.validation_ratio)?;
        let policy = ConflictPolicy::new(self.three_way, self.pairwise)?;
        Ok(SiteGraph::new(
            fraction,
            self.seed,
            self.strategy,
            SitePreparer::new(self.min_area, self.drop_nested),
            ratios,
            policy,
        ))
    }
}
