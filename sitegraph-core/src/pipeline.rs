//! End-to-end neighbourhood extraction.
//!
//! [`SiteGraph`] owns a validated configuration and wires the stages
//! together: preparation, seed selection, sampling, deduplication,
//! membership indexing, and split partitioning.

use tracing::{Span, info, instrument, warn};

use crate::{
    Result,
    dataset::Dataset,
    dedup::DuplicateResolver,
    error::SiteGraphError,
    geometry::{FootprintIndex, GeometryAdapter},
    membership::MembershipIndex,
    preparation::{PreparedSites, SitePreparer},
    report::RunReport,
    sampler::{NeighborhoodSampler, SamplingStrategy},
    seeds::SeedSet,
    site::{SiteId, SiteTable},
    split::{ConflictPolicy, SplitPartitioner, SplitRatios},
    triangulation::{DelaunayTriangulator, Triangulator},
};

/// Entry point for building a neighbourhood dataset.
///
/// # Examples
/// ```
/// use geo::polygon;
/// use sitegraph_core::{ClassLabel, Site, SiteGraphBuilder, SiteId, SiteTable};
///
/// let sites: Vec<Site> = (0..10_u32)
///     .map(|i| {
///         let x = f64::from(i) * 10.0;
///         let footprint = polygon![
///             (x: x, y: 0.0),
///             (x: x + 2.0, y: 0.0),
///             (x: x + 2.0, y: 2.0),
///             (x: x, y: 2.0),
///         ];
///         Site::new(SiteId::new(u64::from(i)), footprint).with_label(Some(ClassLabel::new(1)))
///     })
///     .collect();
/// let table = SiteTable::new("row", sites)?;
/// let dataset = SiteGraphBuilder::new()
///     .with_seed_fraction(0.2)
///     .build()?
///     .run(&table)?;
/// assert_eq!(dataset.seeds().len(), 2);
/// # Ok::<(), sitegraph_core::SiteGraphError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SiteGraph {
    seed_fraction: f64,
    seed: u64,
    strategy: SamplingStrategy,
    preparer: SitePreparer,
    split_ratios: SplitRatios,
    conflict_policy: ConflictPolicy,
}

impl SiteGraph {
    pub(crate) fn new(
        seed_fraction: f64,
        seed: u64,
        strategy: SamplingStrategy,
        preparer: SitePreparer,
        split_ratios: SplitRatios,
        conflict_policy: ConflictPolicy,
    ) -> Self {
        Self {
            seed_fraction,
            seed,
            strategy,
            preparer,
            split_ratios,
            conflict_policy,
        }
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

    /// Returns the geometry preparation settings.
    #[must_use]
    #[rustfmt::skip]
    pub fn preparer(&self) -> SitePreparer { self.preparer }

    /// Returns the split ratios.
    #[must_use]
    #[rustfmt::skip]
    pub fn split_ratios(&self) -> SplitRatios { self.split_ratios }

    /// Returns the conflict resolution policy.
    #[must_use]
    #[rustfmt::skip]
    pub fn conflict_policy(&self) -> ConflictPolicy { self.conflict_policy }

    /// Runs the pipeline, drawing seeds from the prepared sites.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::EmptySiteTable`] when no site survives
    /// preparation, [`SiteGraphError::EmptySeedSet`] when no seed is drawn,
    /// [`SiteGraphError::EmptyNeighborhoodSet`] when every seed is dropped,
    /// and [`SiteGraphError::InconsistentMembership`] or
    /// [`SiteGraphError::Triangulation`] for internal failures.
    #[instrument(
        name = "core.run",
        err,
        skip(self, sites),
        fields(
            table = sites.name(),
            sites = sites.len(),
            strategy = self.strategy.name(),
            neighborhoods = tracing::field::Empty
        ),
    )]
    pub fn run(&self, sites: &SiteTable) -> Result<Dataset> {
        let prepared = self.prepare(sites)?;
        let seeds = SeedSet::select(&prepared.table, self.seed_fraction, self.seed)?;
        self.run_prepared(prepared, seeds)
    }

    /// Runs the pipeline from caller-chosen seeds.
    ///
    /// # Errors
    /// As [`SiteGraph::run`], plus [`SiteGraphError::UnknownSeed`] and
    /// [`SiteGraphError::UnlabeledSeed`] for seeds that are not labeled
    /// prepared sites.
    #[instrument(
        name = "core.run",
        err,
        skip(self, sites, seeds),
        fields(
            table = sites.name(),
            sites = sites.len(),
            strategy = self.strategy.name(),
            neighborhoods = tracing::field::Empty
        ),
    )]
    pub fn run_with_seeds(
        &self,
        sites: &SiteTable,
        seeds: impl IntoIterator<Item = SiteId>,
    ) -> Result<Dataset> {
        let prepared = self.prepare(sites)?;
        let seeds = SeedSet::from_sites(&prepared.table, seeds)?;
        self.run_prepared(prepared, seeds)
    }

    /// Runs sampling onwards with caller-supplied primitives.
    ///
    /// `sites` is used as-is and should already be prepared.
    ///
    /// # Errors
    /// As [`SiteGraph::run`], minus preparation and seed selection.
    pub fn run_with_backends<G, T>(
        &self,
        sites: &SiteTable,
        geometry: &G,
        triangulator: &T,
        seeds: SeedSet,
        report: RunReport,
    ) -> Result<Dataset>
    where
        G: GeometryAdapter,
        T: Triangulator,
    {
        let mut report = report;
        let sampler = NeighborhoodSampler::new(geometry, triangulator, self.strategy);
        let sampled = sampler.sample(sites, &seeds, &mut report)?;
        for hood in &sampled {
            hood.validate()?;
        }

        let neighborhoods = DuplicateResolver.resolve(sampled, &mut report);
        if neighborhoods.is_empty() {
            return Err(SiteGraphError::EmptyNeighborhoodSet { seeds: seeds.len() });
        }
        Span::current().record("neighborhoods", neighborhoods.len());

        let membership = MembershipIndex::build(&neighborhoods);
        let assignment = SplitPartitioner::new(self.split_ratios, self.conflict_policy, self.seed)
            .partition(&neighborhoods, &membership, sites);
        let dataset = Dataset::new(seeds, neighborhoods, membership, assignment, report);
        let summary = dataset.summary();
        info!(
            neighborhoods = summary.neighborhoods,
            edges = summary.edges,
            skipped = summary.skipped_sites,
            duplicates = summary.duplicates,
            "dataset assembled"
        );
        Ok(dataset)
    }

    fn prepare(&self, sites: &SiteTable) -> Result<PreparedSites> {
        let prepared = self.preparer.prepare(sites);
        #[cfg(feature = "metrics")]
        metrics::counter!("sitegraph_skipped_sites").increment(prepared.skipped.len() as u64);
        if prepared.table.is_empty() {
            warn!(
                table = sites.name(),
                skipped = prepared.skipped.len(),
                "no usable sites after preparation, returning error"
            );
            return Err(SiteGraphError::EmptySiteTable {
                table: sites.name_arc(),
            });
        }
        Ok(prepared)
    }

    fn run_prepared(&self, prepared: PreparedSites, seeds: SeedSet) -> Result<Dataset> {
        let mut report = RunReport::default();
        report.extend_skipped(prepared.skipped);
        let (index, unindexed) = FootprintIndex::new(&prepared.table);
        report.extend_skipped(unindexed);
        self.run_with_backends(&prepared.table, &index, &DelaunayTriangulator, seeds, report)
    }
}
