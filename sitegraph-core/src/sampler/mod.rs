//! Seed-centred neighbourhood sampling.
//!
//! Two strategies are supported. Radius mode grows a buffer around each
//! seed footprint in fixed steps until enough sites fall inside it. Hop mode
//! walks the Delaunay graph breadth-first from each seed for a fixed number
//! of hops. Both process every pending seed of a round in parallel.

use geo::Coord;
use rayon::prelude::*;
use tracing::instrument;

use crate::{
    error::{GeometryError, Result, SiteGraphError},
    geometry::GeometryAdapter,
    neighborhood::{Completion, Member, Neighborhood, NeighborhoodEdge, NeighborhoodId},
    report::{RunIssue, RunReport},
    seeds::SeedSet,
    site::{SiteId, SiteTable},
    triangulation::{SiteEdge, TriangulationEdgeBuilder, Triangulator},
};

mod hop;
mod radius;
#[cfg(test)]
mod tests;

use self::radius::RoundOutcome;

/// Default first buffer radius.
pub const DEFAULT_INITIAL_RADIUS: f64 = 10.0;
/// Default radius increment between rounds.
pub const DEFAULT_RADIUS_STEP: f64 = 10.0;
/// Default ceiling radius.
pub const DEFAULT_MAX_RADIUS: f64 = 20_000.0;
/// Default neighbourhood size threshold.
pub const DEFAULT_MIN_SITES: usize = 20;
/// Default minimum size for committing a neighbourhood at the ceiling.
pub const DEFAULT_MIN_FALLBACK_SITES: usize = 2;
/// Default hop count.
pub const DEFAULT_MAX_HOPS: u32 = 4;

/// Which sites radius-mode triangulation sees.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EdgeScope {
    /// Triangulate each neighbourhood's members on their own.
    #[default]
    PerNeighborhood,
    /// Triangulate all prepared sites once and keep the induced edges.
    Global,
}

/// Parameters for radius-mode sampling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusParams {
    initial_radius: f64,
    radius_step: f64,
    max_radius: f64,
    min_sites: usize,
    min_fallback_sites: usize,
    edge_scope: EdgeScope,
}

impl Default for RadiusParams {
    fn default() -> Self {
        Self {
            initial_radius: DEFAULT_INITIAL_RADIUS,
            radius_step: DEFAULT_RADIUS_STEP,
            max_radius: DEFAULT_MAX_RADIUS,
            min_sites: DEFAULT_MIN_SITES,
            min_fallback_sites: DEFAULT_MIN_FALLBACK_SITES,
            edge_scope: EdgeScope::PerNeighborhood,
        }
    }
}

impl RadiusParams {
    /// Creates validated radius parameters.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::InvalidRadius`] when a radius is non-finite
    /// or non-positive, or when `max_radius < initial_radius`, and
    /// [`SiteGraphError::InvalidMinSites`] when `min_sites` is zero.
    pub fn new(
        initial_radius: f64,
        radius_step: f64,
        max_radius: f64,
        min_sites: usize,
    ) -> Result<Self> {
        let params = Self {
            initial_radius,
            radius_step,
            max_radius,
            min_sites,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Sets the minimum member count for committing at the ceiling.
    #[must_use]
    pub const fn with_min_fallback_sites(mut self, min_fallback_sites: usize) -> Self {
        self.min_fallback_sites = min_fallback_sites;
        self
    }

    /// Sets the triangulation scope.
    #[must_use]
    pub const fn with_edge_scope(mut self, edge_scope: EdgeScope) -> Self {
        self.edge_scope = edge_scope;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let positive = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SiteGraphError::InvalidRadius { name, got: value })
            }
        };
        positive("initial_radius", self.initial_radius)?;
        positive("radius_step", self.radius_step)?;
        positive("max_radius", self.max_radius)?;
        if self.max_radius < self.initial_radius {
            return Err(SiteGraphError::InvalidRadius {
                name: "max_radius",
                got: self.max_radius,
            });
        }
        if self.min_sites == 0 {
            return Err(SiteGraphError::InvalidMinSites { got: 0 });
        }
        Ok(())
    }

    /// Returns the radius of the first buffer round.
    #[must_use]
    #[rustfmt::skip]
    pub fn initial_radius(&self) -> f64 { self.initial_radius }

    /// Returns the radius increment between rounds.
    #[must_use]
    #[rustfmt::skip]
    pub fn radius_step(&self) -> f64 { self.radius_step }

    /// Returns the radius ceiling.
    #[must_use]
    #[rustfmt::skip]
    pub fn max_radius(&self) -> f64 { self.max_radius }

    /// Returns the member count that commits a neighbourhood.
    #[must_use]
    #[rustfmt::skip]
    pub fn min_sites(&self) -> usize { self.min_sites }

    /// Returns the member count a ceiling commit still requires.
    #[must_use]
    #[rustfmt::skip]
    pub fn min_fallback_sites(&self) -> usize { self.min_fallback_sites }

    /// Returns which sites contribute edges to a neighbourhood.
    #[must_use]
    #[rustfmt::skip]
    pub fn edge_scope(&self) -> EdgeScope { self.edge_scope }
}

/// Parameters for hop-mode sampling.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HopParams {
    max_hops: u32,
}

impl Default for HopParams {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

impl HopParams {
    /// Creates validated hop parameters.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::InvalidMaxHops`] when `max_hops` is zero.
    pub fn new(max_hops: u32) -> Result<Self> {
        if max_hops == 0 {
            return Err(SiteGraphError::InvalidMaxHops { got: max_hops });
        }
        Ok(Self { max_hops })
    }

    /// Returns the traversal depth limit.
    #[must_use]
    #[rustfmt::skip]
    pub fn max_hops(&self) -> u32 { self.max_hops }
}

/// Neighbourhood growth strategy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SamplingStrategy {
    /// Grow a buffer around the seed footprint.
    Radius(RadiusParams),
    /// Breadth-first traversal over Delaunay edges.
    Hop(HopParams),
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Radius(RadiusParams::default())
    }
}

impl SamplingStrategy {
    /// Short name used in logs and summaries.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Radius(_) => "radius",
            Self::Hop(_) => "hop",
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Radius(params) => params.validate(),
            Self::Hop(params) => HopParams::new(params.max_hops).map(|_| ()),
        }
    }
}

/// Grows one neighbourhood per seed over a prepared site table.
#[derive(Debug)]
pub struct NeighborhoodSampler<'a, G, T> {
    geometry: &'a G,
    triangulator: &'a T,
    strategy: SamplingStrategy,
}

impl<'a, G, T> NeighborhoodSampler<'a, G, T>
where
    G: GeometryAdapter,
    T: Triangulator,
{
    /// Creates a sampler over the given primitives.
    #[must_use]
    pub const fn new(geometry: &'a G, triangulator: &'a T, strategy: SamplingStrategy) -> Self {
        Self {
            geometry,
            triangulator,
            strategy,
        }
    }

    /// Returns the configured strategy.
    #[must_use]
    #[rustfmt::skip]
    pub fn strategy(&self) -> &SamplingStrategy { &self.strategy }

    /// Samples one neighbourhood per seed.
    ///
    /// Neighbourhoods are returned in ascending seed order with provisional
    /// identifiers equal to their position. Seeds that cannot be grown are
    /// omitted and recorded in `report`.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::Triangulation`] when the triangulation
    /// primitive fails and [`SiteGraphError::InvalidRadius`] or
    /// [`SiteGraphError::InvalidMaxHops`] for invalid parameters.
    pub fn sample(
        &self,
        sites: &SiteTable,
        seeds: &SeedSet,
        report: &mut RunReport,
    ) -> Result<Vec<Neighborhood>> {
        self.strategy.validate()?;
        let mut neighborhoods = match self.strategy {
            SamplingStrategy::Radius(params) => self.sample_radius(sites, seeds, &params, report)?,
            SamplingStrategy::Hop(params) => self.sample_hop(sites, seeds, params, report)?,
        };
        neighborhoods.sort_unstable_by_key(Neighborhood::seed);
        for (position, neighborhood) in neighborhoods.iter_mut().enumerate() {
            neighborhood.renumber(NeighborhoodId::new(position));
        }
        Ok(neighborhoods)
    }

    #[instrument(
        name = "core.sample_radius",
        err,
        skip(self, sites, seeds, params, report),
        fields(seeds = seeds.len(), min_sites = params.min_sites)
    )]
    fn sample_radius(
        &self,
        sites: &SiteTable,
        seeds: &SeedSet,
        params: &RadiusParams,
        report: &mut RunReport,
    ) -> Result<Vec<Neighborhood>> {
        let committed = radius::grow(self.geometry, params, seeds.as_slice(), report);
        let builder = TriangulationEdgeBuilder::new(self.triangulator);
        let mut neighborhoods: Vec<Neighborhood> = committed
            .into_iter()
            .map(|outcome| {
                let members = outcome
                    .members
                    .iter()
                    .map(|&site| Member {
                        site,
                        is_center: false,
                        hop: None,
                    })
                    .collect();
                Neighborhood::new(
                    NeighborhoodId::default(),
                    outcome.seed,
                    members,
                    Vec::new(),
                    outcome.completion,
                )
                .with_radius(outcome.radius)
            })
            .collect();

        match params.edge_scope {
            EdgeScope::PerNeighborhood => {
                let per_hood: Vec<Result<(Vec<NeighborhoodEdge>, Vec<GeometryError>)>> =
                    neighborhoods
                        .par_iter()
                        .map(|hood| {
                            let ids: Vec<SiteId> = hood.member_ids().collect();
                            let (points, errors) = centroids_of(self.geometry, &ids);
                            let edges = builder.build(&points)?;
                            Ok((untagged(edges.as_slice()), errors))
                        })
                        .collect();
                for (hood, result) in neighborhoods.iter_mut().zip(per_hood) {
                    let (edges, errors) = result?;
                    report.extend_skipped(errors);
                    hood.set_edges(edges);
                }
            }
            EdgeScope::Global => {
                let ids: Vec<SiteId> = sites.iter().map(|site| site.id()).collect();
                let (points, errors) = centroids_of(self.geometry, &ids);
                report.extend_skipped(errors);
                let all_edges = builder.build(&points)?;
                for hood in &mut neighborhoods {
                    let edges = all_edges.restrict(|site| hood.contains(site));
                    hood.set_edges(untagged(&edges));
                }
            }
        }
        Ok(neighborhoods)
    }

    #[instrument(
        name = "core.sample_hop",
        err,
        skip(self, sites, seeds, params, report),
        fields(seeds = seeds.len(), max_hops = params.max_hops)
    )]
    fn sample_hop(
        &self,
        sites: &SiteTable,
        seeds: &SeedSet,
        params: HopParams,
        report: &mut RunReport,
    ) -> Result<Vec<Neighborhood>> {
        let ids: Vec<SiteId> = sites.iter().map(|site| site.id()).collect();
        let (points, errors) = centroids_of(self.geometry, &ids);
        report.extend_skipped(errors);
        let all_edges = TriangulationEdgeBuilder::new(self.triangulator).build(&points)?;
        let adjacency = all_edges.adjacency();

        let walks = hop::walk(&adjacency, seeds.as_slice(), params.max_hops);
        let neighborhoods = walks
            .into_par_iter()
            .map(|walk| {
                let edges = all_edges
                    .restrict(|site| walk.reached.contains_key(&site))
                    .into_iter()
                    .map(|edge| {
                        let hop = walk.reached[&edge.start].min(walk.reached[&edge.end]);
                        NeighborhoodEdge {
                            start: edge.start,
                            end: edge.end,
                            distance: edge.distance,
                            hop: Some(hop),
                        }
                    })
                    .collect();
                let members = walk
                    .reached
                    .iter()
                    .map(|(&site, &hop)| Member {
                        site,
                        is_center: false,
                        hop: Some(hop),
                    })
                    .collect();
                Neighborhood::new(
                    NeighborhoodId::default(),
                    walk.seed,
                    members,
                    edges,
                    walk.completion,
                )
            })
            .collect();
        Ok(neighborhoods)
    }
}

fn untagged(edges: &[SiteEdge]) -> Vec<NeighborhoodEdge> {
    edges
        .iter()
        .map(|edge| NeighborhoodEdge {
            start: edge.start,
            end: edge.end,
            distance: edge.distance,
            hop: None,
        })
        .collect()
}

fn centroids_of<G: GeometryAdapter>(
    geometry: &G,
    ids: &[SiteId],
) -> (Vec<(SiteId, Coord<f64>)>, Vec<GeometryError>) {
    let mut points = Vec::with_capacity(ids.len());
    let mut errors = Vec::new();
    for &id in ids {
        match geometry.centroid(id) {
            Ok(centroid) => points.push((id, centroid)),
            Err(error) => errors.push(error),
        }
    }
    (points, errors)
}

pub(crate) fn record_convergence(report: &mut RunReport, outcome: &RoundOutcome) {
    if outcome.completion == Completion::Ceiling {
        report.push(RunIssue::ConvergenceExceeded {
            seed: outcome.seed,
            members: outcome.members.len(),
            radius: outcome.radius,
            committed: true,
        });
    }
}
