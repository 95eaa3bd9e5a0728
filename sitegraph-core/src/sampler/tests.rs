//! Tests for neighbourhood sampling.

use geo::Coord;
use rstest::{fixture, rstest};

use super::*;
use crate::{
    geometry::FootprintIndex,
    site::{ClassLabel, Site},
    test_utils::{grid_table, square},
    triangulation::DelaunayTriangulator,
};

#[fixture]
fn grid() -> SiteTable {
    grid_table(10, 10, 10.0, 2.0)
}

fn seeds(table: &SiteTable, raw: &[u64]) -> SeedSet {
    SeedSet::from_sites(table, raw.iter().copied().map(SiteId::new)).expect("fixture seeds are labeled")
}

fn radius_strategy(initial: f64, step: f64, max: f64, min_sites: usize) -> SamplingStrategy {
    SamplingStrategy::Radius(
        RadiusParams::new(initial, step, max, min_sites).expect("fixture parameters are valid"),
    )
}

fn run(table: &SiteTable, seeds: &SeedSet, strategy: SamplingStrategy) -> (Vec<Neighborhood>, RunReport) {
    let (index, _) = FootprintIndex::new(table);
    let sampler = NeighborhoodSampler::new(&index, &DelaunayTriangulator, strategy);
    let mut report = RunReport::default();
    let hoods = sampler
        .sample(table, seeds, &mut report)
        .expect("sampling succeeds");
    (hoods, report)
}

#[rstest]
fn radius_mode_commits_at_first_sufficient_radius(grid: SiteTable) {
    let (hoods, report) = run(&grid, &seeds(&grid, &[44, 0]), radius_strategy(10.0, 10.0, 20_000.0, 10));
    assert!(report.is_empty());
    let summary: Vec<(u64, usize, Option<f64>)> = hoods
        .iter()
        .map(|hood| (hood.seed().get(), hood.len(), hood.radius()))
        .collect();
    assert_eq!(summary, vec![(0, 13, Some(30.0)), (44, 21, Some(20.0))]);
    for (position, hood) in hoods.iter().enumerate() {
        assert_eq!(hood.id(), NeighborhoodId::new(position));
        assert_eq!(hood.completion(), Completion::Threshold);
        assert!(hood.validate().is_ok());
    }
}

#[rstest]
fn radius_mode_commits_below_threshold_at_ceiling(grid: SiteTable) {
    let (hoods, report) = run(&grid, &seeds(&grid, &[44]), radius_strategy(10.0, 10.0, 15.0, 50));
    assert_eq!(hoods.len(), 1);
    let hood = &hoods[0];
    assert_eq!(hood.completion(), Completion::Ceiling);
    assert_eq!(hood.radius(), Some(15.0));
    assert_eq!(hood.len(), 9);
    assert_eq!(report.ceiling_commits().collect::<Vec<_>>(), vec![SiteId::new(44)]);
}

#[test]
fn isolated_seed_is_dropped_at_ceiling() {
    let mut sites: Vec<Site> = grid_table(3, 3, 10.0, 2.0).sites().to_vec();
    sites.push(
        Site::new(SiteId::new(1_000), square(1.0e6, 1.0e6, 2.0)).with_label(Some(ClassLabel::new(1))),
    );
    let table = SiteTable::new("sites", sites).expect("unique ids");
    let (hoods, report) = run(
        &table,
        &seeds(&table, &[4, 1_000]),
        radius_strategy(10.0, 10.0, 40.0, 5),
    );
    let kept: Vec<u64> = hoods.iter().map(|hood| hood.seed().get()).collect();
    assert_eq!(kept, vec![4]);
    assert_eq!(report.dropped_seeds().collect::<Vec<_>>(), vec![SiteId::new(1_000)]);
}

#[rstest]
#[case::per_neighborhood(EdgeScope::PerNeighborhood)]
#[case::global(EdgeScope::Global)]
fn radius_edges_stay_inside_the_neighborhood(grid: SiteTable, #[case] scope: EdgeScope) {
    let params = RadiusParams::new(10.0, 10.0, 100.0, 10)
        .expect("valid parameters")
        .with_edge_scope(scope);
    let (hoods, _) = run(&grid, &seeds(&grid, &[0, 55]), SamplingStrategy::Radius(params));
    for hood in &hoods {
        assert!(!hood.edges().is_empty());
        for edge in hood.edges() {
            assert!(edge.start < edge.end);
            assert!(hood.contains(edge.start) && hood.contains(edge.end));
            assert!(edge.hop.is_none());
        }
    }
}

#[test]
fn hop_mode_walks_a_path() {
    let sites = (0..10_u64)
        .map(|id| {
            #[expect(clippy::cast_precision_loss, reason = "small fixture ids")]
            let x = id as f64 * 10.0;
            Site::new(SiteId::new(id), square(x, 0.0, 2.0)).with_label(Some(ClassLabel::new(0)))
        })
        .collect();
    let table = SiteTable::new("path", sites).expect("unique ids");
    let strategy = SamplingStrategy::Hop(HopParams::new(2).expect("two hops are valid"));
    let (hoods, _) = run(&table, &seeds(&table, &[5]), strategy);

    let hood = &hoods[0];
    let members: Vec<(u64, Option<u32>, bool)> = hood
        .members()
        .iter()
        .map(|m| (m.site.get(), m.hop, m.is_center))
        .collect();
    assert_eq!(
        members,
        vec![
            (3, Some(2), false),
            (4, Some(1), false),
            (5, Some(0), true),
            (6, Some(1), false),
            (7, Some(2), false),
        ]
    );
    let edges: Vec<(u64, u64, Option<u32>)> = hood
        .edges()
        .iter()
        .map(|e| (e.start.get(), e.end.get(), e.hop))
        .collect();
    assert_eq!(
        edges,
        vec![
            (3, 4, Some(1)),
            (4, 5, Some(0)),
            (5, 6, Some(0)),
            (6, 7, Some(1)),
        ]
    );
    assert!(hood.edges().iter().all(|e| (e.distance - 10.0).abs() < 1e-9));
}

/// Delegates to a real index but refuses one seed.
struct RefusingAdapter {
    inner: FootprintIndex,
    refused: SiteId,
}

impl GeometryAdapter for RefusingAdapter {
    fn centroid(&self, site: SiteId) -> core::result::Result<Coord<f64>, GeometryError> {
        self.inner.centroid(site)
    }

    fn sites_within(
        &self,
        seed: SiteId,
        radius: f64,
    ) -> core::result::Result<Vec<SiteId>, GeometryError> {
        if seed == self.refused {
            return Err(GeometryError::UnknownSite { site: seed });
        }
        self.inner.sites_within(seed, radius)
    }
}

#[rstest]
fn geometry_failures_skip_the_seed(grid: SiteTable) {
    let (inner, _) = FootprintIndex::new(&grid);
    let adapter = RefusingAdapter {
        inner,
        refused: SiteId::new(11),
    };
    let sampler = NeighborhoodSampler::new(&adapter, &DelaunayTriangulator, radius_strategy(10.0, 10.0, 50.0, 5));
    let mut report = RunReport::default();
    let hoods = sampler
        .sample(&grid, &seeds(&grid, &[11, 77]), &mut report)
        .expect("sampling succeeds");
    assert_eq!(hoods.len(), 1);
    assert_eq!(hoods[0].seed(), SiteId::new(77));
    assert_eq!(
        report.skipped_sites().cloned().collect::<Vec<_>>(),
        vec![GeometryError::UnknownSite { site: SiteId::new(11) }]
    );
}

#[rstest]
#[case::zero_initial(0.0, 10.0, 100.0, 5)]
#[case::negative_step(10.0, -1.0, 100.0, 5)]
#[case::ceiling_below_initial(10.0, 10.0, 5.0, 5)]
#[case::infinite_ceiling(10.0, 10.0, f64::INFINITY, 5)]
fn rejects_invalid_radius_parameters(
    #[case] initial: f64,
    #[case] step: f64,
    #[case] max: f64,
    #[case] min_sites: usize,
) {
    let err = RadiusParams::new(initial, step, max, min_sites).expect_err("parameters are invalid");
    assert!(matches!(err, SiteGraphError::InvalidRadius { .. }));
}

#[test]
fn rejects_zero_thresholds() {
    assert_eq!(
        RadiusParams::new(10.0, 10.0, 100.0, 0),
        Err(SiteGraphError::InvalidMinSites { got: 0 })
    );
    assert_eq!(HopParams::new(0), Err(SiteGraphError::InvalidMaxHops { got: 0 }));
}
