//! Tests for the triangulation edge builder.

use super::*;
use rstest::rstest;

fn coord(x: f64, y: f64) -> Coord<f64> {
    Coord { x, y }
}

fn pairs(edges: &EdgeSet) -> Vec<(u64, u64)> {
    edges
        .as_slice()
        .iter()
        .map(|edge| (edge.start.get(), edge.end.get()))
        .collect()
}

/// Replays a fixed segment list regardless of input.
struct ScriptedTriangulator(Vec<Segment>);

impl Triangulator for ScriptedTriangulator {
    fn triangulate(&self, _points: &[Coord<f64>]) -> Result<Vec<Segment>> {
        Ok(self.0.clone())
    }
}

#[rstest]
#[case::empty(&[])]
#[case::single(&[(0.0, 0.0)])]
#[case::same_point_twice(&[(1.0, 1.0), (1.0, 1.0)])]
fn degenerate_inputs_have_no_segments(#[case] points: &[(f64, f64)]) {
    let points: Vec<Coord<f64>> = points.iter().map(|&(x, y)| coord(x, y)).collect();
    let segments = DelaunayTriangulator
        .triangulate(&points)
        .expect("degenerate input is not an error");
    assert!(segments.is_empty());
}

#[test]
fn unit_square_has_five_edges() {
    let sites = [
        (SiteId::new(1), coord(0.0, 0.0)),
        (SiteId::new(2), coord(1.0, 0.0)),
        (SiteId::new(3), coord(1.0, 1.0)),
        (SiteId::new(4), coord(0.0, 1.2)),
    ];
    let edges = TriangulationEdgeBuilder::new(&DelaunayTriangulator)
        .build(&sites)
        .expect("triangulation succeeds");
    assert_eq!(edges.len(), 5);
    assert!(
        edges
            .as_slice()
            .iter()
            .all(|edge| edge.start < edge.end && edge.distance > 0.0)
    );
    let hull: Vec<(u64, u64)> = vec![(1, 2), (1, 4), (2, 3), (3, 4)];
    let found = pairs(&edges);
    for pair in hull {
        assert!(found.contains(&pair), "missing hull edge {pair:?}");
    }
}

#[test]
fn collinear_points_form_a_path() {
    let sites: Vec<(SiteId, Coord<f64>)> = (0..4_u64)
        .map(|id| {
            #[expect(clippy::cast_precision_loss, reason = "small fixture ids")]
            let x = id as f64;
            (SiteId::new(id), coord(x, 0.0))
        })
        .collect();
    let edges = TriangulationEdgeBuilder::new(&DelaunayTriangulator)
        .build(&sites)
        .expect("collinear input triangulates");
    assert_eq!(pairs(&edges), vec![(0, 1), (1, 2), (2, 3)]);
}

#[test]
fn shared_centroids_fan_out_without_self_pairs() {
    let sites = [
        (SiteId::new(5), coord(0.0, 0.0)),
        (SiteId::new(6), coord(0.0, 0.0)),
        (SiteId::new(7), coord(3.0, 4.0)),
    ];
    let edges = TriangulationEdgeBuilder::new(&DelaunayTriangulator)
        .build(&sites)
        .expect("triangulation succeeds");
    assert_eq!(pairs(&edges), vec![(5, 7), (6, 7)]);
    assert!(
        edges
            .as_slice()
            .iter()
            .all(|edge| (edge.distance - 5.0).abs() < 1e-12)
    );
}

#[test]
fn keeps_shortest_distance_per_pair() {
    let scripted = ScriptedTriangulator(vec![
        Segment {
            start: coord(0.0, 0.0),
            end: coord(2.0, 0.0),
        },
        Segment {
            start: coord(2.0, 0.0),
            end: coord(0.0, 0.0),
        },
        Segment {
            start: coord(0.0, 0.0),
            end: coord(9.0, 9.0),
        },
    ]);
    let sites = [
        (SiteId::new(2), coord(2.0, 0.0)),
        (SiteId::new(1), coord(0.0, 0.0)),
    ];
    let edges = TriangulationEdgeBuilder::new(&scripted)
        .build(&sites)
        .expect("scripted triangulation succeeds");
    assert_eq!(
        edges.as_slice(),
        &[SiteEdge {
            start: SiteId::new(1),
            end: SiteId::new(2),
            distance: 2.0,
        }]
    );
}

#[test]
fn negative_zero_matches_positive_zero() {
    let scripted = ScriptedTriangulator(vec![Segment {
        start: coord(-0.0, 0.0),
        end: coord(1.0, 0.0),
    }]);
    let sites = [
        (SiteId::new(1), coord(0.0, 0.0)),
        (SiteId::new(2), coord(1.0, 0.0)),
    ];
    let edges = TriangulationEdgeBuilder::new(&scripted)
        .build(&sites)
        .expect("scripted triangulation succeeds");
    assert_eq!(pairs(&edges), vec![(1, 2)]);
}

#[test]
fn adjacency_is_symmetric_and_sorted() {
    let sites = [
        (SiteId::new(1), coord(0.0, 0.0)),
        (SiteId::new(2), coord(1.0, 0.0)),
        (SiteId::new(3), coord(2.0, 0.0)),
    ];
    let edges = TriangulationEdgeBuilder::new(&DelaunayTriangulator)
        .build(&sites)
        .expect("triangulation succeeds");
    let adjacency = edges.adjacency();
    assert_eq!(adjacency[&SiteId::new(2)], vec![SiteId::new(1), SiteId::new(3)]);
    assert_eq!(adjacency[&SiteId::new(1)], vec![SiteId::new(2)]);
    let kept = edges.restrict(|site| site != SiteId::new(3));
    assert_eq!(kept.len(), 1);
}
