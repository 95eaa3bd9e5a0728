//! Delaunay edges between site centroids.
//!
//! The triangulation primitive only sees coordinates. Its output segments
//! are mapped back to site identifiers by an exact coordinate join, so sites
//! sharing a centroid all pick up the edges incident to that point.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use geo::Coord;
use spade::{DelaunayTriangulation, Point2, Triangulation};
use tracing::{debug, instrument};

use crate::{
    error::{Result, SiteGraphError},
    preparation::normalise_zero,
    site::SiteId,
};

#[cfg(test)]
mod tests;

/// A straight segment between two triangulation vertices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// First endpoint.
    pub start: Coord<f64>,
    /// Second endpoint.
    pub end: Coord<f64>,
}

impl Segment {
    /// Euclidean length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end.x - self.start.x).hypot(self.end.y - self.start.y)
    }
}

/// 2-D Delaunay triangulation primitive.
pub trait Triangulator: Sync {
    /// Returns the undirected edges of the triangulation of `points`.
    ///
    /// Duplicate points are treated as one vertex. Fewer than two distinct
    /// points yield no edges.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::Triangulation`] when the backend rejects the
    /// input.
    fn triangulate(&self, points: &[Coord<f64>]) -> Result<Vec<Segment>>;
}

/// [`Triangulator`] backed by `spade`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelaunayTriangulator;

impl Triangulator for DelaunayTriangulator {
    fn triangulate(&self, points: &[Coord<f64>]) -> Result<Vec<Segment>> {
        let mut seen = HashSet::with_capacity(points.len());
        let vertices: Vec<Point2<f64>> = points
            .iter()
            .filter(|point| seen.insert(CoordKey::from(**point)))
            .map(|point| Point2::new(point.x, point.y))
            .collect();
        if vertices.len() < 2 {
            return Ok(Vec::new());
        }
        let triangulation = DelaunayTriangulation::<Point2<f64>>::bulk_load(vertices).map_err(
            |error| SiteGraphError::Triangulation {
                message: Arc::from(format!("{error:?}")),
            },
        )?;
        Ok(triangulation
            .undirected_edges()
            .map(|edge| {
                let [from, to] = edge.vertices();
                let (from, to) = (from.position(), to.position());
                Segment {
                    start: Coord { x: from.x, y: from.y },
                    end: Coord { x: to.x, y: to.y },
                }
            })
            .collect())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct CoordKey(u64, u64);

impl From<Coord<f64>> for CoordKey {
    fn from(coord: Coord<f64>) -> Self {
        Self(
            normalise_zero(coord.x).to_bits(),
            normalise_zero(coord.y).to_bits(),
        )
    }
}

/// Undirected edge between two sites with `start < end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SiteEdge {
    /// Lower endpoint.
    pub start: SiteId,
    /// Higher endpoint.
    pub end: SiteId,
    /// Euclidean distance between the endpoint centroids.
    pub distance: f64,
}

/// Canonical edge list sorted by `(start, end)` with one entry per pair.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeSet {
    edges: Vec<SiteEdge>,
}

impl EdgeSet {
    /// Returns the edges in `(start, end)` order.
    #[must_use]
    #[rustfmt::skip]
    pub fn as_slice(&self) -> &[SiteEdge] { &self.edges }

    /// Returns the number of edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.edges.len() }

    /// Returns `true` when there are no edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.edges.is_empty() }

    /// Returns the edges whose endpoints both satisfy `keep`.
    pub fn restrict(&self, mut keep: impl FnMut(SiteId) -> bool) -> Vec<SiteEdge> {
        self.edges
            .iter()
            .filter(|edge| keep(edge.start) && keep(edge.end))
            .copied()
            .collect()
    }

    /// Builds a sorted adjacency list for breadth-first traversal.
    #[must_use]
    pub fn adjacency(&self) -> HashMap<SiteId, Vec<SiteId>> {
        let mut adjacency: HashMap<SiteId, Vec<SiteId>> = HashMap::new();
        for edge in &self.edges {
            adjacency.entry(edge.start).or_default().push(edge.end);
            adjacency.entry(edge.end).or_default().push(edge.start);
        }
        for neighbours in adjacency.values_mut() {
            neighbours.sort_unstable();
        }
        adjacency
    }
}

/// Turns site centroids into a canonical [`EdgeSet`].
#[derive(Clone, Copy, Debug)]
pub struct TriangulationEdgeBuilder<'a, T> {
    triangulator: &'a T,
}

impl<'a, T: Triangulator> TriangulationEdgeBuilder<'a, T> {
    /// Wraps a triangulation primitive.
    #[must_use]
    pub const fn new(triangulator: &'a T) -> Self {
        Self { triangulator }
    }

    /// Triangulates `sites` and maps each segment back to site pairs.
    ///
    /// Self pairs are dropped and, when several segments connect the same
    /// pair, the shortest distance wins.
    ///
    /// # Errors
    /// Propagates [`SiteGraphError::Triangulation`] from the primitive.
    #[instrument(name = "core.triangulate", skip(self, sites), fields(sites = sites.len()))]
    pub fn build(&self, sites: &[(SiteId, Coord<f64>)]) -> Result<EdgeSet> {
        let mut by_coord: HashMap<CoordKey, Vec<SiteId>> = HashMap::with_capacity(sites.len());
        for &(id, centroid) in sites {
            by_coord.entry(CoordKey::from(centroid)).or_default().push(id);
        }
        let points: Vec<Coord<f64>> = sites.iter().map(|&(_, centroid)| centroid).collect();
        let segments = self.triangulator.triangulate(&points)?;

        let mut shortest: BTreeMap<(SiteId, SiteId), f64> = BTreeMap::new();
        let mut unmatched = 0_usize;
        for segment in &segments {
            let (Some(starts), Some(ends)) = (
                by_coord.get(&CoordKey::from(segment.start)),
                by_coord.get(&CoordKey::from(segment.end)),
            ) else {
                unmatched += 1;
                continue;
            };
            let distance = segment.length();
            for &a in starts {
                for &b in ends {
                    if a == b {
                        continue;
                    }
                    let key = if a < b { (a, b) } else { (b, a) };
                    shortest
                        .entry(key)
                        .and_modify(|current| *current = current.min(distance))
                        .or_insert(distance);
                }
            }
        }
        if unmatched > 0 {
            debug!(unmatched, "triangulation segments did not map to any site");
        }
        let edges = shortest
            .into_iter()
            .map(|((start, end), distance)| SiteEdge {
                start,
                end,
                distance,
            })
            .collect();
        Ok(EdgeSet { edges })
    }
}
