//! Geometry adapter seam and the default `geo` + `rstar` implementation.

use std::collections::HashMap;

use geo::{BoundingRect, Centroid, Coord, Euclidean, Polygon, line_measures::Distance};
use rayon::prelude::*;
use rstar::{
    AABB, RTree,
    primitives::{GeomWithData, Rectangle},
};

use crate::{
    error::GeometryError,
    site::{SiteId, SiteTable},
};

/// Spatial queries the neighbourhood sampler depends on.
///
/// Implementations must be deterministic: the same inputs always yield the
/// same answers, and result lists are ordered by ascending [`SiteId`].
pub trait GeometryAdapter: Sync {
    /// Returns the centroid of `site`'s footprint.
    ///
    /// # Errors
    /// Returns [`GeometryError::UnknownSite`] when the site is not indexed.
    fn centroid(&self, site: SiteId) -> Result<Coord<f64>, GeometryError>;

    /// Returns every indexed site whose footprint intersects the
    /// `radius`-buffer of `seed`'s footprint, including `seed` itself.
    ///
    /// # Errors
    /// Returns [`GeometryError::UnknownSite`] when `seed` is not indexed.
    fn sites_within(&self, seed: SiteId, radius: f64) -> Result<Vec<SiteId>, GeometryError>;

    /// Batched form of [`GeometryAdapter::sites_within`].
    ///
    /// The returned vector is aligned with `seeds`.
    fn sites_within_batch(
        &self,
        seeds: &[SiteId],
        radius: f64,
    ) -> Vec<Result<Vec<SiteId>, GeometryError>> {
        seeds
            .par_iter()
            .map(|&seed| self.sites_within(seed, radius))
            .collect()
    }
}

type FootprintEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

#[derive(Debug)]
struct IndexedFootprint {
    id: SiteId,
    footprint: Polygon<f64>,
    centroid: Coord<f64>,
    envelope: AABB<[f64; 2]>,
}

/// R-tree backed [`GeometryAdapter`] over a prepared site table.
///
/// Candidate sites are found by bounding-box overlap with the buffered seed
/// envelope and then filtered by exact polygon-to-polygon distance.
#[derive(Debug)]
pub struct FootprintIndex {
    footprints: Vec<IndexedFootprint>,
    positions: HashMap<SiteId, usize>,
    tree: RTree<FootprintEnvelope>,
}

impl FootprintIndex {
    /// Indexes every site in `sites` that has a bounding box and centroid.
    ///
    /// Sites lacking either are returned alongside the index as
    /// [`GeometryError::MissingCentroid`] values.
    #[must_use]
    pub fn new(sites: &SiteTable) -> (Self, Vec<GeometryError>) {
        let mut footprints = Vec::with_capacity(sites.len());
        let mut skipped = Vec::new();
        for site in sites.iter() {
            let footprint = site.footprint();
            match (footprint.centroid(), footprint.bounding_rect()) {
                (Some(centroid), Some(rect)) => footprints.push(IndexedFootprint {
                    id: site.id(),
                    footprint: footprint.clone(),
                    centroid: centroid.0,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                }),
                _ => skipped.push(GeometryError::MissingCentroid { site: site.id() }),
            }
        }
        let positions = footprints
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.id, position))
            .collect();
        let envelopes = footprints
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                GeomWithData::new(
                    Rectangle::from_corners(entry.envelope.lower(), entry.envelope.upper()),
                    position,
                )
            })
            .collect();
        let index = Self {
            footprints,
            positions,
            tree: RTree::bulk_load(envelopes),
        };
        (index, skipped)
    }

    /// Returns the number of indexed footprints.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.footprints.len() }

    /// Returns `true` when no footprints are indexed.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.footprints.is_empty() }

    fn entry(&self, site: SiteId) -> Result<&IndexedFootprint, GeometryError> {
        self.positions
            .get(&site)
            .map(|&position| &self.footprints[position])
            .ok_or(GeometryError::UnknownSite { site })
    }
}

impl GeometryAdapter for FootprintIndex {
    fn centroid(&self, site: SiteId) -> Result<Coord<f64>, GeometryError> {
        self.entry(site).map(|entry| entry.centroid)
    }

    fn sites_within(&self, seed: SiteId, radius: f64) -> Result<Vec<SiteId>, GeometryError> {
        let origin = self.entry(seed)?;
        let lower = origin.envelope.lower();
        let upper = origin.envelope.upper();
        let search = AABB::from_corners(
            [lower[0] - radius, lower[1] - radius],
            [upper[0] + radius, upper[1] + radius],
        );
        let mut members: Vec<SiteId> = self
            .tree
            .locate_in_envelope_intersecting(&search)
            .filter_map(|candidate| {
                let entry = &self.footprints[candidate.data];
                let within = entry.id == seed
                    || Euclidean.distance(&origin.footprint, &entry.footprint) <= radius;
                within.then_some(entry.id)
            })
            .collect();
        members.sort_unstable();
        Ok(members)
    }
}
