//! Site cleaning ahead of sampling.
//!
//! Removes footprints the sampler cannot reason about: empty or non-finite
//! rings, slivers at or below the minimum area, exact duplicates, and
//! footprints nested inside another site.

use std::collections::{HashMap, HashSet};

use geo::{Area, BoundingRect, Centroid, Contains, Polygon};
use rayon::prelude::*;
use rstar::{
    AABB, RTree,
    primitives::{GeomWithData, Rectangle},
};
use tracing::{debug, instrument};

use crate::{
    error::GeometryError,
    site::{Site, SiteId, SiteTable},
};

/// Default exclusive lower bound on footprint area.
pub const DEFAULT_MIN_AREA: f64 = 1.0;

/// Filters a raw site table into the subset used for sampling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SitePreparer {
    min_area: f64,
    drop_nested: bool,
}

impl Default for SitePreparer {
    fn default() -> Self {
        Self {
            min_area: DEFAULT_MIN_AREA,
            drop_nested: true,
        }
    }
}

/// Output of [`SitePreparer::prepare`].
#[derive(Clone, Debug)]
pub struct PreparedSites {
    /// Sites that survived cleaning.
    pub table: SiteTable,
    /// One entry per discarded site, ordered by site id.
    pub skipped: Vec<GeometryError>,
}

impl SitePreparer {
    /// Creates a preparer with explicit thresholds.
    #[must_use]
    pub const fn new(min_area: f64, drop_nested: bool) -> Self {
        Self {
            min_area,
            drop_nested,
        }
    }

    /// Returns the exclusive minimum area.
    #[must_use]
    #[rustfmt::skip]
    pub const fn min_area(&self) -> f64 { self.min_area }

    /// Returns whether nested footprints are removed.
    #[must_use]
    #[rustfmt::skip]
    pub const fn drop_nested(&self) -> bool { self.drop_nested }

    /// Cleans `sites`, returning the kept table and the skip reasons.
    #[instrument(name = "core.prepare", skip(self, sites), fields(sites = sites.len()))]
    pub fn prepare(&self, sites: &SiteTable) -> PreparedSites {
        let mut skipped: Vec<GeometryError> = sites
            .sites()
            .par_iter()
            .filter_map(|site| self.validate(site).err())
            .collect();
        let mut rejected: HashSet<SiteId> = skipped.iter().map(GeometryError::site).collect();

        // Ascending id order keeps the lowest id of each duplicate group.
        let mut first_owner: HashMap<Vec<(u64, u64)>, SiteId> = HashMap::new();
        for site in sites.iter().filter(|site| !rejected.contains(&site.id())) {
            let key = ring_key(site.footprint());
            if let Some(&original) = first_owner.get(&key) {
                skipped.push(GeometryError::DuplicateGeometry {
                    site: site.id(),
                    original,
                });
            } else {
                first_owner.insert(key, site.id());
            }
        }
        rejected.extend(skipped.iter().map(GeometryError::site));

        if self.drop_nested {
            let survivors: Vec<&Site> = sites
                .iter()
                .filter(|site| !rejected.contains(&site.id()))
                .collect();
            let nested = nested_footprints(&survivors);
            rejected.extend(nested.iter().map(GeometryError::site));
            skipped.extend(nested);
        }

        skipped.sort_by_key(GeometryError::site);
        let table = sites.retain(|site| !rejected.contains(&site.id()));
        debug!(kept = table.len(), skipped = skipped.len(), "prepared sites");
        PreparedSites { table, skipped }
    }

    fn validate(&self, site: &Site) -> Result<(), GeometryError> {
        let id = site.id();
        let footprint = site.footprint();
        if footprint.exterior().0.is_empty() {
            return Err(GeometryError::EmptyPolygon { site: id });
        }
        let finite = footprint
            .exterior()
            .coords()
            .chain(footprint.interiors().iter().flat_map(|ring| ring.coords()))
            .all(|c| c.x.is_finite() && c.y.is_finite());
        if !finite {
            return Err(GeometryError::NonFiniteCoordinate { site: id });
        }
        let area = footprint.unsigned_area();
        if area <= self.min_area {
            return Err(GeometryError::DegenerateArea {
                site: id,
                area,
                min_area: self.min_area,
            });
        }
        if footprint.centroid().is_none() {
            return Err(GeometryError::MissingCentroid { site: id });
        }
        Ok(())
    }
}

fn ring_key(footprint: &Polygon<f64>) -> Vec<(u64, u64)> {
    footprint
        .exterior()
        .coords()
        .map(|c| (normalise_zero(c.x).to_bits(), normalise_zero(c.y).to_bits()))
        .collect()
}

pub(crate) fn normalise_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

fn nested_footprints(sites: &[&Site]) -> Vec<GeometryError> {
    let envelopes: Vec<GeomWithData<Rectangle<[f64; 2]>, usize>> = sites
        .iter()
        .enumerate()
        .filter_map(|(position, site)| {
            site.footprint().bounding_rect().map(|rect| {
                GeomWithData::new(
                    Rectangle::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                    position,
                )
            })
        })
        .collect();
    let tree = RTree::bulk_load(envelopes);
    sites
        .par_iter()
        .filter_map(|site| {
            let rect = site.footprint().bounding_rect()?;
            let envelope =
                AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
            tree.locate_in_envelope_intersecting(&envelope)
                .map(|candidate| sites[candidate.data])
                .filter(|other| other.id() != site.id())
                .filter(|other| other.footprint().contains(site.footprint()))
                .map(|other| other.id())
                .min()
                .map(|container| GeometryError::NestedFootprint {
                    site: site.id(),
                    container,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::GeometryErrorCode, test_utils::square};
    use geo::{LineString, polygon};

    fn table(sites: Vec<Site>) -> SiteTable {
        SiteTable::new("sites", sites).expect("fixture ids are unique")
    }

    #[test]
    fn keeps_clean_sites() {
        let sites = table(vec![
            Site::new(SiteId::new(1), square(0.0, 0.0, 2.0)),
            Site::new(SiteId::new(2), square(10.0, 0.0, 2.0)),
        ]);
        let prepared = SitePreparer::default().prepare(&sites);
        assert_eq!(prepared.table.len(), 2);
        assert!(prepared.skipped.is_empty());
    }

    #[test]
    fn drops_slivers_and_empty_rings() {
        let empty = Polygon::new(LineString::new(Vec::new()), Vec::new());
        let sites = table(vec![
            Site::new(SiteId::new(1), square(0.0, 0.0, 1.0)),
            Site::new(SiteId::new(2), empty),
            Site::new(SiteId::new(3), square(10.0, 0.0, 2.0)),
        ]);
        let prepared = SitePreparer::default().prepare(&sites);
        let codes: Vec<GeometryErrorCode> = prepared.skipped.iter().map(GeometryError::code).collect();
        assert_eq!(
            codes,
            vec![GeometryErrorCode::DegenerateArea, GeometryErrorCode::EmptyPolygon]
        );
        assert!(prepared.table.contains(SiteId::new(3)));
    }

    #[test]
    fn drops_non_finite_rings() {
        let broken = polygon![
            (x: 0.0, y: 0.0),
            (x: f64::NAN, y: 0.0),
            (x: 3.0, y: 3.0),
            (x: 0.0, y: 3.0),
        ];
        let sites = table(vec![Site::new(SiteId::new(4), broken)]);
        let prepared = SitePreparer::default().prepare(&sites);
        assert_eq!(
            prepared.skipped,
            vec![GeometryError::NonFiniteCoordinate { site: SiteId::new(4) }]
        );
        assert!(prepared.table.is_empty());
    }

    #[test]
    fn keeps_lowest_id_of_duplicate_footprints() {
        let sites = table(vec![
            Site::new(SiteId::new(9), square(0.0, 0.0, 2.0)),
            Site::new(SiteId::new(4), square(0.0, 0.0, 2.0)),
        ]);
        let prepared = SitePreparer::default().prepare(&sites);
        assert_eq!(
            prepared.skipped,
            vec![GeometryError::DuplicateGeometry {
                site: SiteId::new(9),
                original: SiteId::new(4),
            }]
        );
    }

    #[test]
    fn nested_footprints_are_optional() {
        let sites = table(vec![
            Site::new(SiteId::new(1), square(0.0, 0.0, 10.0)),
            Site::new(SiteId::new(2), square(2.0, 2.0, 3.0)),
        ]);
        let dropped = SitePreparer::default().prepare(&sites);
        assert_eq!(
            dropped.skipped,
            vec![GeometryError::NestedFootprint {
                site: SiteId::new(2),
                container: SiteId::new(1),
            }]
        );
        let kept = SitePreparer::new(DEFAULT_MIN_AREA, false).prepare(&sites);
        assert_eq!(kept.table.len(), 2);
    }
}
