//! Footprint fixtures shared by the integration suites.
#![allow(dead_code, reason = "each suite uses a different subset of fixtures")]

use std::collections::{BTreeMap, BTreeSet};

use geo::{Polygon, polygon};
use sitegraph_core::{ClassLabel, Dataset, NeighborhoodId, Site, SiteId, SiteTable, Split};

/// Axis-aligned square with lower-left corner `(x, y)`.
#[must_use]
pub fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
    polygon![
        (x: x, y: y),
        (x: x + side, y: y),
        (x: x + side, y: y + side),
        (x: x, y: y + side),
    ]
}

/// A labeled `side`-wide square whose lower-left corner is `(x, y)`.
#[must_use]
pub fn labeled(id: u64, x: f64, y: f64, side: f64) -> Site {
    #[expect(clippy::cast_possible_truncation, reason = "fixture ids are small")]
    let label = ClassLabel::new((id % 3) as u32);
    Site::new(SiteId::new(id), square(x, y, side)).with_label(Some(label))
}

/// `cols * rows` labeled 2x2 squares; site `row * cols + col` sits at
/// `(col * pitch, row * pitch)`.
#[must_use]
pub fn grid(cols: u32, rows: u32, pitch: f64) -> Vec<Site> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .map(|(row, col)| {
            let id = u64::from(row * cols + col);
            labeled(id, f64::from(col) * pitch, f64::from(row) * pitch, 2.0)
        })
        .collect()
}

/// `count` labeled squares along the x axis.
#[must_use]
pub fn row(count: u32, pitch: f64) -> Vec<Site> {
    grid(count, 1, pitch)
}

#[must_use]
pub fn table(sites: Vec<Site>) -> SiteTable {
    SiteTable::new("fixture", sites).expect("fixture ids are unique")
}

/// Usable splits per site.
#[must_use]
pub fn usable_splits(dataset: &Dataset) -> BTreeMap<SiteId, BTreeSet<Split>> {
    let mut usable: BTreeMap<SiteId, BTreeSet<Split>> = BTreeMap::new();
    for row in dataset.split_mask_rows().into_iter().filter(|row| row.usable) {
        usable.entry(row.site_id).or_default().insert(row.split);
    }
    usable
}

/// Asserts the structural guarantees every dataset must satisfy.
pub fn assert_dataset_invariants(dataset: &Dataset) {
    for (site, splits) in usable_splits(dataset) {
        assert!(splits.len() <= 1, "site {site} is usable in {splits:?}");
    }

    for hood in dataset.neighborhoods() {
        assert!(hood.contains(hood.seed()), "center missing from {}", hood.id());
        let centers: Vec<SiteId> = hood
            .members()
            .iter()
            .filter(|member| member.is_center)
            .map(|member| member.site)
            .collect();
        assert_eq!(centers, vec![hood.seed()]);

        let own = dataset
            .assignment()
            .split_of(hood.id())
            .expect("every neighbourhood has a split");
        assert!(
            dataset.split_mask_rows().iter().any(|row| {
                row.neighborhood_id == hood.id() && row.site_id == hood.seed() && row.usable
                    && row.split == own
            }),
            "center of {} is not usable in its own split",
            hood.id()
        );

        let mut pairs = BTreeSet::new();
        for edge in hood.edges() {
            assert!(hood.contains(edge.start) && hood.contains(edge.end));
            assert!(edge.start < edge.end, "edges are stored with ordered endpoints");
            assert!(edge.distance.is_finite() && edge.distance > 0.0);
            assert!(pairs.insert((edge.start, edge.end)), "duplicate edge in {}", hood.id());
        }
    }

    for row in dataset.membership_rows() {
        assert!(!row.neighborhood_ids.is_empty());
        assert!(row.neighborhood_ids.windows(2).all(|pair| pair[0] < pair[1]));
        for id in &row.neighborhood_ids {
            let hood = neighborhood(dataset, *id);
            assert!(hood.contains(row.site_id));
        }
    }
}

#[must_use]
pub fn neighborhood(dataset: &Dataset, id: NeighborhoodId) -> &sitegraph_core::Neighborhood {
    dataset
        .neighborhoods()
        .iter()
        .find(|hood| hood.id() == id)
        .expect("neighbourhood id is known")
}
