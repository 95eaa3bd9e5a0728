//! Shared test utilities for `sitegraph-core`.

use geo::{Polygon, polygon};
use proptest::test_runner::Config as ProptestConfig;
use sitegraph_test_support::ci::property_test_profile::ProptestRunProfile;

use crate::site::{ClassLabel, Site, SiteId, SiteTable};

/// Builds a standard proptest configuration from the shared CI profile.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Axis-aligned square with lower-left corner `(x, y)`.
#[must_use]
pub(crate) fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
    polygon![
        (x: x, y: y),
        (x: x + side, y: y),
        (x: x + side, y: y + side),
        (x: x, y: y + side),
    ]
}

/// Labeled grid of `cols * rows` squares.
///
/// Site `row * cols + col` sits at `(col * pitch, row * pitch)` and carries
/// label `id % 3`.
#[must_use]
pub(crate) fn grid_table(cols: u64, rows: u64, pitch: f64, side: f64) -> SiteTable {
    let sites = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .map(|(row, col)| {
            let id = row * cols + col;
            #[expect(clippy::cast_precision_loss, reason = "fixture grids are small")]
            let (x, y) = (col as f64 * pitch, row as f64 * pitch);
            #[expect(clippy::cast_possible_truncation, reason = "id % 3 fits in u32")]
            let label = ClassLabel::new((id % 3) as u32);
            Site::new(SiteId::new(id), square(x, y, side)).with_label(Some(label))
        })
        .collect();
    SiteTable::new("grid", sites).unwrap_or_default()
}
