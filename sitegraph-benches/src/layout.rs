//! Synthetic site layouts.
//!
//! Sites are square footprints on a jittered grid so that density stays even
//! and every benchmark size exercises the same neighbourhood shape.

use geo::{LineString, Polygon};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use sitegraph_core::{ClassLabel, Site, SiteId, SiteTable};

use crate::error::BenchSetupError;

/// Number of distinct class labels drawn for labeled sites.
const LABEL_CLASSES: u32 = 4;

/// Shape of a synthetic layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Grid columns.
    pub columns: usize,
    /// Grid rows.
    pub rows: usize,
    /// Distance between neighbouring cell origins.
    pub pitch: f64,
    /// Side length of each square footprint.
    pub side: f64,
    /// Maximum random offset applied to each footprint along both axes.
    pub jitter: f64,
    /// Probability that a site carries a class label.
    pub labeled_fraction: f64,
    /// Seed for placement and labels.
    pub seed: u64,
}

impl LayoutConfig {
    /// A `columns` x `rows` layout with a pitch of 10 and 4x4 footprints.
    #[must_use]
    pub const fn grid(columns: usize, rows: usize, seed: u64) -> Self {
        Self {
            columns,
            rows,
            pitch: 10.0,
            side: 4.0,
            jitter: 2.0,
            labeled_fraction: 0.8,
            seed,
        }
    }

    /// Total number of sites the layout produces.
    #[must_use]
    pub const fn site_count(&self) -> usize {
        self.columns.saturating_mul(self.rows)
    }

    fn validate(&self) -> Result<(), BenchSetupError> {
        if self.columns == 0 {
            return Err(BenchSetupError::ZeroValue { context: "columns" });
        }
        if self.rows == 0 {
            return Err(BenchSetupError::ZeroValue { context: "rows" });
        }
        let checks = [
            ("pitch", self.pitch.is_finite() && self.pitch > 0.0),
            ("side", self.side.is_finite() && self.side > 0.0),
            ("jitter", self.jitter.is_finite() && self.jitter >= 0.0),
            (
                "labeled_fraction",
                (0.0..=1.0).contains(&self.labeled_fraction),
            ),
            ("side", self.fits_in_cell()),
        ];
        match checks.into_iter().find(|&(_, ok)| !ok) {
            Some((parameter, _)) => Err(BenchSetupError::InvalidFloatParameter { parameter }),
            None => Ok(()),
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "footprints plus jitter must stay inside one cell"
    )]
    fn fits_in_cell(&self) -> bool {
        self.side + self.jitter < self.pitch
    }
}

/// Builds the site table described by `config`.
///
/// Identifiers run row-major from zero. The same config always yields the
/// same table.
///
/// # Errors
/// Returns [`BenchSetupError`] when the config has a zero dimension, a
/// non-finite or non-positive length, footprints that would overlap, or a
/// labeled fraction outside `[0, 1]`.
pub fn generate(config: &LayoutConfig) -> Result<SiteTable, BenchSetupError> {
    config.validate()?;
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let cells = (0..config.rows).flat_map(|row| (0..config.columns).map(move |col| (col, row)));
    let sites: Vec<Site> = cells
        .zip(0_u64..)
        .map(|((col, row), id)| {
            let (x, y) = cell_origin(config, col, row, &mut rng);
            let label = rng
                .gen_bool(config.labeled_fraction)
                .then(|| ClassLabel::new(rng.gen_range(0..LABEL_CLASSES)));
            Site::new(SiteId::new(id), square(x, y, config.side)).with_label(label)
        })
        .collect();
    Ok(SiteTable::new("synthetic", sites)?)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "grid indices stay far below 2^52"
)]
#[expect(
    clippy::float_arithmetic,
    reason = "cell origins are pitch multiples plus jitter"
)]
fn cell_origin(config: &LayoutConfig, col: usize, row: usize, rng: &mut SmallRng) -> (f64, f64) {
    let x = col as f64 * config.pitch + rng.gen_range(0.0..=config.jitter);
    let y = row as f64 * config.pitch + rng.gen_range(0.0..=config.jitter);
    (x, y)
}

#[expect(clippy::float_arithmetic, reason = "square corners are offsets")]
fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (x, y),
            (x + side, y),
            (x + side, y + side),
            (x, y + side),
            (x, y),
        ]),
        Vec::new(),
    )
}
