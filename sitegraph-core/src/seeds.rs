//! Seed selection.

use rand::seq::index;
use tracing::{debug, instrument};

use crate::{
    error::{Result, SiteGraphError},
    rng::{RngStream, stream_rng},
    site::{SiteId, SiteTable},
};

/// Default fraction of sites drawn as seeds.
pub const DEFAULT_SEED_FRACTION: f64 = 0.01;

/// Distinct seed sites in ascending identifier order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SeedSet {
    seeds: Vec<SiteId>,
}

impl SeedSet {
    /// Draws `floor(sites.len() * fraction)` seeds from the labeled sites.
    ///
    /// The draw is a uniform sample without replacement from a stream
    /// derived from `base_seed`; when fewer labeled sites exist than the
    /// requested count, every labeled site becomes a seed.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::InvalidSeedFraction`] for a fraction outside
    /// `(0, 1]` and [`SiteGraphError::EmptySeedSet`] when no seed is drawn.
    #[instrument(name = "core.seeds", skip(sites), fields(sites = sites.len()))]
    pub fn select(sites: &SiteTable, fraction: f64, base_seed: u64) -> Result<Self> {
        if !(fraction.is_finite() && fraction > 0.0 && fraction <= 1.0) {
            return Err(SiteGraphError::InvalidSeedFraction { got: fraction });
        }
        let labeled: Vec<SiteId> = sites
            .iter()
            .filter(|site| site.is_labeled())
            .map(|site| site.id())
            .collect();
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss,
            reason = "fraction is in (0, 1] so the product is a non-negative count"
        )]
        let requested = (sites.len() as f64 * fraction).floor() as usize;
        let count = requested.min(labeled.len());
        if count == 0 {
            return Err(SiteGraphError::EmptySeedSet {
                sites: sites.len(),
                fraction,
            });
        }
        let mut rng = stream_rng(base_seed, RngStream::SeedSelection);
        let mut seeds: Vec<SiteId> = index::sample(&mut rng, labeled.len(), count)
            .into_iter()
            .map(|position| labeled[position])
            .collect();
        seeds.sort_unstable();
        debug!(requested, selected = seeds.len(), "selected seeds");
        Ok(Self { seeds })
    }

    /// Uses caller-provided seeds after checking each is a labeled site.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::UnknownSeed`] or
    /// [`SiteGraphError::UnlabeledSeed`] for an unusable seed, and
    /// [`SiteGraphError::EmptySeedSet`] when `seeds` is empty.
    pub fn from_sites(sites: &SiteTable, seeds: impl IntoIterator<Item = SiteId>) -> Result<Self> {
        let mut seeds: Vec<SiteId> = seeds.into_iter().collect();
        seeds.sort_unstable();
        seeds.dedup();
        if seeds.is_empty() {
            return Err(SiteGraphError::EmptySeedSet {
                sites: sites.len(),
                fraction: 0.0,
            });
        }
        for &seed in &seeds {
            match sites.get(seed) {
                None => return Err(SiteGraphError::UnknownSeed { seed }),
                Some(site) if !site.is_labeled() => {
                    return Err(SiteGraphError::UnlabeledSeed { seed });
                }
                Some(_) => {}
            }
        }
        Ok(Self { seeds })
    }

    /// Returns the seeds in ascending order.
    #[must_use]
    #[rustfmt::skip]
    pub fn as_slice(&self) -> &[SiteId] { &self.seeds }

    /// Returns the number of seeds.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.seeds.len() }

    /// Returns `true` when there are no seeds.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.seeds.is_empty() }

    /// Returns `true` when `site` is a seed.
    #[must_use]
    pub fn contains(&self, site: SiteId) -> bool {
        self.seeds.binary_search(&site).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        site::{ClassLabel, Site},
        test_utils::{grid_table, square},
    };
    use rstest::rstest;

    #[rstest]
    #[case::tenth(0.1, 10)]
    #[case::half(0.5, 50)]
    #[case::everything(1.0, 100)]
    fn draws_floor_of_fraction(#[case] fraction: f64, #[case] expected: usize) {
        let table = grid_table(10, 10, 10.0, 2.0);
        let seeds = SeedSet::select(&table, fraction, 7).expect("labeled grid yields seeds");
        assert_eq!(seeds.len(), expected);
        assert!(seeds.as_slice().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn selection_is_reproducible() {
        let table = grid_table(10, 10, 10.0, 2.0);
        let a = SeedSet::select(&table, 0.2, 99).expect("seeds");
        let b = SeedSet::select(&table, 0.2, 99).expect("seeds");
        let c = SeedSet::select(&table, 0.2, 100).expect("seeds");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn only_labeled_sites_become_seeds() {
        let sites = (0..10_u64)
            .map(|id| {
                #[expect(clippy::cast_precision_loss, reason = "small fixture ids")]
                let x = id as f64 * 10.0;
                let label = (id % 2 == 0).then_some(ClassLabel::new(1));
                Site::new(SiteId::new(id), square(x, 0.0, 2.0)).with_label(label)
            })
            .collect();
        let table = SiteTable::new("sites", sites).expect("table");
        let seeds = SeedSet::select(&table, 1.0, 3).expect("seeds");
        let expected: Vec<SiteId> = (0..10).step_by(2).map(SiteId::new).collect();
        assert_eq!(seeds.as_slice(), expected.as_slice());
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-0.5)]
    #[case::above_one(1.5)]
    #[case::nan(f64::NAN)]
    fn rejects_invalid_fraction(#[case] fraction: f64) {
        let table = grid_table(2, 2, 10.0, 2.0);
        let err = SeedSet::select(&table, fraction, 1).expect_err("fraction is invalid");
        assert!(matches!(err, SiteGraphError::InvalidSeedFraction { .. }));
    }

    #[test]
    fn tiny_fraction_yields_empty_seed_set() {
        let table = grid_table(3, 3, 10.0, 2.0);
        let err = SeedSet::select(&table, 0.01, 1).expect_err("floor(0.09) is zero");
        assert!(matches!(err, SiteGraphError::EmptySeedSet { sites: 9, .. }));
    }

    #[test]
    fn explicit_seeds_must_be_labeled_sites() {
        let table = grid_table(3, 3, 10.0, 2.0);
        assert_eq!(
            SeedSet::from_sites(&table, [SiteId::new(42)]),
            Err(SiteGraphError::UnknownSeed { seed: SiteId::new(42) })
        );
        let seeds = SeedSet::from_sites(&table, [SiteId::new(4), SiteId::new(1), SiteId::new(4)])
            .expect("known seeds");
        assert_eq!(seeds.as_slice(), &[SiteId::new(1), SiteId::new(4)]);
    }
}
