//! Train/validation/test partitioning without label leakage.
//!
//! Seeds are split by a seeded permutation. Every labeled member inherits its
//! neighbourhood's split; sites that inherit more than one split are
//! redistributed by [`ConflictPolicy`], and finally every center is pinned
//! back to its own neighbourhood's split.

use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
};

use rand::seq::SliceRandom;
use tracing::{debug, instrument};

use crate::{
    error::{Result, SiteGraphError},
    membership::MembershipIndex,
    neighborhood::{Neighborhood, NeighborhoodId},
    rng::{RngStream, stream_rng},
    site::{SiteId, SiteTable},
};

mod conflict;

pub use self::conflict::{ConflictPolicy, ConflictSummary};

const RATIO_TOLERANCE: f64 = 1e-9;

/// Default training fraction.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.70;
/// Default validation fraction.
pub const DEFAULT_VALIDATION_RATIO: f64 = 0.15;

/// One of the three dataset partitions.
///
/// Variants are ordered; an "earlier" split compares as smaller.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Split {
    /// Training partition.
    Train,
    /// Validation partition.
    Validation,
    /// Test partition.
    Test,
}

impl Split {
    /// All splits in order.
    pub const ALL: [Self; 3] = [Self::Train, Self::Validation, Self::Test];

    /// Returns the canonical short name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "val",
            Self::Test => "test",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Train => 0b001,
            Self::Validation => 0b010,
            Self::Test => 0b100,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(value: &str) -> core::result::Result<Self, Self::Err> {
        match value {
            "train" => Ok(Self::Train),
            "val" | "validation" => Ok(Self::Validation),
            "test" => Ok(Self::Test),
            other => Err(format!("unknown split `{other}`")),
        }
    }
}

/// Train and validation fractions; test receives the remainder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitRatios {
    train: f64,
    validation: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: DEFAULT_TRAIN_RATIO,
            validation: DEFAULT_VALIDATION_RATIO,
        }
    }
}

impl SplitRatios {
    /// Creates validated ratios.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::InvalidSplitRatios`] unless both fractions
    /// are finite, non-negative, and sum to at most one.
    pub fn new(train: f64, validation: f64) -> Result<Self> {
        let valid = train.is_finite()
            && validation.is_finite()
            && train >= 0.0
            && validation >= 0.0
            && train + validation <= 1.0 + RATIO_TOLERANCE;
        if !valid {
            return Err(SiteGraphError::InvalidSplitRatios { train, validation });
        }
        Ok(Self { train, validation })
    }

    /// Returns the train fraction.
    #[must_use]
    #[rustfmt::skip]
    pub fn train(&self) -> f64 { self.train }

    /// Returns the validation fraction.
    #[must_use]
    #[rustfmt::skip]
    pub fn validation(&self) -> f64 { self.validation }

    /// Remaining test fraction.
    #[must_use]
    pub fn test(&self) -> f64 {
        (1.0 - self.train - self.validation).max(0.0)
    }

    /// Returns the `(train_end, validation_end)` cut points for `count`
    /// items, each the floor of the cumulative fraction.
    #[must_use]
    pub fn boundaries(&self, count: usize) -> (usize, usize) {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss,
            reason = "fractions are validated into [0, 1]"
        )]
        let cut = |fraction: f64| ((count as f64 * fraction).floor() as usize).min(count);
        let train_end = cut(self.train);
        let validation_end = cut(self.train + self.validation).max(train_end);
        (train_end, validation_end)
    }
}

/// One site occurrence inside one neighbourhood after partitioning.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Occurrence {
    /// The member site.
    pub site: SiteId,
    /// The neighbourhood it occurs in.
    pub neighborhood: NeighborhoodId,
    /// Split of that neighbourhood.
    pub split: Split,
    /// `true` when the site is this neighbourhood's center.
    pub is_center: bool,
    /// `true` when the label may be used for training or evaluation here.
    pub usable: bool,
}

/// Result of [`SplitPartitioner::partition`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitAssignment {
    neighborhood_splits: Vec<(NeighborhoodId, Split)>,
    site_splits: HashMap<SiteId, Split>,
    occurrences: Vec<Occurrence>,
    conflicts: ConflictSummary,
}

impl SplitAssignment {
    /// Returns the split of `neighborhood`.
    #[must_use]
    pub fn split_of(&self, neighborhood: NeighborhoodId) -> Option<Split> {
        self.neighborhood_splits
            .iter()
            .find(|(id, _)| *id == neighborhood)
            .map(|&(_, split)| split)
    }

    /// Returns `(neighbourhood, split)` pairs in neighbourhood order.
    #[must_use]
    pub fn neighborhood_splits(&self) -> &[(NeighborhoodId, Split)] {
        &self.neighborhood_splits
    }

    /// Returns the final split of a labeled member site.
    #[must_use]
    pub fn site_split(&self, site: SiteId) -> Option<Split> {
        self.site_splits.get(&site).copied()
    }

    /// Returns every occurrence ordered by neighbourhood then site.
    #[must_use]
    #[rustfmt::skip]
    pub fn occurrences(&self) -> &[Occurrence] { &self.occurrences }

    /// Returns the usability mask for `split`, aligned with
    /// [`SplitAssignment::occurrences`].
    #[must_use]
    pub fn mask(&self, split: Split) -> Vec<bool> {
        self.occurrences
            .iter()
            .map(|occurrence| occurrence.usable && occurrence.split == split)
            .collect()
    }

    /// Counts usable occurrences in `split`.
    #[must_use]
    pub fn usable_count(&self, split: Split) -> usize {
        self.occurrences
            .iter()
            .filter(|occurrence| occurrence.usable && occurrence.split == split)
            .count()
    }

    /// Counts neighbourhoods assigned to `split`.
    #[must_use]
    pub fn neighborhood_count(&self, split: Split) -> usize {
        self.neighborhood_splits
            .iter()
            .filter(|(_, assigned)| *assigned == split)
            .count()
    }

    /// Returns conflict statistics.
    #[must_use]
    #[rustfmt::skip]
    pub fn conflicts(&self) -> ConflictSummary { self.conflicts }
}

/// Assigns seeds and member occurrences to splits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitPartitioner {
    ratios: SplitRatios,
    policy: ConflictPolicy,
    seed: u64,
}

impl SplitPartitioner {
    /// Creates a partitioner drawing from streams derived from `seed`.
    #[must_use]
    pub const fn new(ratios: SplitRatios, policy: ConflictPolicy, seed: u64) -> Self {
        Self {
            ratios,
            policy,
            seed,
        }
    }

    /// Partitions `neighborhoods` using `membership` to find shared sites.
    ///
    /// Only labeled sites, as reported by `sites`, take part in conflict
    /// resolution or become usable.
    #[instrument(name = "core.split", skip_all, fields(neighborhoods = neighborhoods.len()))]
    pub fn partition(
        &self,
        neighborhoods: &[Neighborhood],
        membership: &MembershipIndex,
        sites: &SiteTable,
    ) -> SplitAssignment {
        let neighborhood_splits = self.split_seeds(neighborhoods);
        let by_id: HashMap<NeighborhoodId, Split> = neighborhood_splits.iter().copied().collect();

        let mut site_splits: HashMap<SiteId, Split> = HashMap::new();
        let mut groups = conflict::ConflictGroups::default();
        for (site, hoods) in membership.iter_sorted() {
            if !sites.is_labeled(site) {
                continue;
            }
            let mask = hoods
                .iter()
                .filter_map(|id| by_id.get(id))
                .fold(0_u8, |mask, split| mask | split.bit());
            match conflict::single_split(mask) {
                Some(split) => {
                    site_splits.insert(site, split);
                }
                None => groups.push(mask, site),
            }
        }
        let conflicts = groups.summary();
        site_splits.extend(groups.resolve(&self.policy, self.seed));

        for hood in neighborhoods {
            if let Some(&split) = by_id.get(&hood.id()) {
                site_splits.insert(hood.seed(), split);
            }
        }

        let occurrences = neighborhoods
            .iter()
            .filter_map(|hood| by_id.get(&hood.id()).map(|&split| (hood, split)))
            .flat_map(|(hood, split)| {
                let site_splits = &site_splits;
                hood.members().iter().map(move |member| Occurrence {
                    site: member.site,
                    neighborhood: hood.id(),
                    split,
                    is_center: member.is_center,
                    usable: sites.is_labeled(member.site)
                        && site_splits.get(&member.site) == Some(&split),
                })
            })
            .collect();

        debug!(
            three_way = conflicts.three_way,
            pairwise = conflicts.pairwise_total(),
            "resolved split conflicts"
        );
        SplitAssignment {
            neighborhood_splits,
            site_splits,
            occurrences,
            conflicts,
        }
    }

    fn split_seeds(&self, neighborhoods: &[Neighborhood]) -> Vec<(NeighborhoodId, Split)> {
        let mut order: Vec<usize> = (0..neighborhoods.len()).collect();
        order.shuffle(&mut stream_rng(self.seed, RngStream::SplitPermutation));
        let (train_end, validation_end) = self.ratios.boundaries(order.len());
        let mut splits = vec![Split::Test; neighborhoods.len()];
        for (rank, &position) in order.iter().enumerate() {
            splits[position] = if rank < train_end {
                Split::Train
            } else if rank < validation_end {
                Split::Validation
            } else {
                Split::Test
            };
        }
        neighborhoods
            .iter()
            .map(Neighborhood::id)
            .zip(splits)
            .collect()
    }
}
