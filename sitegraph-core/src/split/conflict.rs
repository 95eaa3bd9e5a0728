//! Redistribution of labeled sites that inherited more than one split.

use rand::seq::SliceRandom;

use crate::{
    error::{Result, SiteGraphError},
    rng::{RngStream, stream_rng},
    site::SiteId,
};

use super::{RATIO_TOLERANCE, Split};

/// The three split pairs, in earlier-first order.
const PAIRS: [(Split, Split); 3] = [
    (Split::Train, Split::Validation),
    (Split::Train, Split::Test),
    (Split::Validation, Split::Test),
];

/// How conflicting labeled sites are redistributed.
///
/// The default sends every conflicting site to the earliest split it
/// touched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConflictPolicy {
    three_way: [f64; 3],
    pairwise: f64,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self {
            three_way: [1.0, 0.0, 0.0],
            pairwise: 1.0,
        }
    }
}

impl ConflictPolicy {
    /// Creates a validated policy.
    ///
    /// `three_way` holds the train/validation/test shares for sites seen in
    /// all three splits and must sum to one. `pairwise` is the share of a
    /// two-split group sent to the earlier split.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::InvalidConflictRatio`] for shares outside
    /// `[0, 1]` or three-way shares that do not sum to one.
    pub fn new(three_way: [f64; 3], pairwise: f64) -> Result<Self> {
        let names = ["three_way.train", "three_way.validation", "three_way.test"];
        for (name, share) in names.into_iter().zip(three_way) {
            check_share(name, share)?;
        }
        let total: f64 = three_way.iter().sum();
        if (total - 1.0).abs() > RATIO_TOLERANCE {
            return Err(SiteGraphError::InvalidConflictRatio {
                name: "three_way",
                got: total,
            });
        }
        check_share("pairwise", pairwise)?;
        Ok(Self {
            three_way,
            pairwise,
        })
    }

    /// Returns the train, validation and test shares for three-way conflicts.
    #[must_use]
    #[rustfmt::skip]
    pub fn three_way(&self) -> [f64; 3] { self.three_way }

    /// Returns the share of a two-split group sent to the earlier split.
    #[must_use]
    #[rustfmt::skip]
    pub fn pairwise(&self) -> f64 { self.pairwise }
}

fn check_share(name: &'static str, share: f64) -> Result<()> {
    if share.is_finite() && (0.0..=1.0).contains(&share) {
        Ok(())
    } else {
        Err(SiteGraphError::InvalidConflictRatio { name, got: share })
    }
}

/// Conflict group sizes observed during partitioning.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConflictSummary {
    /// Labeled sites seen in all three splits.
    pub three_way: usize,
    /// Labeled sites seen in exactly two splits, per pair
    /// (train/val, train/test, val/test).
    pub pairwise: [usize; 3],
}

impl ConflictSummary {
    /// Total number of two-split conflicts.
    #[must_use]
    pub fn pairwise_total(&self) -> usize {
        self.pairwise.iter().sum()
    }
}

/// Returns the split a mask names when exactly one bit is set.
pub(super) fn single_split(mask: u8) -> Option<Split> {
    Split::ALL.into_iter().find(|split| split.bit() == mask)
}

#[derive(Debug, Default)]
pub(super) struct ConflictGroups {
    three_way: Vec<SiteId>,
    pairs: [Vec<SiteId>; 3],
}

impl ConflictGroups {
    /// Files `site` under the group described by `mask`.
    pub(super) fn push(&mut self, mask: u8, site: SiteId) {
        if mask.count_ones() == 3 {
            self.three_way.push(site);
        } else if let Some(slot) = PAIRS
            .iter()
            .position(|&(a, b)| a.bit() | b.bit() == mask)
        {
            self.pairs[slot].push(site);
        }
    }

    pub(super) fn summary(&self) -> ConflictSummary {
        ConflictSummary {
            three_way: self.three_way.len(),
            pairwise: [self.pairs[0].len(), self.pairs[1].len(), self.pairs[2].len()],
        }
    }

    /// Shuffles each group with its own stream and cuts it by the policy.
    pub(super) fn resolve(self, policy: &ConflictPolicy, seed: u64) -> Vec<(SiteId, Split)> {
        #[cfg(feature = "metrics")]
        {
            let total = self.three_way.len() + self.pairs.iter().map(Vec::len).sum::<usize>();
            metrics::counter!("sitegraph_conflicting_labels").increment(total as u64);
        }
        let mut resolved = Vec::new();

        let mut three_way = self.three_way;
        three_way.sort_unstable();
        three_way.shuffle(&mut stream_rng(seed, RngStream::ConflictGroup(0)));
        let [train, validation, _] = policy.three_way;
        let train_end = share_of(three_way.len(), train);
        let validation_end = share_of(three_way.len(), train + validation).max(train_end);
        for (rank, site) in three_way.into_iter().enumerate() {
            let split = if rank < train_end {
                Split::Train
            } else if rank < validation_end {
                Split::Validation
            } else {
                Split::Test
            };
            resolved.push((site, split));
        }

        for (slot, (mut group, (earlier, later))) in self.pairs.into_iter().zip(PAIRS).enumerate() {
            group.sort_unstable();
            #[expect(clippy::cast_possible_truncation, reason = "slot is below 3")]
            group.shuffle(&mut stream_rng(seed, RngStream::ConflictGroup(1 + slot as u8)));
            let earlier_end = share_of(group.len(), policy.pairwise);
            resolved.extend(group.into_iter().enumerate().map(|(rank, site)| {
                (site, if rank < earlier_end { earlier } else { later })
            }));
        }
        resolved
    }
}

fn share_of(count: usize, fraction: f64) -> usize {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "fraction is validated into [0, 1]"
    )]
    let share = (count as f64 * fraction + RATIO_TOLERANCE).floor() as usize;
    share.min(count)
}
