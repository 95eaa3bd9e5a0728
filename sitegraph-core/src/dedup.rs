//! Removal of neighbourhoods with identical member sets.

use tracing::{debug, instrument};

use crate::{
    neighborhood::{Neighborhood, NeighborhoodId},
    report::{RunIssue, RunReport},
    site::SiteId,
};

/// Keeps one neighbourhood per distinct member set.
///
/// Among identical sets the neighbourhood with the smallest seed survives.
/// Survivors keep their relative order and are renumbered densely from zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct DuplicateResolver;

impl DuplicateResolver {
    /// Deduplicates `neighborhoods`, recording each discard in `report`.
    #[instrument(name = "core.dedup", skip_all, fields(neighborhoods = neighborhoods.len()))]
    pub fn resolve(
        &self,
        neighborhoods: Vec<Neighborhood>,
        report: &mut RunReport,
    ) -> Vec<Neighborhood> {
        let keys: Vec<Vec<SiteId>> = neighborhoods
            .iter()
            .map(|hood| hood.member_ids().collect())
            .collect();
        let mut order: Vec<usize> = (0..neighborhoods.len()).collect();
        order.sort_unstable_by(|&a, &b| {
            keys[a]
                .cmp(&keys[b])
                .then_with(|| neighborhoods[a].seed().cmp(&neighborhoods[b].seed()))
        });

        let mut keep = vec![true; neighborhoods.len()];
        for group in order.chunk_by(|&a, &b| keys[a] == keys[b]) {
            let Some((&survivor, discarded)) = group.split_first() else {
                continue;
            };
            for &position in discarded {
                keep[position] = false;
                report.push(RunIssue::DuplicateDiscarded {
                    seed: neighborhoods[position].seed(),
                    kept_seed: neighborhoods[survivor].seed(),
                });
                #[cfg(feature = "metrics")]
                metrics::counter!("sitegraph_duplicate_neighborhoods").increment(1);
            }
        }

        let before = neighborhoods.len();
        let survivors: Vec<Neighborhood> = neighborhoods
            .into_iter()
            .zip(keep)
            .filter_map(|(hood, kept)| kept.then_some(hood))
            .enumerate()
            .map(|(position, mut hood)| {
                hood.renumber(NeighborhoodId::new(position));
                hood
            })
            .collect();
        debug!(before, after = survivors.len(), "removed duplicate neighbourhoods");
        survivors
    }
}
