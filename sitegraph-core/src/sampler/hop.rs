//! Breadth-first hop expansion over the Delaunay graph.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use tracing::debug;

use crate::{neighborhood::Completion, site::SiteId};

/// Traversal state for one seed.
#[derive(Clone, Debug)]
pub(super) struct Walk {
    pub(super) seed: SiteId,
    /// Every reached site with its minimal hop distance.
    pub(super) reached: BTreeMap<SiteId, u32>,
    pub(super) completion: Completion,
    frontier: Vec<SiteId>,
    active: bool,
}

impl Walk {
    fn new(seed: SiteId) -> Self {
        Self {
            seed,
            reached: BTreeMap::from([(seed, 0)]),
            completion: Completion::HopLimit,
            frontier: vec![seed],
            active: true,
        }
    }

    /// Expands the frontier by one hop.
    ///
    /// Sites already reached keep their earlier (smaller) hop.
    fn expand(&mut self, adjacency: &HashMap<SiteId, Vec<SiteId>>, hop: u32) {
        let mut next: Vec<SiteId> = self
            .frontier
            .iter()
            .filter_map(|site| adjacency.get(site))
            .flatten()
            .copied()
            .filter(|site| !self.reached.contains_key(site))
            .collect();
        next.sort_unstable();
        next.dedup();
        if next.is_empty() {
            self.active = false;
            self.completion = Completion::Exhausted;
            return;
        }
        for &site in &next {
            self.reached.insert(site, hop);
        }
        self.frontier = next;
    }
}

/// Runs `max_hops` synchronous rounds over all seeds.
///
/// A seed stops early once its frontier reaches no unseen site.
pub(super) fn walk(
    adjacency: &HashMap<SiteId, Vec<SiteId>>,
    seeds: &[SiteId],
    max_hops: u32,
) -> Vec<Walk> {
    let mut walks: Vec<Walk> = seeds.iter().copied().map(Walk::new).collect();
    for hop in 1..=max_hops {
        walks
            .par_iter_mut()
            .filter(|walk| walk.active)
            .for_each(|walk| walk.expand(adjacency, hop));
        let active = walks.iter().filter(|walk| walk.active).count();
        debug!(hop, active, "hop round finished");
        #[cfg(feature = "metrics")]
        metrics::counter!("sitegraph_sampler_rounds").increment(1);
        if active == 0 {
            break;
        }
    }
    walks
}
