//! Site-to-neighbourhood reverse index.

use std::collections::HashMap;

use tracing::instrument;

use crate::{
    neighborhood::{Neighborhood, NeighborhoodId},
    site::SiteId,
};

/// Maps each site to every surviving neighbourhood that contains it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MembershipIndex {
    by_site: HashMap<SiteId, Vec<NeighborhoodId>>,
}

impl MembershipIndex {
    /// Builds the index in one pass over `neighborhoods`.
    ///
    /// Lists are in ascending [`NeighborhoodId`] order.
    #[must_use]
    #[instrument(name = "core.membership", skip_all, fields(neighborhoods = neighborhoods.len()))]
    pub fn build(neighborhoods: &[Neighborhood]) -> Self {
        let mut by_site: HashMap<SiteId, Vec<NeighborhoodId>> = HashMap::new();
        for hood in neighborhoods {
            for site in hood.member_ids() {
                by_site.entry(site).or_default().push(hood.id());
            }
        }
        for ids in by_site.values_mut() {
            ids.sort_unstable();
        }
        Self { by_site }
    }

    /// Returns the neighbourhoods containing `site`; empty when none do.
    #[must_use]
    pub fn neighborhoods_of(&self, site: SiteId) -> &[NeighborhoodId] {
        self.by_site.get(&site).map_or(&[][..], Vec::as_slice)
    }

    /// Returns the number of indexed sites.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.by_site.len() }

    /// Returns `true` when no site is indexed.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.by_site.is_empty() }

    /// Iterates over `(site, neighbourhoods)` in ascending site order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (SiteId, &[NeighborhoodId])> {
        let mut sites: Vec<SiteId> = self.by_site.keys().copied().collect();
        sites.sort_unstable();
        sites
            .into_iter()
            .map(|site| (site, self.neighborhoods_of(site)))
    }

    /// Number of sites shared by more than one neighbourhood.
    #[must_use]
    pub fn shared_sites(&self) -> usize {
        self.by_site.values().filter(|ids| ids.len() > 1).count()
    }
}
