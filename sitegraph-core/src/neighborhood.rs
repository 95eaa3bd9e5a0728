//! Neighbourhood records produced by the sampler.

use std::fmt;

use crate::{
    error::{Result, SiteGraphError},
    site::SiteId,
};

/// Dense identifier assigned to a surviving neighbourhood.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NeighborhoodId(usize);

impl NeighborhoodId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    #[rustfmt::skip]
    pub const fn get(self) -> usize { self.0 }
}

impl fmt::Display for NeighborhoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One site occurrence inside a neighbourhood.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Member {
    /// Member site.
    pub site: SiteId,
    /// `true` exactly for the neighbourhood's seed.
    pub is_center: bool,
    /// Hop distance from the seed in hop mode.
    pub hop: Option<u32>,
}

/// Edge between two members of the same neighbourhood.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighborhoodEdge {
    /// Lower endpoint.
    pub start: SiteId,
    /// Higher endpoint.
    pub end: SiteId,
    /// Euclidean distance between endpoint centroids.
    pub distance: f64,
    /// Smaller hop tag of the two endpoints in hop mode.
    pub hop: Option<u32>,
}

/// How the sampler stopped growing a neighbourhood.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Completion {
    /// Radius mode: the member count reached the threshold.
    Threshold,
    /// Radius mode: the ceiling radius was reached below the threshold.
    Ceiling,
    /// Hop mode: the configured hop count was exhausted.
    HopLimit,
    /// Hop mode: no unseen sites were reachable.
    Exhausted,
}

/// A seed-centred subgraph of sites.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighborhood {
    id: NeighborhoodId,
    seed: SiteId,
    members: Vec<Member>,
    edges: Vec<NeighborhoodEdge>,
    radius: Option<f64>,
    completion: Completion,
}

impl Neighborhood {
    /// Creates a neighbourhood, sorting `members` by site and marking the
    /// seed as center.
    #[must_use]
    pub fn new(
        id: NeighborhoodId,
        seed: SiteId,
        mut members: Vec<Member>,
        edges: Vec<NeighborhoodEdge>,
        completion: Completion,
    ) -> Self {
        members.sort_unstable_by_key(|member| member.site);
        members.dedup_by_key(|member| member.site);
        for member in &mut members {
            member.is_center = member.site == seed;
        }
        Self {
            id,
            seed,
            members,
            edges,
            radius: None,
            completion,
        }
    }

    /// Records the radius at which a radius-mode neighbourhood committed.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub(crate) fn set_edges(&mut self, edges: Vec<NeighborhoodEdge>) {
        self.edges = edges;
    }

    pub(crate) fn renumber(&mut self, id: NeighborhoodId) {
        self.id = id;
    }

    /// Returns the neighbourhood identifier.
    #[must_use]
    #[rustfmt::skip]
    pub fn id(&self) -> NeighborhoodId { self.id }

    /// Returns the seed (center) site.
    #[must_use]
    #[rustfmt::skip]
    pub fn seed(&self) -> SiteId { self.seed }

    /// Returns members in ascending site order.
    #[must_use]
    #[rustfmt::skip]
    pub fn members(&self) -> &[Member] { &self.members }

    /// Returns the internal edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[NeighborhoodEdge] { &self.edges }

    /// Returns the committing radius in radius mode.
    #[must_use]
    #[rustfmt::skip]
    pub fn radius(&self) -> Option<f64> { self.radius }

    /// Returns how growth stopped.
    #[must_use]
    #[rustfmt::skip]
    pub fn completion(&self) -> Completion { self.completion }

    /// Returns the number of members.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.members.len() }

    /// Returns `true` when there are no members.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    /// Iterates over member site ids in ascending order.
    pub fn member_ids(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.members.iter().map(|member| member.site)
    }

    /// Returns the member record for `site`.
    #[must_use]
    pub fn member(&self, site: SiteId) -> Option<&Member> {
        self.members
            .binary_search_by_key(&site, |member| member.site)
            .ok()
            .map(|position| &self.members[position])
    }

    /// Returns `true` when `site` is a member.
    #[must_use]
    pub fn contains(&self, site: SiteId) -> bool {
        self.member(site).is_some()
    }

    /// Checks that the seed is a member.
    ///
    /// # Errors
    /// Returns [`SiteGraphError::InconsistentMembership`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.contains(self.seed) {
            Ok(())
        } else {
            Err(SiteGraphError::InconsistentMembership {
                neighborhood: self.id,
                center: self.seed,
            })
        }
    }
}
