//! Final pipeline output and its tabular views.

use crate::{
    membership::MembershipIndex,
    neighborhood::{Neighborhood, NeighborhoodId},
    report::RunReport,
    seeds::SeedSet,
    site::SiteId,
    split::{ConflictSummary, Split, SplitAssignment},
};

/// One row of the neighbourhood table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NeighborhoodRow {
    pub neighborhood_id: NeighborhoodId,
    pub member_site_id: SiteId,
    pub is_center: bool,
    pub hop: Option<u32>,
}

/// One row of the edge table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeRow {
    pub neighborhood_id: NeighborhoodId,
    pub start_site_id: SiteId,
    pub end_site_id: SiteId,
    pub distance: f64,
    pub hop: Option<u32>,
}

/// One row of the membership table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MembershipRow {
    pub site_id: SiteId,
    pub neighborhood_ids: Vec<NeighborhoodId>,
}

/// One row of the split-mask table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SplitMaskRow {
    pub site_id: SiteId,
    pub neighborhood_id: NeighborhoodId,
    pub split: Split,
    pub usable: bool,
}

/// Headline counts describing a run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DatasetSummary {
    pub seeds: usize,
    pub neighborhoods: usize,
    pub edges: usize,
    pub occurrences: usize,
    pub shared_sites: usize,
    /// Usable occurrences per split, in train/val/test order.
    pub usable: [usize; 3],
    pub conflicts: ConflictSummary,
    pub skipped_sites: usize,
    pub ceiling_commits: usize,
    pub dropped_seeds: usize,
    pub duplicates: usize,
}

/// Neighbourhoods, membership, split assignment, and run report.
#[derive(Clone, Debug)]
pub struct Dataset {
    seeds: SeedSet,
    neighborhoods: Vec<Neighborhood>,
    membership: MembershipIndex,
    assignment: SplitAssignment,
    report: RunReport,
}

impl Dataset {
    pub(crate) fn new(
        seeds: SeedSet,
        neighborhoods: Vec<Neighborhood>,
        membership: MembershipIndex,
        assignment: SplitAssignment,
        report: RunReport,
    ) -> Self {
        Self {
            seeds,
            neighborhoods,
            membership,
            assignment,
            report,
        }
    }

    /// Returns the seeds the run started from.
    #[must_use]
    #[rustfmt::skip]
    pub fn seeds(&self) -> &SeedSet { &self.seeds }

    /// Returns the committed neighbourhoods in seed order.
    #[must_use]
    #[rustfmt::skip]
    pub fn neighborhoods(&self) -> &[Neighborhood] { &self.neighborhoods }

    /// Returns the site-to-neighbourhood index.
    #[must_use]
    #[rustfmt::skip]
    pub fn membership(&self) -> &MembershipIndex { &self.membership }

    /// Returns the split assignment.
    #[must_use]
    #[rustfmt::skip]
    pub fn assignment(&self) -> &SplitAssignment { &self.assignment }

    /// Returns the issues recorded during the run.
    #[must_use]
    #[rustfmt::skip]
    pub fn report(&self) -> &RunReport { &self.report }

    /// Rows of `{neighborhood_id, member_site_id, is_center, hop}`.
    #[must_use]
    pub fn neighborhood_rows(&self) -> Vec<NeighborhoodRow> {
        self.neighborhoods
            .iter()
            .flat_map(|hood| {
                hood.members().iter().map(move |member| NeighborhoodRow {
                    neighborhood_id: hood.id(),
                    member_site_id: member.site,
                    is_center: member.is_center,
                    hop: member.hop,
                })
            })
            .collect()
    }

    /// Rows of `{neighborhood_id, start_site_id, end_site_id, distance}`.
    #[must_use]
    pub fn edge_rows(&self) -> Vec<EdgeRow> {
        self.neighborhoods
            .iter()
            .flat_map(|hood| {
                hood.edges().iter().map(move |edge| EdgeRow {
                    neighborhood_id: hood.id(),
                    start_site_id: edge.start,
                    end_site_id: edge.end,
                    distance: edge.distance,
                    hop: edge.hop,
                })
            })
            .collect()
    }

    /// Rows of `{site_id, neighborhood_id[]}` in ascending site order.
    #[must_use]
    pub fn membership_rows(&self) -> Vec<MembershipRow> {
        self.membership
            .iter_sorted()
            .map(|(site_id, ids)| MembershipRow {
                site_id,
                neighborhood_ids: ids.to_vec(),
            })
            .collect()
    }

    /// Rows of `{site_id, neighborhood_id, split, usable}`.
    #[must_use]
    pub fn split_mask_rows(&self) -> Vec<SplitMaskRow> {
        self.assignment
            .occurrences()
            .iter()
            .map(|occurrence| SplitMaskRow {
                site_id: occurrence.site,
                neighborhood_id: occurrence.neighborhood,
                split: occurrence.split,
                usable: occurrence.usable,
            })
            .collect()
    }

    /// Computes headline counts.
    #[must_use]
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            seeds: self.seeds.len(),
            neighborhoods: self.neighborhoods.len(),
            edges: self.neighborhoods.iter().map(|hood| hood.edges().len()).sum(),
            occurrences: self.assignment.occurrences().len(),
            shared_sites: self.membership.shared_sites(),
            usable: Split::ALL.map(|split| self.assignment.usable_count(split)),
            conflicts: self.assignment.conflicts(),
            skipped_sites: self.report.skipped_sites().count(),
            ceiling_commits: self.report.ceiling_commits().count(),
            dropped_seeds: self.report.dropped_seeds().count(),
            duplicates: self.report.discarded_duplicates().count(),
        }
    }
}
