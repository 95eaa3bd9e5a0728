//! Round-synchronous buffer growth.

use tracing::debug;

use crate::{
    geometry::GeometryAdapter,
    neighborhood::Completion,
    report::{RunIssue, RunReport},
    site::SiteId,
};

use super::{RadiusParams, record_convergence};

/// A seed whose neighbourhood was committed.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RoundOutcome {
    /// Seed site.
    pub seed: SiteId,
    /// Sites inside the buffer at commit time, ascending.
    pub members: Vec<SiteId>,
    /// Radius of the committing round.
    pub radius: f64,
    /// Whether the threshold or the ceiling ended growth.
    pub completion: Completion,
}

/// Runs buffer rounds until every seed is committed or dropped.
///
/// Rounds use radii `initial, initial + step, ...`, with the last round
/// clamped to exactly `max_radius`. Pending and finished seeds live in
/// separate collections so a round never re-queries a committed seed.
pub(super) fn grow<G: GeometryAdapter>(
    geometry: &G,
    params: &RadiusParams,
    seeds: &[SiteId],
    report: &mut RunReport,
) -> Vec<RoundOutcome> {
    let mut pending: Vec<SiteId> = seeds.to_vec();
    let mut committed: Vec<RoundOutcome> = Vec::with_capacity(seeds.len());
    let mut radius = params.initial_radius.min(params.max_radius);
    let mut round = 0_usize;

    while !pending.is_empty() {
        round += 1;
        let at_ceiling = radius >= params.max_radius;
        let results = geometry.sites_within_batch(&pending, radius);
        let mut still_pending = Vec::with_capacity(pending.len());

        for (seed, result) in pending.iter().copied().zip(results) {
            let members = match result {
                Ok(members) => members,
                Err(error) => {
                    report.push(RunIssue::SkippedSite(error));
                    #[cfg(feature = "metrics")]
                    metrics::counter!("sitegraph_skipped_sites").increment(1);
                    continue;
                }
            };
            if members.len() >= params.min_sites {
                committed.push(RoundOutcome {
                    seed,
                    members,
                    radius,
                    completion: Completion::Threshold,
                });
            } else if !at_ceiling {
                still_pending.push(seed);
            } else if members.len() >= params.min_fallback_sites {
                let outcome = RoundOutcome {
                    seed,
                    members,
                    radius,
                    completion: Completion::Ceiling,
                };
                record_convergence(report, &outcome);
                committed.push(outcome);
            } else {
                report.push(RunIssue::ConvergenceExceeded {
                    seed,
                    members: members.len(),
                    radius,
                    committed: false,
                });
            }
        }

        debug!(
            round,
            radius,
            pending = still_pending.len(),
            committed = committed.len(),
            "radius round finished"
        );
        #[cfg(feature = "metrics")]
        metrics::counter!("sitegraph_sampler_rounds").increment(1);

        pending = still_pending;
        if at_ceiling {
            break;
        }
        radius = (radius + params.radius_step).min(params.max_radius);
    }

    debug!(rounds = round, committed = committed.len(), "radius sampling finished");
    committed
}
