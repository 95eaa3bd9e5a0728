//! Non-fatal issues accumulated while running the pipeline.

use tracing::{debug, warn};

use crate::{error::GeometryError, site::SiteId};

/// A single recoverable event.
#[derive(Clone, Debug, PartialEq)]
pub enum RunIssue {
    /// A site was excluded because of its geometry.
    SkippedSite(GeometryError),
    /// A seed reached the radius ceiling below the size threshold.
    ConvergenceExceeded {
        /// Seed that failed to converge.
        seed: SiteId,
        /// Members found at the ceiling.
        members: usize,
        /// The ceiling radius.
        radius: f64,
        /// `true` when the neighbourhood was still committed.
        committed: bool,
    },
    /// A neighbourhood with an identical member set was discarded.
    DuplicateDiscarded {
        /// Seed of the discarded neighbourhood.
        seed: SiteId,
        /// Seed of the surviving neighbourhood.
        kept_seed: SiteId,
    },
}

/// Ordered log of [`RunIssue`]s with typed accessors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    issues: Vec<RunIssue>,
}

impl RunReport {
    /// Appends an issue and logs it.
    ///
    /// Skipped sites and ceiling outcomes are logged at WARN, discarded
    /// duplicates at DEBUG.
    pub fn push(&mut self, issue: RunIssue) {
        log_issue(&issue);
        self.issues.push(issue);
    }

    /// Records each geometry error as a skipped site.
    pub fn extend_skipped(&mut self, errors: impl IntoIterator<Item = GeometryError>) {
        for error in errors {
            self.push(RunIssue::SkippedSite(error));
        }
    }

    /// Returns every issue in the order it was recorded.
    #[must_use]
    #[rustfmt::skip]
    pub fn issues(&self) -> &[RunIssue] { &self.issues }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.issues.is_empty() }

    /// Iterates over skipped-site errors.
    pub fn skipped_sites(&self) -> impl Iterator<Item = &GeometryError> {
        self.issues.iter().filter_map(|issue| match issue {
            RunIssue::SkippedSite(error) => Some(error),
            _ => None,
        })
    }

    /// Seeds committed at the ceiling below the size threshold.
    pub fn ceiling_commits(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.convergence_failures(true)
    }

    /// Seeds dropped at the ceiling.
    pub fn dropped_seeds(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.convergence_failures(false)
    }

    /// Seeds whose neighbourhoods were discarded as duplicates.
    pub fn discarded_duplicates(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.issues.iter().filter_map(|issue| match issue {
            RunIssue::DuplicateDiscarded { seed, .. } => Some(*seed),
            _ => None,
        })
    }

    fn convergence_failures(&self, want_committed: bool) -> impl Iterator<Item = SiteId> + '_ {
        self.issues.iter().filter_map(move |issue| match issue {
            RunIssue::ConvergenceExceeded {
                seed, committed, ..
            } if *committed == want_committed => Some(*seed),
            _ => None,
        })
    }
}

fn log_issue(issue: &RunIssue) {
    match issue {
        RunIssue::SkippedSite(error) => warn!(
            site = %error.site(),
            code = error.code().as_str(),
            error = %error,
            "site skipped"
        ),
        RunIssue::ConvergenceExceeded {
            seed,
            members,
            radius,
            committed: true,
        } => warn!(
            seed = %seed,
            members,
            radius,
            "seed committed at radius ceiling below threshold"
        ),
        RunIssue::ConvergenceExceeded {
            seed,
            members,
            radius,
            committed: false,
        } => warn!(
            seed = %seed,
            members,
            radius,
            "seed dropped at radius ceiling"
        ),
        RunIssue::DuplicateDiscarded { seed, kept_seed } => debug!(
            seed = %seed,
            kept_seed = %kept_seed,
            "duplicate neighborhood discarded"
        ),
    }
}
