//! Error types for the sitegraph core library.
//!
//! Fatal pipeline failures surface as [`SiteGraphError`]. Per-site geometry
//! problems are [`GeometryError`] values; the pipeline never returns those
//! directly and instead records them in the [`crate::RunReport`].

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{neighborhood::NeighborhoodId, site::SiteId};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// A problem with a single site's footprint.
///
/// Geometry errors are never fatal: the offending site is skipped and the
/// error is accumulated in the run report.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeometryError {
    /// The footprint has no exterior ring vertices.
    #[error("site {site} has an empty footprint")]
    EmptyPolygon {
        /// Site that owns the footprint.
        site: SiteId,
    },
    /// The footprint contains a NaN or infinite coordinate.
    #[error("site {site} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Site that owns the footprint.
        site: SiteId,
    },
    /// The footprint area does not exceed the configured minimum.
    #[error("site {site} has degenerate area {area} (minimum {min_area})")]
    DegenerateArea {
        /// Site that owns the footprint.
        site: SiteId,
        /// Unsigned area of the footprint.
        area: f64,
        /// Configured lower bound (exclusive).
        min_area: f64,
    },
    /// No centroid could be derived from the footprint.
    #[error("site {site} has no centroid")]
    MissingCentroid {
        /// Site that owns the footprint.
        site: SiteId,
    },
    /// The footprint is identical to one owned by a lower identifier.
    #[error("site {site} duplicates the footprint of site {original}")]
    DuplicateGeometry {
        /// Site that was skipped.
        site: SiteId,
        /// Site that keeps the footprint.
        original: SiteId,
    },
    /// The footprint lies within another site's footprint.
    #[error("site {site} lies within site {container}")]
    NestedFootprint {
        /// Site that was skipped.
        site: SiteId,
        /// Site whose footprint contains it.
        container: SiteId,
    },
    /// The geometry adapter was queried for a site it does not index.
    #[error("site {site} is not known to the geometry adapter")]
    UnknownSite {
        /// Requested site.
        site: SiteId,
    },
}

impl GeometryError {
    /// Returns the site the error refers to.
    #[must_use]
    pub const fn site(&self) -> SiteId {
        match self {
            Self::EmptyPolygon { site }
            | Self::NonFiniteCoordinate { site }
            | Self::DegenerateArea { site, .. }
            | Self::MissingCentroid { site }
            | Self::DuplicateGeometry { site, .. }
            | Self::NestedFootprint { site, .. }
            | Self::UnknownSite { site } => *site,
        }
    }
}

define_error_codes! {
    /// Stable codes describing [`GeometryError`] variants.
    enum GeometryErrorCode for GeometryError {
        /// The footprint has no exterior ring vertices.
        EmptyPolygon => EmptyPolygon { .. } => "GEOMETRY_EMPTY_POLYGON",
        /// The footprint contains a NaN or infinite coordinate.
        NonFiniteCoordinate => NonFiniteCoordinate { .. } => "GEOMETRY_NON_FINITE_COORDINATE",
        /// The footprint area does not exceed the configured minimum.
        DegenerateArea => DegenerateArea { .. } => "GEOMETRY_DEGENERATE_AREA",
        /// No centroid could be derived from the footprint.
        MissingCentroid => MissingCentroid { .. } => "GEOMETRY_MISSING_CENTROID",
        /// The footprint duplicates another site's footprint.
        DuplicateGeometry => DuplicateGeometry { .. } => "GEOMETRY_DUPLICATE",
        /// The footprint lies within another site's footprint.
        NestedFootprint => NestedFootprint { .. } => "GEOMETRY_NESTED_FOOTPRINT",
        /// The geometry adapter does not index the requested site.
        UnknownSite => UnknownSite { .. } => "GEOMETRY_UNKNOWN_SITE",
    }
}

/// Error type produced when configuring or running a [`crate::SiteGraph`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SiteGraphError {
    /// Seed fraction must lie in `(0, 1]`.
    #[error("seed_fraction must be in (0, 1] (got {got})")]
    InvalidSeedFraction {
        /// The rejected fraction.
        got: f64,
    },
    /// The neighbourhood size threshold must be at least one.
    #[error("min_sites must be at least 1 (got {got})")]
    InvalidMinSites {
        /// The rejected threshold.
        got: usize,
    },
    /// A radius parameter was non-finite, non-positive, or out of order.
    #[error("radius parameter `{name}` is invalid (got {got})")]
    InvalidRadius {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        got: f64,
    },
    /// The minimum footprint area must be finite and non-negative.
    #[error("min_area must be finite and non-negative (got {got})")]
    InvalidMinArea {
        /// The rejected area.
        got: f64,
    },
    /// The hop count must be at least one.
    #[error("max_hops must be at least 1 (got {got})")]
    InvalidMaxHops {
        /// The rejected hop count.
        got: u32,
    },
    /// Split ratios must be non-negative and sum to at most one.
    #[error("split ratios train={train} validation={validation} are invalid")]
    InvalidSplitRatios {
        /// Requested training fraction.
        train: f64,
        /// Requested validation fraction.
        validation: f64,
    },
    /// A conflict redistribution ratio fell outside `[0, 1]` or the
    /// three-way weights did not sum to one.
    #[error("conflict ratio `{name}` is invalid (got {got})")]
    InvalidConflictRatio {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        got: f64,
    },
    /// Two sites in the input table share an identifier.
    #[error("site identifier {id} occurs more than once")]
    DuplicateSiteId {
        /// The repeated identifier.
        id: SiteId,
    },
    /// The site table contained no usable sites.
    #[error("site table `{table}` contains no usable sites")]
    EmptySiteTable {
        /// Name of the table.
        table: Arc<str>,
    },
    /// Sampling yielded no seeds.
    #[error("no seeds were selected from {sites} sites at fraction {fraction}")]
    EmptySeedSet {
        /// Number of prepared sites.
        sites: usize,
        /// Configured seed fraction.
        fraction: f64,
    },
    /// An explicitly supplied seed is not a prepared site.
    #[error("seed {seed} is not present in the prepared site table")]
    UnknownSeed {
        /// The missing seed.
        seed: SiteId,
    },
    /// An explicitly supplied seed has no class label.
    #[error("seed {seed} has no class label")]
    UnlabeledSeed {
        /// The unlabeled seed.
        seed: SiteId,
    },
    /// Every seed was dropped before a neighbourhood could be committed.
    #[error("no neighbourhoods were produced from {seeds} seeds")]
    EmptyNeighborhoodSet {
        /// Number of seeds the sampler started from.
        seeds: usize,
    },
    /// A neighbourhood's center is missing from its own member set.
    #[error("neighbourhood {neighborhood} does not contain its center site {center}")]
    InconsistentMembership {
        /// The broken neighbourhood.
        neighborhood: NeighborhoodId,
        /// Its seed site.
        center: SiteId,
    },
    /// The triangulation primitive rejected its input.
    #[error("triangulation failed: {message}")]
    Triangulation {
        /// Backend-provided description.
        message: Arc<str>,
    },
}

define_error_codes! {
    /// Stable codes describing [`SiteGraphError`] variants.
    enum SiteGraphErrorCode for SiteGraphError {
        /// Seed fraction must lie in `(0, 1]`.
        InvalidSeedFraction => InvalidSeedFraction { .. } => "SITEGRAPH_INVALID_SEED_FRACTION",
        /// The neighbourhood size threshold must be at least one.
        InvalidMinSites => InvalidMinSites { .. } => "SITEGRAPH_INVALID_MIN_SITES",
        /// A radius parameter was invalid.
        InvalidRadius => InvalidRadius { .. } => "SITEGRAPH_INVALID_RADIUS",
        /// The minimum footprint area was invalid.
        InvalidMinArea => InvalidMinArea { .. } => "SITEGRAPH_INVALID_MIN_AREA",
        /// The hop count must be at least one.
        InvalidMaxHops => InvalidMaxHops { .. } => "SITEGRAPH_INVALID_MAX_HOPS",
        /// Split ratios were invalid.
        InvalidSplitRatios => InvalidSplitRatios { .. } => "SITEGRAPH_INVALID_SPLIT_RATIOS",
        /// A conflict redistribution ratio was invalid.
        InvalidConflictRatio => InvalidConflictRatio { .. } => "SITEGRAPH_INVALID_CONFLICT_RATIO",
        /// Two sites share an identifier.
        DuplicateSiteId => DuplicateSiteId { .. } => "SITEGRAPH_DUPLICATE_SITE_ID",
        /// The site table contained no usable sites.
        EmptySiteTable => EmptySiteTable { .. } => "SITEGRAPH_EMPTY_SITE_TABLE",
        /// Sampling yielded no seeds.
        EmptySeedSet => EmptySeedSet { .. } => "SITEGRAPH_EMPTY_SEED_SET",
        /// An explicit seed is not a prepared site.
        UnknownSeed => UnknownSeed { .. } => "SITEGRAPH_UNKNOWN_SEED",
        /// An explicit seed has no class label.
        UnlabeledSeed => UnlabeledSeed { .. } => "SITEGRAPH_UNLABELED_SEED",
        /// No neighbourhoods were produced.
        EmptyNeighborhoodSet => EmptyNeighborhoodSet { .. } => "SITEGRAPH_EMPTY_NEIGHBORHOOD_SET",
        /// A neighbourhood does not contain its center.
        InconsistentMembership => InconsistentMembership { .. } => "SITEGRAPH_INCONSISTENT_MEMBERSHIP",
        /// The triangulation primitive failed.
        Triangulation => Triangulation { .. } => "SITEGRAPH_TRIANGULATION_FAILURE",
    }
}

impl SiteGraphError {
    /// Returns `true` for errors raised while validating configuration.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidSeedFraction { .. }
                | Self::InvalidMinSites { .. }
                | Self::InvalidRadius { .. }
                | Self::InvalidMinArea { .. }
                | Self::InvalidMaxHops { .. }
                | Self::InvalidSplitRatios { .. }
                | Self::InvalidConflictRatio { .. }
        )
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, SiteGraphError>;
