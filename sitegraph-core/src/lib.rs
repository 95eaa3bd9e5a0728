//! Sitegraph core library.
//!
//! Turns a table of building footprints into overlapping neighbourhood
//! graphs with leakage-free train/validation/test masks.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod dataset;
mod dedup;
mod error;
mod geometry;
mod membership;
mod neighborhood;
mod pipeline;
mod preparation;
mod report;
mod rng;
mod sampler;
mod seeds;
mod site;
mod split;
#[cfg(test)]
mod test_utils;
mod triangulation;

pub use crate::{
    builder::{DEFAULT_SEED, SiteGraphBuilder},
    dataset::{Dataset, DatasetSummary, EdgeRow, MembershipRow, NeighborhoodRow, SplitMaskRow},
    dedup::DuplicateResolver,
    error::{GeometryError, GeometryErrorCode, Result, SiteGraphError, SiteGraphErrorCode},
    geometry::{FootprintIndex, GeometryAdapter},
    membership::MembershipIndex,
    neighborhood::{Completion, Member, Neighborhood, NeighborhoodEdge, NeighborhoodId},
    pipeline::SiteGraph,
    preparation::{DEFAULT_MIN_AREA, PreparedSites, SitePreparer},
    report::{RunIssue, RunReport},
    sampler::{
        DEFAULT_INITIAL_RADIUS, DEFAULT_MAX_HOPS, DEFAULT_MAX_RADIUS, DEFAULT_MIN_FALLBACK_SITES,
        DEFAULT_MIN_SITES, DEFAULT_RADIUS_STEP, EdgeScope, HopParams, NeighborhoodSampler,
        RadiusParams, SamplingStrategy,
    },
    seeds::{DEFAULT_SEED_FRACTION, SeedSet},
    site::{
        ClassLabel, DEFAULT_UNLABELED_SENTINEL, Site, SiteId, SiteTable, UnknownUrbanizationClass,
        UrbanizationClass,
    },
    split::{
        ConflictPolicy, ConflictSummary, DEFAULT_TRAIN_RATIO, DEFAULT_VALIDATION_RATIO,
        Occurrence, Split, SplitAssignment, SplitPartitioner, SplitRatios,
    },
    triangulation::{
        DelaunayTriangulator, EdgeSet, Segment, SiteEdge, TriangulationEdgeBuilder, Triangulator,
    },
};
