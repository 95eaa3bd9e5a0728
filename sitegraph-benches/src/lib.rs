//! Benchmark support crate for sitegraph.
//!
//! Provides synthetic site layouts and parameter types used by the Criterion
//! benchmarks for neighbourhood sampling and split partitioning.

pub mod error;
pub mod layout;
pub mod params;
