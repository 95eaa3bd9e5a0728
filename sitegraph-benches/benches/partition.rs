//! Split partitioning benchmarks.
//!
//! Samples neighbourhoods once per layout, then measures only membership
//! indexing and the train/validation/test partition with conflict
//! resolution. A generous radius threshold makes neighbourhoods overlap so
//! most sites land in more than one.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
#![expect(
    clippy::shadow_reuse,
    reason = "Criterion bench_with_input closures rebind parameter names"
)]
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use sitegraph_benches::{
    error::BenchSetupError,
    layout::{LayoutConfig, generate},
    params::PartitionBenchParams,
};
use sitegraph_core::{
    ConflictPolicy, MembershipIndex, RadiusParams, SamplingStrategy, SiteGraphBuilder,
    SplitPartitioner, SplitRatios,
};

/// Seed used for layouts, sampling, and partitioning.
const SEED: u64 = 7;

/// Grid side lengths to benchmark.
const GRID_SIDES: &[usize] = &[30, 60];

fn partition_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("split_partition");
    group.sample_size(20);

    let partitioner = SplitPartitioner::new(
        SplitRatios::default(),
        ConflictPolicy::new([0.5, 0.25, 0.25], 0.5)?,
        SEED,
    );
    for &side in GRID_SIDES {
        let sites = generate(&LayoutConfig::grid(side, side, SEED))?;
        let dataset = SiteGraphBuilder::new()
            .with_seed_fraction(0.1)
            .with_seed(SEED)
            .with_strategy(SamplingStrategy::Radius(RadiusParams::new(
                10.0, 10.0, 120.0, 40,
            )?))
            .build()?
            .run(&sites)?;
        let neighborhoods = dataset.neighborhoods();
        let bench_params = PartitionBenchParams {
            neighborhoods: neighborhoods.len(),
            occurrences: dataset.summary().occurrences,
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(&bench_params),
            &(neighborhoods, &sites),
            |b, &(neighborhoods, sites)| {
                b.iter(|| {
                    let membership = MembershipIndex::build(neighborhoods);
                    partitioner.partition(neighborhoods, &membership, sites)
                });
            },
        );
    }

    group.finish();
    Ok(())
}

fn partition(c: &mut Criterion) {
    if let Err(err) = partition_impl(c) {
        panic!("partition benchmark setup failed: {err}");
    }
}

criterion_group!(benches, partition);
criterion_main!(benches);
