//! Argument parsing and command execution for the sitegraph CLI.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use sitegraph_core::{
    DEFAULT_INITIAL_RADIUS, DEFAULT_MAX_HOPS, DEFAULT_MAX_RADIUS, DEFAULT_MIN_AREA,
    DEFAULT_MIN_FALLBACK_SITES, DEFAULT_MIN_SITES, DEFAULT_RADIUS_STEP, DEFAULT_SEED,
    DEFAULT_SEED_FRACTION, DEFAULT_TRAIN_RATIO, DEFAULT_UNLABELED_SENTINEL,
    DEFAULT_VALIDATION_RATIO, DatasetSummary, EdgeScope, HopParams, RadiusParams,
    SamplingStrategy, SiteGraph, SiteGraphBuilder, SiteGraphError, Split,
};
use sitegraph_providers_parquet::{
    DatasetWriter, SiteParquetError, SiteParquetReader, WrittenTables,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "sitegraph",
    about = "Build neighbourhood graphs over site footprints and split them for training."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Sample neighbourhoods, partition them, and write the output tables.
    Run(RunCommand),
}

/// Neighbourhood growth strategy selected on the command line.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum StrategyKind {
    /// Grow a buffer around each seed until enough sites fall inside.
    #[default]
    Radius,
    /// Walk Delaunay edges outward from each seed.
    Hop,
}

/// Triangulation scope for radius sampling.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum EdgeScopeArg {
    /// Triangulate each neighbourhood on its own.
    #[default]
    PerNeighborhood,
    /// Triangulate every prepared site once.
    Global,
}

impl From<EdgeScopeArg> for EdgeScope {
    fn from(value: EdgeScopeArg) -> Self {
        match value {
            EdgeScopeArg::PerNeighborhood => Self::PerNeighborhood,
            EdgeScopeArg::Global => Self::Global,
        }
    }
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Parquet file holding the site table.
    pub input: PathBuf,

    /// Directory receiving the output tables.
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Override name for the site table (defaults to the file stem).
    #[arg(long)]
    pub name: Option<String>,

    /// Neighbourhood growth strategy.
    #[arg(long, value_enum, default_value_t = StrategyKind::Radius)]
    pub strategy: StrategyKind,

    /// Fraction of prepared sites drawn as seeds, in `(0, 1]`.
    #[arg(long, default_value_t = DEFAULT_SEED_FRACTION)]
    pub seed_fraction: f64,

    /// Base seed for every random stream.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Starting buffer radius.
    #[arg(long, default_value_t = DEFAULT_INITIAL_RADIUS)]
    pub initial_radius: f64,

    /// Radius increment between rounds.
    #[arg(long, default_value_t = DEFAULT_RADIUS_STEP)]
    pub radius_step: f64,

    /// Radius ceiling.
    #[arg(long, default_value_t = DEFAULT_MAX_RADIUS)]
    pub max_radius: f64,

    /// Members required before a neighbourhood commits.
    #[arg(long, default_value_t = DEFAULT_MIN_SITES)]
    pub min_sites: usize,

    /// Members required to commit at the ceiling instead of dropping the seed.
    #[arg(long, default_value_t = DEFAULT_MIN_FALLBACK_SITES)]
    pub min_fallback_sites: usize,

    /// Triangulation scope for radius sampling.
    #[arg(long, value_enum, default_value_t = EdgeScopeArg::PerNeighborhood)]
    pub edge_scope: EdgeScopeArg,

    /// Hop limit for hop sampling.
    #[arg(long, default_value_t = DEFAULT_MAX_HOPS)]
    pub max_hops: u32,

    /// Footprints at or below this area are skipped.
    #[arg(long, default_value_t = DEFAULT_MIN_AREA)]
    pub min_area: f64,

    /// Keep footprints nested inside another footprint.
    #[arg(long)]
    pub keep_nested: bool,

    /// Share of neighbourhoods assigned to training.
    #[arg(long, default_value_t = DEFAULT_TRAIN_RATIO)]
    pub train: f64,

    /// Share of neighbourhoods assigned to validation.
    #[arg(long, default_value_t = DEFAULT_VALIDATION_RATIO)]
    pub validation: f64,

    /// Train,validation,test shares for sites seen in all three splits.
    #[arg(long, value_parser = parse_three_way, default_value = "1,0,0")]
    pub conflict_three_way: [f64; 3],

    /// Share of two-split conflicts kept in the earlier split.
    #[arg(long, default_value_t = 1.0)]
    pub conflict_pairwise: f64,

    /// Label value meaning "unlabeled".
    #[arg(long, default_value_t = DEFAULT_UNLABELED_SENTINEL, allow_negative_numbers = true)]
    pub label_sentinel: i64,

    /// Maximum rows per Parquet row group in the output tables.
    #[arg(long)]
    pub max_row_group_size: Option<usize>,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading the site table or writing the outputs failed.
    #[error("parquet I/O failed for `{path}`: {source}")]
    Provider {
        /// File or directory being processed.
        path: PathBuf,
        /// Underlying provider error.
        #[source]
        source: SiteParquetError,
    },
    /// Configuration or pipeline execution failed.
    #[error(transparent)]
    Core(#[from] SiteGraphError),
}

impl CliError {
    /// Stable code of the underlying pipeline error, when there is one.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Core(err)
            | Self::Provider {
                source: SiteParquetError::SiteTable(err),
                ..
            } => Some(err.code().as_str()),
            Self::Provider { .. } => None,
        }
    }
}

/// Outcome of a successful `run`.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Name of the site table.
    pub data_source: String,
    /// Strategy that grew the neighbourhoods.
    pub strategy: &'static str,
    /// Sites read from the input.
    pub sites: usize,
    /// Neighbourhoods per split, in train/validation/test order.
    pub split_neighborhoods: [usize; 3],
    /// Headline counts from the dataset.
    pub dataset: DatasetSummary,
    /// Files written.
    pub tables: WrittenTables,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when configuration, ingestion, the pipeline, or
/// writing the outputs fails.
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(input = field::Empty, output = field::Empty, strategy = field::Empty),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    span.record("input", field::display(command.input.display()));
    span.record("output", field::display(command.output.display()));

    let graph = build_graph(&command)?;
    span.record("strategy", field::display(graph.strategy().name()));

    let name = derive_data_source_name(&command.input, command.name.as_deref());
    let sites = SiteParquetReader::new()
        .with_label_sentinel(command.label_sentinel)
        .read_path(&name, &command.input)
        .map_err(|source| CliError::Provider {
            path: command.input.clone(),
            source,
        })?;
    let dataset = graph.run(&sites)?;

    let mut writer = DatasetWriter::new();
    if let Some(rows) = command.max_row_group_size {
        writer = writer.with_max_row_group_size(rows);
    }
    let tables = writer
        .write(&dataset, &command.output)
        .map_err(|source| CliError::Provider {
            path: command.output.clone(),
            source,
        })?;

    let summary = ExecutionSummary {
        data_source: sites.name().to_owned(),
        strategy: graph.strategy().name(),
        sites: sites.len(),
        split_neighborhoods: Split::ALL.map(|split| dataset.assignment().neighborhood_count(split)),
        dataset: dataset.summary(),
        tables,
    };
    info!(
        data_source = summary.data_source.as_str(),
        neighborhoods = summary.dataset.neighborhoods,
        skipped_sites = summary.dataset.skipped_sites,
        "command completed"
    );
    Ok(summary)
}

pub(super) fn build_graph(command: &RunCommand) -> Result<SiteGraph, SiteGraphError> {
    let strategy = match command.strategy {
        StrategyKind::Radius => SamplingStrategy::Radius(
            RadiusParams::new(
                command.initial_radius,
                command.radius_step,
                command.max_radius,
                command.min_sites,
            )?
            .with_min_fallback_sites(command.min_fallback_sites)
            .with_edge_scope(command.edge_scope.into()),
        ),
        StrategyKind::Hop => SamplingStrategy::Hop(HopParams::new(command.max_hops)?),
    };
    SiteGraphBuilder::new()
        .with_seed_fraction(command.seed_fraction)
        .with_seed(command.seed)
        .with_strategy(strategy)
        .with_min_area(command.min_area)
        .with_drop_nested(!command.keep_nested)
        .with_split_ratios(command.train, command.validation)
        .with_conflict_policy(command.conflict_three_way, command.conflict_pairwise)
        .build()
}

pub(super) fn parse_three_way(raw: &str) -> Result<[f64; 3], String> {
    let shares = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|err| format!("`{}` is not a number: {err}", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    <[f64; 3]>::try_from(shares)
        .map_err(|got| format!("expected three comma-separated shares, got {}", got.len()))
}

pub(super) fn derive_data_source_name(path: &Path, override_name: Option<&str>) -> String {
    if let Some(name) = override_name {
        return name.to_owned();
    }

    path.file_stem()
        .and_then(|value| value.to_str())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| "sites".to_owned())
}

/// Renders `summary` to `writer` as `key: value` lines.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let dataset = &summary.dataset;
    writeln!(writer, "data source: {}", summary.data_source)?;
    writeln!(writer, "strategy: {}", summary.strategy)?;
    writeln!(writer, "sites: {}", summary.sites)?;
    writeln!(writer, "seeds: {}", dataset.seeds)?;
    writeln!(writer, "neighborhoods: {}", dataset.neighborhoods)?;
    writeln!(writer, "duplicates: {}", dataset.duplicates)?;
    writeln!(writer, "edges: {}", dataset.edges)?;
    writeln!(writer, "shared sites: {}", dataset.shared_sites)?;
    for ((split, neighborhoods), usable) in Split::ALL
        .into_iter()
        .zip(summary.split_neighborhoods)
        .zip(dataset.usable)
    {
        writeln!(
            writer,
            "{}: {neighborhoods} neighborhoods, {usable} usable labels",
            split_label(split)
        )?;
    }
    writeln!(
        writer,
        "conflicts: {} three-way, {} pairwise",
        dataset.conflicts.three_way,
        dataset.conflicts.pairwise_total()
    )?;
    writeln!(writer, "skipped sites: {}", dataset.skipped_sites)?;
    writeln!(writer, "ceiling commits: {}", dataset.ceiling_commits)?;
    writeln!(writer, "dropped seeds: {}", dataset.dropped_seeds)?;
    writeln!(writer, "output: {}", summary.tables.neighborhoods.display())?;
    writeln!(writer, "output: {}", summary.tables.edges.display())?;
    writeln!(writer, "output: {}", summary.tables.membership.display())?;
    writeln!(writer, "output: {}", summary.tables.split_masks.display())?;
    Ok(())
}

/// Long split names for the human-readable summary.
const fn split_label(split: Split) -> &'static str {
    match split {
        Split::Train => "train",
        Split::Validation => "validation",
        Split::Test => "test",
    }
}
