//! Parquet persistence for sitegraph: site tables in, dataset tables out.

mod errors;
mod ingest;
mod reader;
mod writer;

pub use errors::SiteParquetError;
pub use reader::SiteParquetReader;
pub use writer::{
    DatasetWriter, EDGES_FILE, MEMBERSHIP_FILE, NEIGHBORHOODS_FILE, SPLIT_MASKS_FILE,
    WrittenTables,
};

#[cfg(test)]
mod tests;
