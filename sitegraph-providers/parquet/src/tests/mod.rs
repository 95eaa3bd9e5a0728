pub(crate) use super::{DatasetWriter, SiteParquetError, SiteParquetReader};

mod errors;
mod support;
mod writer;
