use arrow_schema::{ArrowError, DataType};
use sitegraph_core::{SiteGraphError, UnknownUrbanizationClass};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SiteParquetError {
    #[error("column `{column}` not found in Parquet schema")]
    ColumnNotFound { column: &'static str },
    #[error("column `{column}` must be {expected} but found {actual:?}")]
    InvalidColumnType {
        column: &'static str,
        expected: &'static str,
        actual: DataType,
    },
    #[error("row {row} has a null `{column}`")]
    NullValue { column: &'static str, row: usize },
    #[error("row {row}: {source}")]
    Urbanization {
        row: usize,
        #[source]
        source: UnknownUrbanizationClass,
    },
    #[error("invalid site table: {0}")]
    SiteTable(#[from] SiteGraphError),
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
