use arrow_schema::ArrowError;
use parquet::errors::ParquetError;
use rstest::rstest;
use sitegraph_core::{SiteGraphError, SiteId};
use std::io;

use super::SiteParquetError;

#[rstest]
#[case::arrow(SiteParquetError::from(ArrowError::ComputeError("boom".into())), "arrow")]
#[case::parquet(SiteParquetError::from(ParquetError::General("boom".into())), "parquet")]
#[case::io(SiteParquetError::from(io::Error::other("boom")), "io")]
#[case::table(
    SiteParquetError::from(SiteGraphError::DuplicateSiteId { id: SiteId::new(3) }),
    "table"
)]
fn site_parquet_error_conversions(#[case] err: SiteParquetError, #[case] kind: &str) {
    let actual = match err {
        SiteParquetError::Arrow(_) => "arrow",
        SiteParquetError::Parquet(_) => "parquet",
        SiteParquetError::Io(_) => "io",
        SiteParquetError::SiteTable(_) => "table",
        _ => "other",
    };
    assert_eq!(actual, kind);
}

#[rstest]
fn messages_name_the_column() {
    let err = SiteParquetError::NullValue {
        column: "id",
        row: 4,
    };
    assert_eq!(err.to_string(), "row 4 has a null `id`");
}
