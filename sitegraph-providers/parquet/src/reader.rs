//! Site table ingestion from Parquet.
use std::{fs::File, path::Path};

use arrow_array::{Array, Int32Array, ListArray, RecordBatch, StringArray, UInt64Array};
use arrow_schema::ArrowError;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use sitegraph_core::{
    ClassLabel, DEFAULT_UNLABELED_SENTINEL, Site, SiteId, SiteTable, UrbanizationClass,
};

use crate::errors::SiteParquetError;
use crate::ingest::{downcast, empty_polygon, optional_column, required_column, ring_to_polygon};

pub(crate) const ID_COLUMN: &str = "id";
pub(crate) const EXTERIOR_COLUMN: &str = "exterior";
pub(crate) const LABEL_COLUMN: &str = "label";
pub(crate) const COUNTRY_CODE_COLUMN: &str = "country_code";
pub(crate) const URBANIZATION_COLUMN: &str = "urbanization";

/// Reads a [`SiteTable`] from Parquet.
///
/// Expected columns: `id: UInt64`, `exterior: List<Float64>` holding a
/// flattened ring, and `label: Int32` (nullable). Optional `country_code`
/// and `urbanization` columns are `Utf8`. Labels equal to the sentinel, null
/// labels, and negative labels all mark a site as unlabeled.
///
/// A null or undecodable exterior ring becomes an empty footprint rather than
/// failing the read, so that one bad row does not discard the whole table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SiteParquetReader {
    label_sentinel: i64,
}

impl Default for SiteParquetReader {
    fn default() -> Self {
        Self {
            label_sentinel: DEFAULT_UNLABELED_SENTINEL,
        }
    }
}

impl SiteParquetReader {
    /// Returns a reader using [`DEFAULT_UNLABELED_SENTINEL`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the label value that means "unlabeled".
    #[must_use]
    pub fn with_label_sentinel(mut self, sentinel: i64) -> Self {
        self.label_sentinel = sentinel;
        self
    }

    /// Returns the label value that means "unlabeled".
    #[must_use]
    pub fn label_sentinel(&self) -> i64 {
        self.label_sentinel
    }

    /// Reads the site table stored at `path`.
    ///
    /// # Errors
    /// Returns [`SiteParquetError::Io`] when the file cannot be opened, and
    /// every error [`Self::read`] returns.
    pub fn read_path(
        &self,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<SiteTable, SiteParquetError> {
        let file = File::open(path)?;
        self.read(name, file)
    }

    /// Reads the site table from any Parquet chunk reader.
    ///
    /// # Errors
    /// Returns [`SiteParquetError::Parquet`] when the footer or a row group
    /// cannot be decoded, and every error [`Self::read_batches`] returns.
    pub fn read<R>(&self, name: &str, reader: R) -> Result<SiteTable, SiteParquetError>
    where
        R: ChunkReader + 'static,
    {
        let batches = ParquetRecordBatchReaderBuilder::try_new(reader)?.build()?;
        self.read_batches(name, batches)
    }

    /// Builds the site table from Arrow record batches.
    ///
    /// # Errors
    /// Returns [`SiteParquetError::Arrow`] when a batch fails to load,
    /// [`SiteParquetError::ColumnNotFound`] or
    /// [`SiteParquetError::InvalidColumnType`] for a schema mismatch,
    /// [`SiteParquetError::NullValue`] for a null id,
    /// [`SiteParquetError::Urbanization`] for an unknown class name, and
    /// [`SiteParquetError::SiteTable`] when ids repeat.
    pub fn read_batches<I>(&self, name: &str, batches: I) -> Result<SiteTable, SiteParquetError>
    where
        I: IntoIterator<Item = Result<RecordBatch, ArrowError>>,
    {
        let mut sites = Vec::new();
        for batch in batches {
            let batch = batch?;
            self.append_batch(&batch, &mut sites)?;
        }
        Ok(SiteTable::new(name, sites)?)
    }

    fn append_batch(&self, batch: &RecordBatch, out: &mut Vec<Site>) -> Result<(), SiteParquetError> {
        let schema = batch.schema();
        let ids = downcast::<UInt64Array>(
            batch.column(required_column(&schema, ID_COLUMN)?),
            ID_COLUMN,
            "UInt64",
        )?;
        let exteriors = downcast::<ListArray>(
            batch.column(required_column(&schema, EXTERIOR_COLUMN)?),
            EXTERIOR_COLUMN,
            "List<Float64>",
        )?;
        let labels = downcast::<Int32Array>(
            batch.column(required_column(&schema, LABEL_COLUMN)?),
            LABEL_COLUMN,
            "Int32",
        )?;
        let countries = optional_column(&schema, COUNTRY_CODE_COLUMN)
            .map(|index| downcast::<StringArray>(batch.column(index), COUNTRY_CODE_COLUMN, "Utf8"))
            .transpose()?;
        let classes = optional_column(&schema, URBANIZATION_COLUMN)
            .map(|index| downcast::<StringArray>(batch.column(index), URBANIZATION_COLUMN, "Utf8"))
            .transpose()?;

        let first_row = out.len();
        out.reserve(batch.num_rows());
        for index in 0..batch.num_rows() {
            let row = first_row + index;
            if ids.is_null(index) {
                return Err(SiteParquetError::NullValue {
                    column: ID_COLUMN,
                    row,
                });
            }
            let footprint = if exteriors.is_null(index) {
                empty_polygon()
            } else {
                ring_to_polygon(&exteriors.value(index))?
            };
            let label = (!labels.is_null(index))
                .then(|| ClassLabel::decode(i64::from(labels.value(index)), self.label_sentinel))
                .flatten();
            let country = countries
                .filter(|array| !array.is_null(index))
                .map(|array| array.value(index));
            let urbanization = classes
                .filter(|array| !array.is_null(index))
                .map(|array| array.value(index).parse::<UrbanizationClass>())
                .transpose()
                .map_err(|source| SiteParquetError::Urbanization { row, source })?;
            out.push(
                Site::new(SiteId::new(ids.value(index)), footprint)
                    .with_label(label)
                    .with_country_code(country)
                    .with_urbanization(urbanization),
            );
        }
        Ok(())
    }
}
