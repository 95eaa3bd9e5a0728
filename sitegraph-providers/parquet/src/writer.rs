//! Dataset export to Parquet.
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow_array::builder::{ListBuilder, UInt64Builder};
use arrow_array::{
    ArrayRef, BooleanArray, Float64Array, RecordBatch, StringArray, UInt32Array, UInt64Array,
};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use sitegraph_core::{Dataset, NeighborhoodId, SiteId};

use crate::errors::SiteParquetError;

pub const NEIGHBORHOODS_FILE: &str = "neighborhoods.parquet";
pub const EDGES_FILE: &str = "edges.parquet";
pub const MEMBERSHIP_FILE: &str = "membership.parquet";
pub const SPLIT_MASKS_FILE: &str = "split_masks.parquet";

/// Paths of the tables written by [`DatasetWriter::write`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WrittenTables {
    pub neighborhoods: PathBuf,
    pub edges: PathBuf,
    pub membership: PathBuf,
    pub split_masks: PathBuf,
}

/// Writes the four dataset tables as Parquet files.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DatasetWriter {
    max_row_group_size: Option<usize>,
}

impl DatasetWriter {
    /// Returns a writer using the Parquet default row group size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of rows per Parquet row group.
    #[must_use]
    pub fn with_max_row_group_size(mut self, rows: usize) -> Self {
        self.max_row_group_size = Some(rows);
        self
    }

    /// Writes every table into `dir`, creating it when missing.
    ///
    /// # Errors
    /// Returns [`SiteParquetError::Io`] when the directory or a file cannot
    /// be created, and [`SiteParquetError::Arrow`] or
    /// [`SiteParquetError::Parquet`] when a table fails to encode.
    pub fn write(
        &self,
        dataset: &Dataset,
        dir: impl AsRef<Path>,
    ) -> Result<WrittenTables, SiteParquetError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let tables = WrittenTables {
            neighborhoods: dir.join(NEIGHBORHOODS_FILE),
            edges: dir.join(EDGES_FILE),
            membership: dir.join(MEMBERSHIP_FILE),
            split_masks: dir.join(SPLIT_MASKS_FILE),
        };
        self.write_file(&tables.neighborhoods, &neighborhood_batch(dataset)?)?;
        self.write_file(&tables.edges, &edge_batch(dataset)?)?;
        self.write_file(&tables.membership, &membership_batch(dataset)?)?;
        self.write_file(&tables.split_masks, &split_mask_batch(dataset)?)?;
        Ok(tables)
    }

    /// Writes one batch as a complete Parquet file into `sink`.
    ///
    /// # Errors
    /// Returns [`SiteParquetError::Parquet`] when encoding or flushing fails.
    pub fn write_batch<W>(&self, sink: W, batch: &RecordBatch) -> Result<(), SiteParquetError>
    where
        W: Write + Send,
    {
        let properties = self
            .max_row_group_size
            .map(|rows| WriterProperties::builder().set_max_row_group_size(rows).build());
        let mut writer = ArrowWriter::try_new(sink, batch.schema(), properties)?;
        writer.write(batch)?;
        writer.close()?;
        Ok(())
    }

    fn write_file(&self, path: &Path, batch: &RecordBatch) -> Result<(), SiteParquetError> {
        self.write_batch(File::create(path)?, batch)
    }
}

fn site_column(values: impl Iterator<Item = SiteId>) -> ArrayRef {
    Arc::new(UInt64Array::from_iter_values(values.map(SiteId::get)))
}

fn neighborhood_column(values: impl Iterator<Item = NeighborhoodId>) -> ArrayRef {
    Arc::new(UInt64Array::from_iter_values(values.map(raw_neighborhood)))
}

fn raw_neighborhood(id: NeighborhoodId) -> u64 {
    id.get() as u64
}

fn id_field(name: &str) -> Field {
    Field::new(name, DataType::UInt64, false)
}

pub(crate) fn neighborhood_batch(dataset: &Dataset) -> Result<RecordBatch, SiteParquetError> {
    let rows = dataset.neighborhood_rows();
    let schema = Schema::new(vec![
        id_field("neighborhood_id"),
        id_field("member_site_id"),
        Field::new("is_center", DataType::Boolean, false),
        Field::new("hop", DataType::UInt32, true),
    ]);
    let columns: Vec<ArrayRef> = vec![
        neighborhood_column(rows.iter().map(|row| row.neighborhood_id)),
        site_column(rows.iter().map(|row| row.member_site_id)),
        Arc::new(BooleanArray::from_iter(rows.iter().map(|row| Some(row.is_center)))),
        Arc::new(UInt32Array::from_iter(rows.iter().map(|row| row.hop))),
    ];
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

pub(crate) fn edge_batch(dataset: &Dataset) -> Result<RecordBatch, SiteParquetError> {
    let rows = dataset.edge_rows();
    let schema = Schema::new(vec![
        id_field("neighborhood_id"),
        id_field("start_site_id"),
        id_field("end_site_id"),
        Field::new("distance", DataType::Float64, false),
        Field::new("hop", DataType::UInt32, true),
    ]);
    let columns: Vec<ArrayRef> = vec![
        neighborhood_column(rows.iter().map(|row| row.neighborhood_id)),
        site_column(rows.iter().map(|row| row.start_site_id)),
        site_column(rows.iter().map(|row| row.end_site_id)),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|row| row.distance))),
        Arc::new(UInt32Array::from_iter(rows.iter().map(|row| row.hop))),
    ];
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

pub(crate) fn membership_batch(dataset: &Dataset) -> Result<RecordBatch, SiteParquetError> {
    let rows = dataset.membership_rows();
    let mut lists = ListBuilder::new(UInt64Builder::new())
        .with_field(Field::new("item", DataType::UInt64, false));
    for row in &rows {
        for &id in &row.neighborhood_ids {
            lists.values().append_value(raw_neighborhood(id));
        }
        lists.append(true);
    }
    let schema = Schema::new(vec![
        id_field("site_id"),
        Field::new_list(
            "neighborhood_ids",
            Field::new("item", DataType::UInt64, false),
            false,
        ),
    ]);
    let columns: Vec<ArrayRef> = vec![
        site_column(rows.iter().map(|row| row.site_id)),
        Arc::new(lists.finish()),
    ];
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

pub(crate) fn split_mask_batch(dataset: &Dataset) -> Result<RecordBatch, SiteParquetError> {
    let rows = dataset.split_mask_rows();
    let schema = Schema::new(vec![
        id_field("site_id"),
        id_field("neighborhood_id"),
        Field::new("split", DataType::Utf8, false),
        Field::new("usable", DataType::Boolean, false),
    ]);
    let columns: Vec<ArrayRef> = vec![
        site_column(rows.iter().map(|row| row.site_id)),
        neighborhood_column(rows.iter().map(|row| row.neighborhood_id)),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|row| row.split.as_str()))),
        Arc::new(BooleanArray::from_iter(rows.iter().map(|row| Some(row.usable)))),
    ];
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}
