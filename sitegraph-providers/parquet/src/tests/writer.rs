use std::{collections::BTreeSet, fs::File, path::Path};

use arrow_array::{Array, ListArray, RecordBatch, StringArray, UInt64Array};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rstest::{fixture, rstest};
use sitegraph_core::{Dataset, HopParams, SamplingStrategy, SiteGraphBuilder, SiteId};

use super::support::{SiteRow, site_batch};
use super::{DatasetWriter, SiteParquetReader};
use crate::writer::{membership_batch, neighborhood_batch};

#[fixture]
fn dataset() -> Dataset {
    let rows: Vec<SiteRow> = (0..6_u32)
        .flat_map(|row| (0..6_u32).map(move |col| (row, col)))
        .map(|(row, col)| {
            let id = u64::from(row * 6 + col);
            SiteRow::square(id, f64::from(col) * 10.0, f64::from(row) * 10.0, Some(1))
        })
        .collect();
    let sites = SiteParquetReader::new()
        .read_batches("grid", [Ok(site_batch(&rows))])
        .expect("valid site table");
    SiteGraphBuilder::new()
        .with_strategy(SamplingStrategy::Hop(HopParams::new(1).expect("one hop")))
        .build()
        .expect("configuration is valid")
        .run_with_seeds(&sites, [7, 10, 25, 28].map(SiteId::new))
        .expect("run succeeds")
}

fn read_back(path: &Path) -> Vec<RecordBatch> {
    let file = File::open(path).expect("table exists");
    ParquetRecordBatchReaderBuilder::try_new(file)
        .expect("parquet metadata")
        .build()
        .expect("reader")
        .collect::<Result<Vec<_>, _>>()
        .expect("batches")
}

fn row_count(batches: &[RecordBatch]) -> usize {
    batches.iter().map(RecordBatch::num_rows).sum()
}

#[rstest]
fn writes_all_tables(dataset: Dataset) {
    let dir = tempfile::tempdir().expect("tempdir");
    let tables = DatasetWriter::new()
        .write(&dataset, dir.path().join("out"))
        .expect("tables are written");

    assert_eq!(row_count(&read_back(&tables.neighborhoods)), dataset.neighborhood_rows().len());
    assert_eq!(row_count(&read_back(&tables.edges)), dataset.edge_rows().len());
    assert_eq!(row_count(&read_back(&tables.membership)), dataset.membership_rows().len());

    let masks = read_back(&tables.split_masks);
    assert_eq!(row_count(&masks), dataset.split_mask_rows().len());
    let splits: BTreeSet<String> = masks
        .iter()
        .flat_map(|batch| {
            let column = batch
                .column_by_name("split")
                .expect("split column")
                .as_any()
                .downcast_ref::<StringArray>()
                .expect("utf8 splits")
                .clone();
            (0..column.len()).map(move |row| column.value(row).to_owned())
        })
        .collect();
    assert!(splits.iter().all(|split| ["train", "val", "test"].contains(&split.as_str())));
}

#[rstest]
fn small_row_groups_round_trip(dataset: Dataset) {
    let dir = tempfile::tempdir().expect("tempdir");
    let tables = DatasetWriter::new()
        .with_max_row_group_size(4)
        .write(&dataset, dir.path())
        .expect("tables are written");
    let batches = read_back(&tables.neighborhoods);
    assert_eq!(row_count(&batches), dataset.neighborhood_rows().len());
}

#[rstest]
fn neighborhood_batch_marks_one_center_per_neighborhood(dataset: Dataset) {
    let batch = neighborhood_batch(&dataset).expect("batch");
    let centers = batch
        .column_by_name("is_center")
        .expect("is_center column")
        .as_any()
        .downcast_ref::<arrow_array::BooleanArray>()
        .expect("booleans")
        .true_count();
    assert_eq!(centers, dataset.neighborhoods().len());
    let hops = batch.column_by_name("hop").expect("hop column");
    assert_eq!(hops.null_count(), 0, "hop mode tags every member");
}

#[rstest]
fn membership_lists_match_the_index(dataset: Dataset) {
    let batch = membership_batch(&dataset).expect("batch");
    let sites = batch
        .column(0)
        .as_any()
        .downcast_ref::<UInt64Array>()
        .expect("site ids");
    let lists = batch
        .column(1)
        .as_any()
        .downcast_ref::<ListArray>()
        .expect("id lists");
    for (index, row) in dataset.membership_rows().iter().enumerate() {
        assert_eq!(sites.value(index), row.site_id.get());
        assert_eq!(lists.value(index).len(), row.neighborhood_ids.len());
    }
}
