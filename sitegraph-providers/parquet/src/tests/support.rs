use std::sync::Arc;

use arrow_array::{ArrayRef, Int32Array, ListArray, RecordBatch, StringArray, UInt64Array};
use arrow_array::types::Float64Type;
use arrow_schema::{DataType, Field, Schema};
use bytes::Bytes;
use parquet::arrow::arrow_writer::ArrowWriter;

/// One input row of the site table.
#[derive(Clone, Debug, Default)]
pub(crate) struct SiteRow {
    pub id: u64,
    pub ring: Option<Vec<f64>>,
    pub label: Option<i32>,
    pub country: Option<&'static str>,
    pub urbanization: Option<&'static str>,
}

impl SiteRow {
    pub(crate) fn square(id: u64, x: f64, y: f64, label: Option<i32>) -> Self {
        Self {
            id,
            ring: Some(square_ring(x, y, 2.0)),
            label,
            ..Self::default()
        }
    }
}

/// Flattened closed ring of an axis-aligned square.
pub(crate) fn square_ring(x: f64, y: f64, side: f64) -> Vec<f64> {
    vec![
        x, y,
        x + side, y,
        x + side, y + side,
        x, y + side,
        x, y,
    ]
}

pub(crate) fn site_batch(rows: &[SiteRow]) -> RecordBatch {
    let item = Field::new("item", DataType::Float64, true);
    let schema = Schema::new(vec![
        Field::new("id", DataType::UInt64, false),
        Field::new_list("exterior", item, true),
        Field::new("label", DataType::Int32, true),
        Field::new("country_code", DataType::Utf8, true),
        Field::new("urbanization", DataType::Utf8, true),
    ]);
    let rings = ListArray::from_iter_primitive::<Float64Type, _, _>(
        rows.iter()
            .map(|row| row.ring.as_ref().map(|ring| ring.iter().copied().map(Some))),
    );
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|row| row.id))),
        Arc::new(rings),
        Arc::new(Int32Array::from_iter(rows.iter().map(|row| row.label))),
        Arc::new(StringArray::from_iter(rows.iter().map(|row| row.country))),
        Arc::new(StringArray::from_iter(rows.iter().map(|row| row.urbanization))),
    ];
    RecordBatch::try_new(Arc::new(schema), columns).expect("batch")
}

pub(crate) fn write_parquet(batch: &RecordBatch) -> Bytes {
    let mut buffer = Vec::new();
    {
        let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), None).expect("writer");
        writer.write(batch).expect("write");
        writer.close().expect("close");
    }
    Bytes::from(buffer)
}
