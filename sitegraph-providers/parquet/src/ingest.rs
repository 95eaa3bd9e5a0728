//! Column lookup and ring decoding for site batches.
use arrow_array::{Array, ArrayRef, Float64Array};
use arrow_schema::Schema;
use geo::{Coord, LineString, Polygon};

use crate::errors::SiteParquetError;

pub(crate) fn required_column(schema: &Schema, column: &'static str) -> Result<usize, SiteParquetError> {
    schema
        .index_of(column)
        .map_err(|_| SiteParquetError::ColumnNotFound { column })
}

pub(crate) fn optional_column(schema: &Schema, column: &str) -> Option<usize> {
    schema.index_of(column).ok()
}

/// Downcasts `array` to the concrete type `A` expected for `column`.
pub(crate) fn downcast<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column: &'static str,
    expected: &'static str,
) -> Result<&'a A, SiteParquetError> {
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| SiteParquetError::InvalidColumnType {
            column,
            expected,
            actual: array.data_type().clone(),
        })
}

/// Builds a polygon from a flattened `x0, y0, x1, y1, ...` exterior ring.
///
/// A ring with a null coordinate or an odd number of values cannot be
/// decoded and yields an empty polygon, as does an empty ring; preparation
/// skips and reports those sites later. Only a mistyped value array fails.
pub(crate) fn ring_to_polygon(values: &ArrayRef) -> Result<Polygon<f64>, SiteParquetError> {
    let floats = downcast::<Float64Array>(values, "exterior", "List<Float64>")?;
    let flat = floats.values();
    if floats.null_count() > 0 || flat.len() % 2 != 0 {
        return Ok(empty_polygon());
    }
    let ring: Vec<Coord<f64>> = flat
        .chunks_exact(2)
        .map(|pair| Coord {
            x: pair[0],
            y: pair[1],
        })
        .collect();
    Ok(Polygon::new(LineString::new(ring), Vec::new()))
}

pub(crate) fn empty_polygon() -> Polygon<f64> {
    Polygon::new(LineString::new(Vec::new()), Vec::new())
}
