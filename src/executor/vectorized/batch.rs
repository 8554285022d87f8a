//! Column bindings of the dataset, stored as an Arrow `RecordBatch`.

use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Float64Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::{Result, VecformError};
use crate::types::{DataRow, RowId, DATA_COLUMNS};

/// Name of the row identifier column.
pub const ROW_ID_COLUMN: &str = "row_id";

/// Read-only, column-oriented view of the dataset.
///
/// Every numeric column is finite and non-null; values are normalized
/// when the batch is built.
#[derive(Debug, Clone)]
pub struct ColumnBatch {
    /// `row_id` followed by `a`, `b`, `c`, `d`.
    batch: RecordBatch,
}

impl ColumnBatch {
    /// Builds a batch from source rows, replacing missing and non-finite
    /// values with zero.
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if the record batch cannot be assembled.
    pub fn from_rows(rows: &[DataRow]) -> Result<Self> {
        let mut row_ids = Vec::with_capacity(rows.len());
        let mut columns: [Vec<f64>; 4] = Default::default();
        for column in &mut columns {
            column.reserve(rows.len());
        }

        for row in rows {
            row_ids.push(row.id);
            for (column, value) in columns.iter_mut().zip(row.coerced()) {
                column.push(value);
            }
        }

        Self::try_new(row_ids, columns)
    }

    /// Builds a batch from row ids and the four column vectors.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the column lengths disagree.
    pub fn try_new(row_ids: Vec<RowId>, columns: [Vec<f64>; 4]) -> Result<Self> {
        if let Some(bad) = columns.iter().position(|c| c.len() != row_ids.len()) {
            return Err(VecformError::StorageError(format!(
                "Column {} has {} values, expected {}",
                DATA_COLUMNS[bad],
                columns[bad].len(),
                row_ids.len()
            )));
        }

        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(5);
        arrays.push(Arc::new(Int64Array::from(row_ids)));
        for column in columns {
            let finite: Vec<f64> = column
                .into_iter()
                .map(|v| if v.is_finite() { v } else { 0.0 })
                .collect();
            arrays.push(Arc::new(Float64Array::from(finite)));
        }

        let batch = RecordBatch::try_new(Self::schema_ref(), arrays)?;
        Ok(Self { batch })
    }

    /// Returns the Arrow schema shared by all dataset batches.
    #[must_use]
    pub fn schema_ref() -> SchemaRef {
        let mut fields = vec![Field::new(ROW_ID_COLUMN, DataType::Int64, false)];
        fields.extend(
            DATA_COLUMNS
                .iter()
                .map(|name| Field::new(*name, DataType::Float64, false)),
        );
        Arc::new(Schema::new(fields))
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Returns the row identifiers.
    #[must_use]
    pub fn row_ids(&self) -> &Int64Array {
        self.batch.column(0).as_primitive()
    }

    /// Returns a numeric column by name.
    ///
    /// Only the declared data columns resolve; `row_id` is not bindable.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Float64Array> {
        if !DATA_COLUMNS.contains(&name) {
            return None;
        }
        self.batch
            .column_by_name(name)
            .and_then(|col| col.as_primitive_opt::<Float64Type>())
    }
}
