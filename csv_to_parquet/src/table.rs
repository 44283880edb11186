//! In-memory table handling: CSV in, normalize, validate, split, encode.

use std::io::Cursor;
use std::sync::Arc;

use arrow::array::{Array, BooleanArray, StringArray};
use arrow::compute::{concat_batches, filter_record_batch};
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::IngestError;

/// Columns every input must carry once headers are normalized.
pub(crate) const REQUIRED_COLUMNS: [&str; 3] = ["id", "name", "email"];

/// Columns whose null or empty value sends a row to quarantine.
pub(crate) const KEY_COLUMNS: [&str; 2] = ["id", "email"];

/// Rows split by the data-quality rule. Order within each side follows the
/// source table.
#[derive(Debug)]
pub(crate) struct Partition {
    pub good: RecordBatch,
    pub bad: RecordBatch,
}

/// Parse CSV text with a header row into a single batch.
///
/// Column types are inferred over the whole object. A column with no values
/// at all is read as UTF-8. Rows shorter than the header are padded with
/// nulls.
pub(crate) fn load_table(data: &[u8]) -> Result<RecordBatch, IngestError> {
    let format = Format::default()
        .with_header(true)
        .with_truncated_rows(true);
    let (inferred, _) = format.infer_schema(Cursor::new(data), None)?;

    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| match f.data_type() {
            DataType::Null => Field::new(f.name(), DataType::Utf8, true),
            _ => f.as_ref().clone(),
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    if schema.fields().is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_truncated_rows(true)
        .build(Cursor::new(data))?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Trim, lower-case, and replace spaces with underscores.
pub(crate) fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Rename every column to its normalized form. Data is untouched.
pub(crate) fn normalize_columns(batch: &RecordBatch) -> Result<RecordBatch, IngestError> {
    let schema = batch.schema();
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone().with_name(normalize_column_name(f.name())))
        .collect();
    let renamed = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    Ok(RecordBatch::try_new_with_options(
        renamed,
        batch.columns().to_vec(),
        &options,
    )?)
}

/// Names from [`REQUIRED_COLUMNS`] absent from `schema`, in declaration order.
pub(crate) fn missing_columns(schema: &Schema) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|name| schema.column_with_name(name).is_none())
        .map(|name| name.to_string())
        .collect()
}

pub(crate) fn validate_columns(batch: &RecordBatch) -> Result<(), IngestError> {
    let missing = missing_columns(&batch.schema());
    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestError::MissingColumns(missing))
    }
}

/// Split rows on null or empty [`KEY_COLUMNS`] values. When normalization
/// leaves several columns under one key name, each of them is checked.
pub(crate) fn partition_rows(batch: &RecordBatch) -> Result<Partition, IngestError> {
    let schema = batch.schema();
    let mut keep = vec![true; batch.num_rows()];
    for name in KEY_COLUMNS {
        let indices: Vec<usize> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| f.name() == name)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            return Err(IngestError::MissingColumns(vec![name.to_string()]));
        }

        for index in indices {
            let column = batch.column(index);
            let nulls = column.logical_nulls();
            let strings = column.as_any().downcast_ref::<StringArray>();
            for (row, keep_row) in keep.iter_mut().enumerate() {
                let null = nulls.as_ref().is_some_and(|n| n.is_null(row));
                if null || strings.is_some_and(|s| s.value(row).is_empty()) {
                    *keep_row = false;
                }
            }
        }
    }

    let good_mask: BooleanArray = keep.iter().map(|k| Some(*k)).collect();
    let bad_mask: BooleanArray = keep.iter().map(|k| Some(!*k)).collect();
    Ok(Partition {
        good: filter_record_batch(batch, &good_mask)?,
        bad: filter_record_batch(batch, &bad_mask)?,
    })
}

/// CSV with a header row; nulls become empty fields.
pub(crate) fn encode_csv(batch: &RecordBatch) -> Result<Vec<u8>, IngestError> {
    let mut writer = WriterBuilder::new().with_header(true).build(Vec::new());
    writer.write(batch)?;
    Ok(writer.into_inner())
}

/// Single Parquet file, snappy compressed.
pub(crate) fn encode_parquet(batch: &RecordBatch) -> Result<Vec<u8>, IngestError> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(buf)
}
