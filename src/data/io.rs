use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Float64Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};
use indexmap::IndexMap;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use crate::data::{EventSource, MemorySource};
use crate::processor::EventSink;
use crate::{KinvarError, KinvarResult};

/// An [`EventSource`] backed by a Parquet file.
///
/// All float-typed columns are read into memory when the file is opened
/// (other column types are skipped), so subsequent bulk reads are plain
/// slices.
pub struct ParquetSource {
    columns: MemorySource,
}

impl ParquetSource {
    /// Open a Parquet file, expanding environment variables and `~` in the
    /// path.
    pub fn open<P: AsRef<str>>(path: P) -> KinvarResult<Self> {
        let expanded = shellexpand::full(path.as_ref())?;
        let file = File::open(Path::new(expanded.as_ref()).canonicalize()?)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let mut columns: IndexMap<String, Vec<f64>> = IndexMap::new();
        for batch in reader {
            let batch = batch?;
            let schema = batch.schema();
            for (i, field) in schema.fields().iter().enumerate() {
                let Some(values) = float_column(batch.column(i)) else {
                    continue;
                };
                columns.entry(field.name().clone()).or_default().extend(values);
            }
        }
        Ok(Self {
            columns: MemorySource::new(columns)?,
        })
    }
}

fn float_column(array: &ArrayRef) -> Option<Vec<f64>> {
    if let Some(arr) = array.as_any().downcast_ref::<Float64Array>() {
        return Some(arr.values().to_vec());
    }
    if let Some(arr) = array.as_any().downcast_ref::<Float32Array>() {
        return Some(arr.values().iter().map(|v| *v as f64).collect());
    }
    None
}

impl EventSource for ParquetSource {
    fn n_events(&self) -> usize {
        self.columns.n_events()
    }

    fn evaluate(&self, expression: &str, start: usize, count: usize) -> KinvarResult<Vec<f64>> {
        self.columns.evaluate(expression, start, count)
    }
}

/// An [`EventSink`] which writes the output table to a Parquet file.
///
/// Rows are buffered in memory and flushed as a single record batch on
/// [`finish`](EventSink::finish).
pub struct ParquetSink {
    path: String,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ParquetSink {
    /// Create a sink writing to `path` (environment variables and `~` are
    /// expanded).
    pub fn create<P: AsRef<str>>(path: P) -> KinvarResult<Self> {
        let expanded = shellexpand::full(path.as_ref())?;
        Ok(Self {
            path: expanded.into_owned(),
            names: Vec::new(),
            columns: Vec::new(),
        })
    }
}

impl EventSink for ParquetSink {
    fn set_schema(&mut self, names: &[String]) -> KinvarResult<()> {
        self.names = names.to_vec();
        self.columns = vec![Vec::new(); names.len()];
        Ok(())
    }

    fn append_row(&mut self, row: &[f64]) -> KinvarResult<()> {
        if row.len() != self.columns.len() {
            return Err(KinvarError::Custom(format!(
                "row has {} values but the schema has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(*value);
        }
        Ok(())
    }

    fn finish(&mut self) -> KinvarResult<()> {
        let fields: Vec<Field> = self
            .names
            .iter()
            .map(|name| Field::new(name, DataType::Float64, false))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let arrays: Vec<ArrayRef> = self
            .columns
            .iter()
            .map(|column| Arc::new(Float64Array::from(column.clone())) as ArrayRef)
            .collect();
        let batch = RecordBatch::try_new(schema.clone(), arrays)?;
        let file = File::create(&self.path)?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parquet_round_trip() {
        let path = std::env::temp_dir().join("kinvar_io_round_trip.parquet");
        let path = path.to_str().unwrap().to_string();
        let mut sink = ParquetSink::create(&path).unwrap();
        sink.set_schema(&["a".to_string(), "b".to_string()]).unwrap();
        sink.append_row(&[1.0, 10.0]).unwrap();
        sink.append_row(&[2.0, 20.0]).unwrap();
        sink.append_row(&[3.0, 30.0]).unwrap();
        sink.finish().unwrap();

        let source = ParquetSource::open(&path).unwrap();
        assert_eq!(source.n_events(), 3);
        assert_eq!(source.evaluate("a", 0, 3).unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(source.evaluate("b", 1, 2).unwrap(), vec![20.0, 30.0]);
        assert!(source.evaluate("c", 0, 1).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn row_width_is_checked() {
        let mut sink = ParquetSink::create("unused.parquet").unwrap();
        sink.set_schema(&["a".to_string()]).unwrap();
        assert!(sink.append_row(&[1.0, 2.0]).is_err());
    }
}
