use indexmap::IndexSet;

use crate::builder::VariableBuilder;
use crate::data::EventCursor;
use crate::{KinvarError, KinvarResult};

/// A consumer of the output table, one row per processed event.
pub trait EventSink {
    /// Receive the ordered output column names before any rows.
    fn set_schema(&mut self, names: &[String]) -> KinvarResult<()>;
    /// Receive one row of values in schema order.
    fn append_row(&mut self, row: &[f64]) -> KinvarResult<()>;
    /// Flush any buffered state after the last row.
    fn finish(&mut self) -> KinvarResult<()>;
}

/// An [`EventSink`] collecting the output table in memory, column by column.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl MemorySink {
    /// The output column names in schema order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The values of a named column, if present.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let index = self.names.iter().position(|n| n == name)?;
        Some(&self.columns[index])
    }

    /// The number of rows received.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
}

impl EventSink for MemorySink {
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
        Ok(())
    }
}

/// Drives the per-event loop: seek, invalidate, read the whole catalog, hand
/// the row to a sink.
///
/// Besides the generated variables, spectator expressions can be passed
/// through unchanged (under an alias) for downstream bookkeeping. Undefined
/// values are replaced by the configured sentinel (NaN by default) at the
/// sink boundary only.
pub struct Processor {
    builder: VariableBuilder,
    spectators: Vec<(String, String)>,
    sentinel: f64,
    progress: Option<Box<dyn FnMut(usize, usize)>>,
}

impl Processor {
    /// Create a processor over a built catalog.
    pub fn new(builder: VariableBuilder) -> Self {
        Self {
            builder,
            spectators: Vec::new(),
            sentinel: f64::NAN,
            progress: None,
        }
    }

    /// Replace the sentinel written for undefined values.
    pub fn with_sentinel(mut self, sentinel: f64) -> Self {
        self.sentinel = sentinel;
        self
    }

    /// Pass `expression` through to the output unchanged. The output column
    /// is named `alias`, or the expression itself when `alias` is `None`.
    pub fn add_spectator(&mut self, expression: &str, alias: Option<&str>) {
        self.spectators.push((
            alias.unwrap_or(expression).to_string(),
            expression.to_string(),
        ));
    }

    /// Install a callback invoked after each processed event with
    /// `(processed, total)` counts.
    pub fn with_progress<F: FnMut(usize, usize) + 'static>(mut self, callback: F) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// The builder whose catalog this processor evaluates.
    pub fn builder(&self) -> &VariableBuilder {
        &self.builder
    }

    /// Process events `first_event..first_event + max_events` (clamped to the
    /// source length; `None` runs to the end), writing one row per event to
    /// `sink`.
    ///
    /// Ranges allow a long scan to be chunked across independent processes,
    /// each with its own cursor and sink.
    pub fn process<S: EventSink>(
        &mut self,
        cursor: &mut EventCursor,
        sink: &mut S,
        first_event: usize,
        max_events: Option<usize>,
    ) -> KinvarResult<()> {
        let mut names: IndexSet<String> = IndexSet::new();
        for name in self
            .builder
            .names()
            .into_iter()
            .chain(self.spectators.iter().map(|(alias, _)| alias.clone()))
        {
            if !names.insert(name.clone()) {
                return Err(KinvarError::DuplicateName { name });
            }
        }
        let spectator_cells = self
            .spectators
            .iter()
            .map(|(_, expression)| cursor.register_expression(expression))
            .collect::<KinvarResult<Vec<_>>>()?;

        let names: Vec<String> = names.into_iter().collect();
        sink.set_schema(&names)?;

        let n = cursor.n_events();
        let first = first_event.min(n);
        let end = max_events.map_or(n, |m| first.saturating_add(m).min(n));
        let total = end - first;
        let mut row = Vec::with_capacity(names.len());
        for (processed, index) in (first..end).enumerate() {
            cursor.seek(index)?;
            self.builder.invalidate_all();
            row.clear();
            for entry in self.builder.catalog() {
                row.push(entry.quantity.value().unwrap_or(self.sentinel));
            }
            for cell in &spectator_cells {
                row.push(cell.get());
            }
            sink.append_row(&row)?;
            if let Some(progress) = &mut self.progress {
                progress(processed + 1, total);
            }
        }
        sink.finish()
    }
}
