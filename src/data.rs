use std::ops::Range;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;

use crate::{KinvarError, KinvarResult};

/// Methods for reading from and writing to Parquet files.
pub mod io;

/// A shared slot holding the current-event value of one registered expression.
///
/// The [`EventCursor`] overwrites every cell when it seeks to a new event, so
/// vector leaves hold onto cells once and simply read them per event. Cells
/// for the same expression are shared rather than duplicated.
#[derive(Clone, Debug)]
pub struct ExprCell(Arc<RwLock<f64>>);

impl ExprCell {
    fn new() -> Self {
        Self(Arc::new(RwLock::new(0.0)))
    }

    /// The value of the expression at the event the cursor currently points
    /// to.
    pub fn get(&self) -> f64 {
        *self.0.read()
    }

    pub(crate) fn set(&self, value: f64) {
        *self.0.write() = value;
    }
}

/// A bulk-readable store of per-event scalar expressions.
///
/// Implementors resolve an expression to a column and hand back a contiguous
/// range of its values in one call, so the cursor can amortize the read cost
/// over a whole batch of events.
pub trait EventSource {
    /// The total number of events in the store.
    fn n_events(&self) -> usize;
    /// Evaluate `expression` for `count` consecutive events starting at
    /// `start`.
    fn evaluate(&self, expression: &str, start: usize, count: usize) -> KinvarResult<Vec<f64>>;
}

/// An in-memory [`EventSource`] over named columns.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    columns: IndexMap<String, Vec<f64>>,
}

impl MemorySource {
    /// Create a source from a set of named columns. All columns must share a
    /// length.
    pub fn new(columns: IndexMap<String, Vec<f64>>) -> KinvarResult<Self> {
        let mut lengths = columns.values().map(Vec::len);
        if let Some(first) = lengths.next() {
            if lengths.any(|len| len != first) {
                return Err(KinvarError::Custom(
                    "all columns in a MemorySource must have the same length".to_string(),
                ));
            }
        }
        Ok(Self { columns })
    }
}

impl EventSource for MemorySource {
    fn n_events(&self) -> usize {
        self.columns.first().map_or(0, |(_, col)| col.len())
    }

    fn evaluate(&self, expression: &str, start: usize, count: usize) -> KinvarResult<Vec<f64>> {
        let column = self
            .columns
            .get(expression)
            .ok_or_else(|| KinvarError::ColumnNotFound {
                name: expression.to_string(),
            })?;
        Ok(column[start..start + count].to_vec())
    }
}

/// A cursor which walks an [`EventSource`] one event at a time while reading
/// the underlying columns in batches.
///
/// Expressions are registered up front (each one once, no matter how many
/// vectors reference it); seeking to an event loads the batch window
/// containing it, if not already loaded, and copies that event's values into
/// the registered [`ExprCell`]s.
pub struct EventCursor {
    source: Box<dyn EventSource>,
    batch_size: usize,
    expressions: IndexSet<String>,
    cells: Vec<ExprCell>,
    batches: Vec<Vec<f64>>,
    window: Option<Range<usize>>,
    current: Option<usize>,
}

impl EventCursor {
    /// Create a cursor over `source` reading `batch_size` events per bulk
    /// call.
    pub fn new(source: Box<dyn EventSource>, batch_size: usize) -> Self {
        Self {
            source,
            batch_size: batch_size.max(1),
            expressions: IndexSet::new(),
            cells: Vec::new(),
            batches: Vec::new(),
            window: None,
            current: None,
        }
    }

    /// The total number of events in the underlying source.
    pub fn n_events(&self) -> usize {
        self.source.n_events()
    }

    /// The index of the event the cursor currently points to, if any.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Register an expression to be read per event, returning the shared cell
    /// its values will land in. Registering the same expression twice yields
    /// the same cell.
    ///
    /// The expression is resolved against the source immediately, so an
    /// unknown column fails here rather than mid-scan.
    pub fn register_expression(&mut self, expression: &str) -> KinvarResult<ExprCell> {
        if let Some(index) = self.expressions.get_index_of(expression) {
            return Ok(self.cells[index].clone());
        }
        self.source.evaluate(expression, 0, 0)?;
        self.expressions.insert(expression.to_string());
        let cell = ExprCell::new();
        self.cells.push(cell.clone());
        self.batches.push(Vec::new());
        // a loaded window predates this expression, force a refill even when
        // the next seek targets the currently materialized event
        self.window = None;
        self.current = None;
        Ok(cell)
    }

    /// Point the cursor at event `index`, filling every registered cell with
    /// that event's values. Seeking within the loaded window is cheap;
    /// crossing a window boundary triggers one bulk read per expression.
    pub fn seek(&mut self, index: usize) -> KinvarResult<()> {
        let n = self.n_events();
        if index >= n {
            return Err(KinvarError::Custom(format!(
                "event index {index} out of range (source holds {n} events)"
            )));
        }
        if self.current == Some(index) {
            return Ok(());
        }
        let in_window = self.window.as_ref().is_some_and(|w| w.contains(&index));
        if !in_window {
            // a failed refill must leave the cursor stale, not pointing at a
            // window whose batches were partially overwritten
            self.window = None;
            let start = (index / self.batch_size) * self.batch_size;
            let count = self.batch_size.min(n - start);
            for (slot, expression) in self.batches.iter_mut().zip(&self.expressions) {
                *slot = self.source.evaluate(expression, start, count)?;
            }
            self.window = Some(start..start + count);
        }
        let start = self.window.as_ref().map_or(0, |w| w.start);
        for (cell, batch) in self.cells.iter().zip(&self.batches) {
            cell.set(batch[index - start]);
        }
        self.current = Some(index);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_data {
    use super::*;

    /// Two massless jets back to back in φ at pt 30 and 50, plus a lonely
    /// spectator column.
    pub(crate) fn two_jet_source(n: usize) -> MemorySource {
        let mut columns = IndexMap::new();
        columns.insert("jet1Pt".to_string(), vec![30.0; n]);
        columns.insert("jet1Eta".to_string(), vec![0.5; n]);
        columns.insert("jet1Phi".to_string(), vec![1.0; n]);
        columns.insert("jet2Pt".to_string(), vec![50.0; n]);
        columns.insert("jet2Eta".to_string(), vec![-0.5; n]);
        columns.insert(
            "jet2Phi".to_string(),
            vec![1.0 - std::f64::consts::PI; n],
        );
        columns.insert(
            "eventNumber".to_string(),
            (0..n).map(|i| i as f64).collect(),
        );
        MemorySource::new(columns).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingSource {
        inner: MemorySource,
        bulk_calls: Arc<AtomicUsize>,
    }

    impl EventSource for CountingSource {
        fn n_events(&self) -> usize {
            self.inner.n_events()
        }

        fn evaluate(&self, expression: &str, start: usize, count: usize) -> KinvarResult<Vec<f64>> {
            if count > 0 {
                self.bulk_calls.fetch_add(1, Ordering::Relaxed);
            }
            self.inner.evaluate(expression, start, count)
        }
    }

    fn ramp_source(n: usize) -> MemorySource {
        let mut columns = IndexMap::new();
        columns.insert("x".to_string(), (0..n).map(|i| i as f64).collect());
        columns.insert("y".to_string(), (0..n).map(|i| 2.0 * i as f64).collect());
        MemorySource::new(columns).unwrap()
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let mut columns = IndexMap::new();
        columns.insert("a".to_string(), vec![1.0, 2.0]);
        columns.insert("b".to_string(), vec![1.0]);
        assert!(MemorySource::new(columns).is_err());
    }

    #[test]
    fn unknown_column_fails_at_registration() {
        let mut cursor = EventCursor::new(Box::new(ramp_source(5)), 2);
        assert!(matches!(
            cursor.register_expression("missing"),
            Err(KinvarError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn cells_track_the_cursor() {
        let mut cursor = EventCursor::new(Box::new(ramp_source(10)), 3);
        let x = cursor.register_expression("x").unwrap();
        let y = cursor.register_expression("y").unwrap();
        for i in [0usize, 1, 5, 9, 2] {
            cursor.seek(i).unwrap();
            assert_eq!(x.get(), i as f64);
            assert_eq!(y.get(), 2.0 * i as f64);
        }
        assert!(cursor.seek(10).is_err());
    }

    #[test]
    fn duplicate_registration_shares_the_cell() {
        let mut cursor = EventCursor::new(Box::new(ramp_source(4)), 2);
        let a = cursor.register_expression("x").unwrap();
        let b = cursor.register_expression("x").unwrap();
        cursor.seek(3).unwrap();
        assert_eq!(a.get(), 3.0);
        assert_eq!(b.get(), 3.0);
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn one_bulk_read_per_expression_per_window() {
        let bulk_calls = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            inner: ramp_source(10),
            bulk_calls: bulk_calls.clone(),
        };
        let mut cursor = EventCursor::new(Box::new(source), 4);
        cursor.register_expression("x").unwrap();
        cursor.register_expression("y").unwrap();
        // events 0..4 live in one window
        for i in 0..4 {
            cursor.seek(i).unwrap();
        }
        assert_eq!(bulk_calls.load(Ordering::Relaxed), 2);
        // crossing into the next window costs one more bulk read per column
        cursor.seek(4).unwrap();
        assert_eq!(bulk_calls.load(Ordering::Relaxed), 4);
        // the final short window still loads cleanly
        cursor.seek(9).unwrap();
        assert_eq!(bulk_calls.load(Ordering::Relaxed), 6);
    }

    #[test]
    fn late_registration_refreshes_the_current_event() {
        let mut cursor = EventCursor::new(Box::new(ramp_source(6)), 4);
        let x = cursor.register_expression("x").unwrap();
        cursor.seek(1).unwrap();
        assert_eq!(x.get(), 1.0);
        // seeking back to the same event must still fill the new cell
        let y = cursor.register_expression("y").unwrap();
        cursor.seek(1).unwrap();
        assert_eq!(x.get(), 1.0);
        assert_eq!(y.get(), 2.0);
    }

    struct FlakySource {
        inner: MemorySource,
    }

    impl EventSource for FlakySource {
        fn n_events(&self) -> usize {
            self.inner.n_events()
        }

        fn evaluate(&self, expression: &str, start: usize, count: usize) -> KinvarResult<Vec<f64>> {
            if expression == "y" && start == 4 {
                return Err(KinvarError::Custom("read failed".to_string()));
            }
            self.inner.evaluate(expression, start, count)
        }
    }

    #[test]
    fn failed_refill_leaves_no_stale_window() {
        let source = FlakySource {
            inner: ramp_source(8),
        };
        let mut cursor = EventCursor::new(Box::new(source), 4);
        let x = cursor.register_expression("x").unwrap();
        let y = cursor.register_expression("y").unwrap();
        cursor.seek(1).unwrap();
        assert_eq!(x.get(), 1.0);
        // the second window fails after the first column was already read
        assert!(cursor.seek(4).is_err());
        // seeking back into the first window must reload it, not serve the
        // partially overwritten batches
        cursor.seek(2).unwrap();
        assert_eq!(x.get(), 2.0);
        assert_eq!(y.get(), 4.0);
    }

    #[test]
    fn late_registration_invalidates_the_window() {
        let mut cursor = EventCursor::new(Box::new(ramp_source(6)), 4);
        let x = cursor.register_expression("x").unwrap();
        cursor.seek(1).unwrap();
        assert_eq!(x.get(), 1.0);
        let y = cursor.register_expression("y").unwrap();
        cursor.seek(2).unwrap();
        assert_eq!(x.get(), 2.0);
        assert_eq!(y.get(), 4.0);
    }
}
