use parking_lot::RwLock;

/// A single-value memo slot used to cache a per-event computation.
///
/// The slot starts out stale, fills itself on the first read of an event, and
/// is cleared when the cursor advances. Interior mutability keeps the cached
/// node graph shareable behind plain `Arc`s.
#[derive(Debug)]
pub(crate) struct Memo<T> {
    slot: RwLock<Option<T>>,
}

impl<T: Clone> Memo<T> {
    /// Create an empty (stale) memo slot.
    pub(crate) fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Return the cached value, computing and storing it first if the slot is
    /// stale.
    pub(crate) fn get_or_compute<F>(&self, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        if let Some(value) = self.slot.read().as_ref() {
            return value.clone();
        }
        let value = compute();
        *self.slot.write() = Some(value.clone());
        value
    }

    /// Mark the slot stale, returning whether it actually held a value.
    ///
    /// The return value lets callers skip re-invalidating subgraphs that were
    /// never filled in the first place.
    pub(crate) fn clear(&self) -> bool {
        self.slot.write().take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memo_computes_once() {
        let memo = Memo::new();
        let mut calls = 0;
        let a = memo.get_or_compute(|| {
            calls += 1;
            7usize
        });
        let b = memo.get_or_compute(|| {
            calls += 1;
            8usize
        });
        assert_eq!(a, 7);
        assert_eq!(b, 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn clear_reports_cached_state() {
        let memo = Memo::new();
        assert!(!memo.clear());
        memo.get_or_compute(|| 1usize);
        assert!(memo.clear());
        assert!(!memo.clear());
        assert_eq!(memo.get_or_compute(|| 2usize), 2);
    }
}
