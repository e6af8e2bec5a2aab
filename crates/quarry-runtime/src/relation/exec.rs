//! The per-relation execution cell.
//!
//! State machine: unexecuted -> executing -> memoized. The memo lock is held
//! across the network call so concurrent callers on one relation block on
//! the winner and then read its result. A failed execution leaves the cell
//! unexecuted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::result::SearchResult;

#[derive(Debug, Default)]
pub(crate) struct ExecCell {
    memo: Mutex<Option<Arc<SearchResult>>>,
    /// Found count from a minimized probe fetch.
    probe: Mutex<Option<u64>>,
    /// Inspection results. Never promoted to the memo.
    preview: Mutex<Option<(usize, Arc<SearchResult>)>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ExecCell {
    /// The memoized result, running `fetch` at most once per successful
    /// execution.
    pub(crate) fn get_or_execute(
        &self,
        fetch: impl FnOnce() -> Result<SearchResult>,
    ) -> Result<Arc<SearchResult>> {
        let mut memo = lock(&self.memo);
        if let Some(result) = memo.as_ref() {
            return Ok(Arc::clone(result));
        }
        let result = Arc::new(fetch()?);
        *memo = Some(Arc::clone(&result));
        Ok(result)
    }

    pub(crate) fn memoized(&self) -> Option<Arc<SearchResult>> {
        lock(&self.memo).clone()
    }

    pub(crate) fn is_memoized(&self) -> bool {
        lock(&self.memo).is_some()
    }

    pub(crate) fn get_or_probe(&self, fetch: impl FnOnce() -> Result<u64>) -> Result<u64> {
        let mut probe = lock(&self.probe);
        if let Some(found) = *probe {
            return Ok(found);
        }
        let found = fetch()?;
        *probe = Some(found);
        Ok(found)
    }

    /// A preview of at least `n` hits, refetched when the cached one is
    /// smaller.
    pub(crate) fn get_or_preview(
        &self,
        n: usize,
        fetch: impl FnOnce() -> Result<SearchResult>,
    ) -> Result<Arc<SearchResult>> {
        let mut preview = lock(&self.preview);
        if let Some((size, result)) = preview.as_ref()
            && *size >= n
        {
            return Ok(Arc::clone(result));
        }
        let result = Arc::new(fetch()?);
        *preview = Some((n, Arc::clone(&result)));
        Ok(result)
    }
}
