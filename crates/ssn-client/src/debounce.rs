use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Delay applied to category and subcategory selections.
pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

/// Last-write-wins debouncer for filter selections.
///
/// Each call to [`settle`](Self::settle) supersedes every pending one: only
/// the most recent value resolves to `Some` once the delay has passed.
#[derive(Debug, Clone)]
pub struct FilterDebouncer {
    delay: Duration,
    latest: Arc<AtomicU64>,
}

impl Default for FilterDebouncer {
    fn default() -> Self {
        Self::new(FILTER_DEBOUNCE)
    }
}

impl FilterDebouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Waits out the delay and returns `value` unless a newer call arrived
    /// in the meantime.
    pub async fn settle<T>(&self, value: T) -> Option<T> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if self.latest.load(Ordering::SeqCst) == ticket {
            Some(value)
        } else {
            tracing::trace!(ticket, "filter change superseded");
            None
        }
    }
}
