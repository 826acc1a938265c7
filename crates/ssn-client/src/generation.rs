//! Generation counter guarding shared state against stale async results.
//!
//! Every query takes a [`GenerationToken`] before it starts; beginning a
//! newer query (or invalidating) makes all older tokens stale. Results are
//! applied only while their token is still current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    current: Arc<AtomicU64>,
}

#[derive(Debug, Clone)]
pub struct GenerationToken {
    id: u64,
    current: Arc<AtomicU64>,
}

impl RequestGeneration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation; every earlier token becomes stale.
    #[must_use]
    pub fn begin(&self) -> GenerationToken {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        GenerationToken {
            id,
            current: Arc::clone(&self.current),
        }
    }

    /// Makes every outstanding token stale without starting a query.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

impl GenerationToken {
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.id
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_token_supersedes_older() {
        let generation = RequestGeneration::new();
        let first = generation.begin();
        assert!(first.is_current());
        let second = generation.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
    }

    #[test]
    fn invalidate_stales_outstanding_tokens() {
        let generation = RequestGeneration::new();
        let token = generation.begin();
        generation.invalidate();
        assert!(!token.is_current());
    }

    #[test]
    fn clones_share_the_counter() {
        let generation = RequestGeneration::new();
        let token = generation.begin();
        generation.clone().begin();
        assert!(!token.is_current());
    }
}
