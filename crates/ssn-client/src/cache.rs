//! Bounded, TTL-limited cache of normalized query results.
//!
//! Constructed by whoever composes the query client and injected into it;
//! there is no global instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use ssn_core::ServiceWithDistance;

#[derive(Debug)]
struct Entry {
    inserted_at: Instant,
    last_used: Instant,
    services: Vec<ServiceWithDistance>,
}

/// Clones share the same entries.
#[derive(Debug, Clone)]
pub struct QueryCache {
    capacity: usize,
    ttl: Duration,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl QueryCache {
    /// A `capacity` of zero disables caching.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns a copy of the cached result, dropping it first if expired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<ServiceWithDistance>> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Vec<ServiceWithDistance>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = entries
            .get(key)
            .is_some_and(|e| now.duration_since(e.inserted_at) >= self.ttl);
        if expired {
            entries.remove(key);
            return None;
        }
        let entry = entries.get_mut(key)?;
        entry.last_used = now;
        Some(entry.services.clone())
    }

    pub fn insert(&self, key: impl Into<String>, services: Vec<ServiceWithDistance>) {
        self.insert_at(key.into(), services, Instant::now());
    }

    fn insert_at(&self, key: String, services: Vec<ServiceWithDistance>, now: Instant) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, e| now.duration_since(e.inserted_at) < self.ttl);
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(key = %oldest, "evicting least recently used query result");
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            Entry {
                inserted_at: now,
                last_used: now,
                services,
            },
        );
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
