//! Short-lived keyed store for finished results.
//!
//! A web layer hands the [`ResultId`] from [`ResultStore::insert`] back to
//! the client, which later downloads its own result with it. Entries expire
//! after a time-to-live and the oldest are evicted once the store is full.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default number of results kept.
pub const DEFAULT_CAPACITY: usize = 64;
/// Default lifetime of a stored result.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Handle for one stored result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultId(u64);

impl std::fmt::Display for ResultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

struct Entry {
    bytes: Arc<Vec<u8>>,
    created: Instant,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    entries: HashMap<ResultId, Entry>,
    order: VecDeque<ResultId>,
}

/// Thread-safe store of encoded results, bounded in size and age.
pub struct ResultStore {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl ResultStore {
    /// Create a store holding at most `capacity` results (minimum 1) for `ttl`.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Store a result and return its handle.
    pub fn insert(&self, bytes: Vec<u8>) -> ResultId {
        let mut inner = self.inner.lock();
        self.purge_expired(&mut inner);
        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            tracing::debug!(id = %oldest, "evicted result");
        }

        let id = ResultId(inner.next_id);
        inner.next_id += 1;
        inner.entries.insert(
            id,
            Entry {
                bytes: Arc::new(bytes),
                created: Instant::now(),
            },
        );
        inner.order.push_back(id);
        id
    }

    /// Fetch a result without removing it.
    #[must_use]
    pub fn get(&self, id: ResultId) -> Option<Arc<Vec<u8>>> {
        let mut inner = self.inner.lock();
        self.purge_expired(&mut inner);
        inner.entries.get(&id).map(|e| Arc::clone(&e.bytes))
    }

    /// Remove and return a result.
    pub fn take(&self, id: ResultId) -> Option<Arc<Vec<u8>>> {
        let mut inner = self.inner.lock();
        self.purge_expired(&mut inner);
        let entry = inner.entries.remove(&id)?;
        inner.order.retain(|k| *k != id);
        Some(entry.bytes)
    }

    /// Number of live results.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock();
        self.purge_expired(&mut inner);
        inner.entries.len()
    }

    /// Whether the store holds no live results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self, inner: &mut Inner) {
        while let Some(&oldest) = inner.order.front() {
            let expired = inner
                .entries
                .get(&oldest)
                .is_none_or(|e| e.created.elapsed() >= self.ttl);
            if !expired {
                break;
            }
            inner.order.pop_front();
            inner.entries.remove(&oldest);
        }
    }
}
