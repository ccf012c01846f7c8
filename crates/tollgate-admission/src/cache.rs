//! The bounded, expiring replay guard.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Remembers recently seen access tokens, bounded in size and time.
///
/// The lookup and the insert happen together under one lock
/// ([`ReplayCache::insert_if_absent`]), so a token admits at most one
/// request no matter how many carriers race it. Entries are never touched
/// after insertion — a hit means a replay and the request dies — so
/// insertion order is also the recency order used for eviction.
pub struct ReplayCache {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    seen: HashMap<String, Instant>,
    order: VecDeque<String>,
}

impl ReplayCache {
    /// An empty cache holding at most `capacity` tokens for at most `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            inner: Mutex::new(CacheInner {
                seen: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Record the token unless it is already present.
    ///
    /// Returns true when this call inserted the token (first sighting) and
    /// false when the token was already there (a replay).
    pub fn insert_if_absent(&self, token: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.expire(now, self.ttl);
        if inner.seen.contains_key(token) {
            return false;
        }
        if inner.seen.len() >= self.capacity {
            inner.evict_oldest();
        }
        inner.seen.insert(token.to_string(), now);
        inner.order.push_back(token.to_string());
        true
    }

    /// Whether the token is currently remembered.
    pub fn contains(&self, token: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.expire(now, self.ttl);
        inner.seen.contains_key(token)
    }

    /// How many tokens are currently remembered.
    pub fn len(&self) -> usize {
        self.lock().seen.len()
    }

    /// Whether the cache remembers nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // A poisoned lock only means another request died mid-insert; the
        // map itself stays consistent, so keep serving.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheInner {
    /// Drop expired entries from the front; timestamps are monotone along
    /// the deque, so the first fresh entry ends the scan.
    fn expire(&mut self, now: Instant, ttl: Duration) {
        while let Some(front) = self.order.front() {
            let expired = self
                .seen
                .get(front)
                .is_some_and(|&seen_at| now.duration_since(seen_at) > ttl);
            if !expired {
                break;
            }
            if let Some(key) = self.order.pop_front() {
                self.seen.remove(&key);
            }
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(key) = self.order.pop_front() {
            self.seen.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LONG_TTL: Duration = Duration::from_secs(3600);

    #[test]
    fn test_first_insert_wins_second_loses() {
        let cache = ReplayCache::new(16, LONG_TTL);
        assert!(cache.insert_if_absent("token-a"));
        assert!(!cache.insert_if_absent("token-a"));
        assert!(cache.insert_if_absent("token-b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = ReplayCache::new(2, LONG_TTL);
        assert!(cache.insert_if_absent("first"));
        assert!(cache.insert_if_absent("second"));
        assert!(cache.insert_if_absent("third"));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("first"));
        assert!(cache.contains("second"));
        assert!(cache.contains("third"));
    }

    #[test]
    fn test_entries_expire() {
        let cache = ReplayCache::new(16, Duration::from_millis(30));
        assert!(cache.insert_if_absent("ephemeral"));
        assert!(cache.contains("ephemeral"));
        std::thread::sleep(Duration::from_millis(60));
        assert!(!cache.contains("ephemeral"));
        // And the slot can be taken again after expiry.
        assert!(cache.insert_if_absent("ephemeral"));
    }

    #[test]
    fn test_concurrent_inserts_admit_once() {
        let cache = ReplayCache::new(64, LONG_TTL);
        let wins = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    if cache.insert_if_absent("contested") {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });
        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }
}
