use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A process-local TTL cache for repeated read queries. Writers must call
/// `invalidate` for the keys their writes affect.
#[derive(Debug)]
pub struct QueryCache<K, V> {
    entries: DashMap<K, (Instant, V)>,
    ttl: Duration,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let hit = self.entries.get(key).and_then(|entry| {
            let (stored_at, value) = entry.value();
            (stored_at.elapsed() < self.ttl).then(|| value.clone())
        });

        if hit.is_none() {
            self.entries.remove_if(key, |_, (stored_at, _)| stored_at.elapsed() >= self.ttl);
        }
        hit
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }
}
