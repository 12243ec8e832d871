use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }

    pub fn data(&self) -> &T {
        &self.data
    }
}

/// Concurrent TTL cache. Lazy-init races are benign: two racing fetchers may
/// both insert, the second insert wins, and readers only ever observe a
/// fully-constructed value.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    cache: Arc<DashMap<K, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            default_ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.cache.get(key).and_then(|entry| {
            if entry.is_expired() {
                None
            } else {
                Some(entry.data().clone())
            }
        })
    }

    pub fn insert(&self, key: K, value: V) {
        self.cache
            .insert(key, CacheEntry::new(value, self.default_ttl));
    }

    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.cache.insert(key, CacheEntry::new(value, ttl));
    }

    pub fn invalidate(&self, key: &K) {
        self.cache.remove(key);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Signing-key sets keyed by normalized authority. Provider keys rotate
/// rarely; a key-id miss invalidates the entry regardless of TTL.
pub type KeySetCache = TtlCache<String, Arc<jsonwebtoken::jwk::JwkSet>>;

impl Default for KeySetCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(24 * 60 * 60))
    }
}
