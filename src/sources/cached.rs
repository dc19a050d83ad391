use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::config::CacheConfig;
use crate::error::PlayerError;
use crate::models::SearchEngine;
use crate::sources::MusicApi;

/// 용량(LRU)과 유효 시간(TTL)으로 제한되는 작은 캐시.
pub struct TtlLru<K, V> {
    entries: HashMap<K, Entry<V>>,
    capacity: usize,
    ttl: Duration,
    tick: u64,
}

struct Entry<V> {
    value: V,
    inserted: Instant,
    last_used: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlLru<K, V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            ttl,
            tick: 0,
        }
    }

    pub fn get(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => now.saturating_duration_since(entry.inserted) >= self.ttl,
            None => return None,
        };

        if expired {
            self.entries.remove(key);
            return None;
        }

        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            entry.value.clone()
        })
    }

    pub fn insert(&mut self, key: K, value: V, now: Instant) {
        if self.capacity == 0 {
            return;
        }

        if !self.entries.contains_key(&key) {
            self.evict_expired(now);
            while self.entries.len() >= self.capacity {
                self.evict_least_recent();
            }
        }

        self.tick += 1;
        self.entries.insert(
            key,
            Entry {
                value,
                inserted: now,
                last_used: self.tick,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn evict_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted) < ttl);
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            log::trace!("검색 캐시에서 가장 오래된 항목을 제거합니다");
            self.entries.remove(&key);
        }
    }
}

type SearchKey = (String, SearchEngine);

/// 검색 요청만 메모이즈하는 래퍼. `fetch`는 항상 원격으로 전달한다.
/// 실패한 요청은 저장하지 않는다.
pub struct CachedApi<A> {
    inner: A,
    searches: Mutex<TtlLru<SearchKey, Value>>,
}

impl<A: MusicApi> CachedApi<A> {
    pub fn new(inner: A, config: &CacheConfig) -> Self {
        Self {
            inner,
            searches: Mutex::new(TtlLru::new(config.capacity, config.ttl())),
        }
    }

    pub fn cached_searches(&self) -> usize {
        self.searches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl<A: MusicApi> MusicApi for CachedApi<A> {
    fn search(&self, query: &str, engine: SearchEngine) -> Result<Value, PlayerError> {
        let key = (query.trim().to_string(), engine);

        // 네트워크 호출 중에는 잠금을 잡지 않는다.
        let hit = self
            .searches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key, Instant::now());
        if let Some(body) = hit {
            log::debug!("검색 캐시 적중: {:?} @ {}", key.0, engine);
            return Ok(body);
        }

        let body = self.inner.search(&key.0, engine)?;
        self.searches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, body.clone(), Instant::now());
        Ok(body)
    }

    fn fetch(&self, id: &str) -> Result<Value, PlayerError> {
        self.inner.fetch(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingApi {
        searches: AtomicUsize,
        fetches: AtomicUsize,
        fail: bool,
    }

    impl MusicApi for CountingApi {
        fn search(&self, query: &str, engine: SearchEngine) -> Result<Value, PlayerError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PlayerError::Network("timed out".to_string()));
            }
            Ok(json!({ "status": 200, "response": [{ "id": format!("{query}-{engine}") }] }))
        }

        fn fetch(&self, _id: &str) -> Result<Value, PlayerError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "status": 200, "response": "http://x/a.mp3" }))
        }
    }

    fn cache_config() -> CacheConfig {
        CacheConfig {
            capacity: 8,
            ttl_secs: 600,
        }
    }

    #[test]
    fn test_identical_search_is_memoized() {
        let api = CachedApi::new(CountingApi::default(), &cache_config());

        let first = api.search("Arijit Singh", SearchEngine::Gaama).unwrap();
        let second = api.search("  Arijit Singh ", SearchEngine::Gaama).unwrap();

        assert_eq!(first, second);
        assert_eq!(api.inner.searches.load(Ordering::SeqCst), 1);
        assert_eq!(api.cached_searches(), 1);
    }

    #[test]
    fn test_different_engine_or_query_misses() {
        let api = CachedApi::new(CountingApi::default(), &cache_config());

        api.search("Arijit Singh", SearchEngine::Gaama).unwrap();
        api.search("Arijit Singh", SearchEngine::Wunk).unwrap();
        api.search("Shreya Ghoshal", SearchEngine::Gaama).unwrap();

        assert_eq!(api.inner.searches.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_errors_are_not_memoized() {
        let inner = CountingApi {
            fail: true,
            ..Default::default()
        };
        let api = CachedApi::new(inner, &cache_config());

        assert!(api.search("q", SearchEngine::Gaama).is_err());
        assert!(api.search("q", SearchEngine::Gaama).is_err());

        assert_eq!(api.inner.searches.load(Ordering::SeqCst), 2);
        assert_eq!(api.cached_searches(), 0);
    }

    #[test]
    fn test_fetch_is_never_cached() {
        let api = CachedApi::new(CountingApi::default(), &cache_config());

        api.fetch("abc").unwrap();
        api.fetch("abc").unwrap();

        assert_eq!(api.inner.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ttl_expiry() {
        let mut cache = TtlLru::new(4, Duration::from_secs(10));
        let start = Instant::now();

        cache.insert("a", 1, start);
        assert_eq!(cache.get(&"a", start + Duration::from_secs(9)), Some(1));
        assert_eq!(cache.get(&"a", start + Duration::from_secs(10)), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_lru_eviction_keeps_recently_used() {
        let mut cache = TtlLru::new(2, Duration::from_secs(60));
        let now = Instant::now();

        cache.insert("a", 1, now);
        cache.insert("b", 2, now);
        // "a"를 사용해서 "b"가 가장 오래된 항목이 된다.
        assert_eq!(cache.get(&"a", now), Some(1));
        cache.insert("c", 3, now);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a", now), Some(1));
        assert_eq!(cache.get(&"b", now), None);
        assert_eq!(cache.get(&"c", now), Some(3));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = TtlLru::new(0, Duration::from_secs(60));
        let now = Instant::now();
        cache.insert("a", 1, now);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get(&"a", now), None);
    }
}
