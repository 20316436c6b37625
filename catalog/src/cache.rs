// Time bounded cache of complete catalogs, so consecutive match requests
// against the same store do not refetch every page.
use crate::config::CacheConfig;
use crate::counter;
use crate::metrics_defs::{CACHE_HIT, CACHE_MISS};
use crate::types::Catalog;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<String, Arc<Catalog>>,
}

impl CatalogCache {
    /// Returns `None` when caching is disabled.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        (config.ttl_secs > 0).then(|| CatalogCache::new(Duration::from_secs(config.ttl_secs), config.max_entries))
    }

    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        CatalogCache { cache }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Catalog>> {
        let cached = self.cache.get(key);
        let metric_def = if cached.is_some() { CACHE_HIT } else { CACHE_MISS };
        counter!(metric_def).increment(1);
        cached
    }

    /// Looks up without recording a hit or miss.
    pub fn peek(&self, key: &str) -> Option<Arc<Catalog>> {
        self.cache.get(key)
    }

    /// Partial catalogs are never stored.
    pub fn insert(&self, key: &str, catalog: Arc<Catalog>) -> bool {
        if !catalog.completeness.is_complete() {
            return false;
        }
        self.cache.insert(key.to_string(), catalog);
        true
    }

    pub fn invalidate(&self, key: &str) {
        self.cache.invalidate(key);
    }
}
