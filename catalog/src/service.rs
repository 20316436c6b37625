use crate::cache::CatalogCache;
use crate::config::Config;
use crate::counter;
use crate::errors::Result;
use crate::fetcher::CatalogFetcher;
use crate::matcher::Matcher;
use crate::metrics_defs::INVENTORY_LOOKUP_FAILED;
use crate::shopify::ShopifyRestClient;
use crate::source::{CatalogSource, InventoryLookup};
use crate::types::{Catalog, MatchReport, MatchResult, QueryRecord, VariantId};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Fetch-then-match pipeline exposed to the transport layer.
pub struct CatalogService {
    fetcher: CatalogFetcher,
    matcher: Matcher,
    inventory: Option<Arc<dyn InventoryLookup>>,
    cache: Option<CatalogCache>,
    // Held while a cache miss is being filled, so concurrent misses share one fetch
    refill: Mutex<()>,
}

impl CatalogService {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        inventory: Option<Arc<dyn InventoryLookup>>,
        config: &Config,
    ) -> Self {
        CatalogService {
            fetcher: CatalogFetcher::new(source, config.fetch.clone()),
            matcher: Matcher::new(&config.matching),
            inventory,
            cache: CatalogCache::from_config(&config.cache),
            refill: Mutex::new(()),
        }
    }

    /// Builds the service against the Shopify store described by `config`.
    pub fn from_config(config: &Config, access_token: String) -> Result<Self> {
        let client = Arc::new(ShopifyRestClient::new(&config.source, access_token)?);
        let inventory: Option<Arc<dyn InventoryLookup>> = if config.source.live_inventory {
            Some(client.clone())
        } else {
            None
        };

        Ok(CatalogService::new(client, inventory, config))
    }

    fn cache_key(&self) -> String {
        self.fetcher.source().origin()
    }

    /// Always goes to the remote. A complete result refreshes the cache.
    pub async fn fetch_full_catalog(&self, page_cap: Option<usize>) -> Result<Arc<Catalog>> {
        let catalog = Arc::new(self.fetcher.fetch_full_catalog(page_cap).await?);

        if let Some(cache) = &self.cache {
            cache.insert(&self.cache_key(), catalog.clone());
        }

        Ok(catalog)
    }

    pub async fn match_availability(&self, queries: &[QueryRecord]) -> Result<MatchReport> {
        let catalog = self.cached_or_fetch().await?;
        let mut results = self.matcher.match_all(&catalog.entries, queries);

        if let Some(inventory) = &self.inventory {
            refresh_availability(inventory.as_ref(), &mut results).await;
        }

        Ok(MatchReport {
            results,
            completeness: catalog.completeness.clone(),
        })
    }

    async fn cached_or_fetch(&self) -> Result<Arc<Catalog>> {
        let Some(cache) = &self.cache else {
            return self.fetch_full_catalog(None).await;
        };
        let key = self.cache_key();

        if let Some(catalog) = cache.get(&key) {
            tracing::debug!(entries = catalog.entries.len(), "Using cached catalog");
            return Ok(catalog);
        }

        let _refill = self.refill.lock().await;
        // Another caller may have filled the cache while we waited
        if let Some(catalog) = cache.peek(&key) {
            tracing::debug!(entries = catalog.entries.len(), "Using catalog fetched by a concurrent request");
            return Ok(catalog);
        }

        self.fetch_full_catalog(None).await
    }

    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&self.cache_key());
        }
    }
}

/// Replaces the last known quantities of matched variants with live ones
/// and recomputes the totals. Keeps the last known quantities if the lookup
/// fails.
async fn refresh_availability(inventory: &dyn InventoryLookup, results: &mut [MatchResult]) {
    let variant_ids: BTreeSet<VariantId> = results
        .iter()
        .filter_map(|r| r.matched.as_ref())
        .flat_map(|entry| entry.variants.iter().map(|v| v.id))
        .collect();

    if variant_ids.is_empty() {
        return;
    }

    let levels = match inventory.fetch_availability(&variant_ids).await {
        Ok(levels) => levels,
        Err(err) => {
            counter!(INVENTORY_LOOKUP_FAILED).increment(1);
            tracing::warn!(error = %err, "Live inventory lookup failed, using last known quantities");
            return;
        }
    };

    for result in results.iter_mut() {
        if let Some(entry) = result.matched.as_mut() {
            for variant in entry.variants.iter_mut() {
                if let Some(available) = levels.get(&variant.id) {
                    variant.available = *available;
                }
            }
            result.total_available = entry.total_available();
        }
    }
}
