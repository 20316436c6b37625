use crate::config::PaginationMode;
use crate::errors::Result;
use crate::types::{CatalogEntry, ProductId, VariantId};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};

/// Where the next page request should start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PagePosition {
    First,
    /// Entries with an id strictly greater than this one.
    After(ProductId),
    Cursor(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub entries: Vec<CatalogEntry>,
    pub next_cursor: Option<String>,
    /// Total size of the remote catalog, when the remote reports it.
    pub total_count: Option<usize>,
}

/// A remote catalog that can be read one page at a time.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Identifies the remote, used as the cache key.
    fn origin(&self) -> String;

    fn pagination(&self) -> PaginationMode;

    async fn fetch_page(&self, position: &PagePosition, page_size: usize) -> Result<Page>;
}

/// Live stock levels for variants.
#[async_trait]
pub trait InventoryLookup: Send + Sync {
    async fn fetch_availability(
        &self,
        variant_ids: &BTreeSet<VariantId>,
    ) -> Result<HashMap<VariantId, i64>>;
}
