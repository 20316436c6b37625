use crate::config::PaginationMode;
use crate::errors::{CatalogError, Result};
use crate::source::{CatalogSource, InventoryLookup, Page, PagePosition};
use crate::types::{CatalogEntry, Variant, VariantId};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn make_catalog(count: u64) -> Vec<CatalogEntry> {
    (1..=count)
        .map(|id| {
            CatalogEntry::new(
                id,
                format!("Product {id}"),
                vec![Variant::new(id * 10, Some(&format!("SKU-{id}")), 1)],
            )
        })
        .collect()
}

/// In-memory catalog source that records every page request.
pub struct StaticSource {
    entries: Vec<CatalogEntry>,
    pagination: PaginationMode,
    claimed_total: Option<usize>,
    // (request number starting at 1, error to return)
    failure: Option<(usize, CatalogError)>,
    ignore_position: bool,
    latency: Option<Duration>,
    requests: AtomicUsize,
    positions: Mutex<Vec<PagePosition>>,
}

impl StaticSource {
    pub fn new(entries: Vec<CatalogEntry>, pagination: PaginationMode) -> Self {
        let total = entries.len();
        StaticSource {
            entries,
            pagination,
            claimed_total: Some(total),
            failure: None,
            ignore_position: false,
            latency: None,
            requests: AtomicUsize::new(0),
            positions: Mutex::new(Vec::new()),
        }
    }

    pub fn without_total(mut self) -> Self {
        self.claimed_total = None;
        self
    }

    pub fn with_claimed_total(mut self, total: usize) -> Self {
        self.claimed_total = Some(total);
        self
    }

    pub fn failing_at(mut self, request: usize, error: CatalogError) -> Self {
        self.failure = Some((request, error));
        self
    }

    /// Every request is answered as if it asked for the first page.
    pub fn ignoring_position(mut self) -> Self {
        self.ignore_position = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn positions(&self) -> Vec<PagePosition> {
        self.positions.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    fn origin(&self) -> String {
        "static".into()
    }

    fn pagination(&self) -> PaginationMode {
        self.pagination
    }

    async fn fetch_page(&self, position: &PagePosition, page_size: usize) -> Result<Page> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        self.positions.lock().unwrap().push(position.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some((at, error)) = &self.failure
            && *at == request
        {
            return Err(error.clone());
        }

        let offset = match position {
            _ if self.ignore_position => 0,
            PagePosition::First => 0,
            PagePosition::After(id) => self.entries.iter().take_while(|e| e.id <= *id).count(),
            PagePosition::Cursor(c) => c.parse().unwrap(),
        };
        let entries: Vec<CatalogEntry> = self.entries.iter().skip(offset).take(page_size).cloned().collect();
        let end = offset + entries.len();

        let next_cursor = match self.pagination {
            PaginationMode::Cursor if end < self.entries.len() => Some(end.to_string()),
            _ => None,
        };
        let total_count = match position {
            PagePosition::First => self.claimed_total,
            _ => None,
        };

        Ok(Page {
            entries,
            next_cursor,
            total_count,
        })
    }
}

/// Inventory lookup answering from a fixed table.
pub struct StaticInventory {
    levels: HashMap<VariantId, i64>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl StaticInventory {
    pub fn new(levels: HashMap<VariantId, i64>) -> Self {
        StaticInventory {
            levels,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        StaticInventory {
            levels: HashMap::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl InventoryLookup for StaticInventory {
    async fn fetch_availability(
        &self,
        variant_ids: &BTreeSet<VariantId>,
    ) -> Result<HashMap<VariantId, i64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CatalogError::RemoteUnavailable {
                status: Some(503),
                message: "inventory down".into(),
            });
        }

        Ok(variant_ids
            .iter()
            .filter_map(|id| self.levels.get(id).map(|qty| (*id, *qty)))
            .collect())
    }
}
