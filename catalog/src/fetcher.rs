use crate::config::{FetchConfig, PaginationMode, PartialPolicy};
use crate::errors::{CatalogError, Result};
use crate::metrics_defs::{FETCH_DURATION, FETCH_ENTRIES, FETCH_PAGES};
use crate::source::{CatalogSource, PagePosition};
use crate::types::{Catalog, CatalogEntry, Completeness, PartialReason};
use crate::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;

/// Pulls the complete remote catalog into memory, one page at a time.
pub struct CatalogFetcher {
    source: Arc<dyn CatalogSource>,
    config: FetchConfig,
}

impl CatalogFetcher {
    pub fn new(source: Arc<dyn CatalogSource>, config: FetchConfig) -> Self {
        CatalogFetcher { source, config }
    }

    pub fn source(&self) -> &Arc<dyn CatalogSource> {
        &self.source
    }

    /// Requests pages until the remote is exhausted or `page_cap` pages have
    /// been fetched. `page_cap` overrides the configured cap.
    ///
    /// The loop stops on an empty page, once the total count reported with
    /// the first page has been reached, or when cursor pagination hands back
    /// no next cursor. A page whose next position does not move forward ends
    /// the fetch as partial. Every `throttle.every_pages` pages it sleeps for
    /// `throttle.delay_ms` before asking for more.
    ///
    /// A failure on the first page, and any authentication failure, is
    /// returned as is. Stopping early after some entries were accumulated
    /// yields a partial catalog, handled according to the partial policy.
    pub async fn fetch_full_catalog(&self, page_cap: Option<usize>) -> Result<Catalog> {
        let started = Instant::now();
        let page_cap = page_cap.or(self.config.page_cap);
        let page_size = self.config.page_size;
        let throttle = &self.config.throttle;
        let pagination = self.source.pagination();

        let mut entries: Vec<CatalogEntry> = Vec::new();
        let mut position = PagePosition::First;
        let mut total_count: Option<usize> = None;
        let mut pages = 0;

        let completeness = loop {
            if let Some(cap) = page_cap
                && pages >= cap
            {
                break Completeness::Partial(PartialReason::PageCap { pages });
            }

            if pages > 0 && throttle.every_pages > 0 && pages % throttle.every_pages == 0 {
                tracing::debug!(pages, delay_ms = throttle.delay_ms, "Throttling catalog fetch");
                sleep(throttle.delay()).await;
            }

            let page = match self.source.fetch_page(&position, page_size).await {
                Ok(page) => page,
                Err(CatalogError::AuthenticationFailed) => {
                    return Err(CatalogError::AuthenticationFailed);
                }
                Err(err) if pages == 0 => return Err(err),
                Err(err) => {
                    tracing::error!(page = pages + 1, error = %err, "Catalog page request failed");
                    break Completeness::Partial(PartialReason::PageFailed {
                        page: pages + 1,
                        error: err.to_string(),
                    });
                }
            };

            pages += 1;
            counter!(FETCH_PAGES).increment(1);
            tracing::debug!(page = pages, entries = page.entries.len(), "Fetched catalog page");

            if total_count.is_none() {
                total_count = page.total_count;
            }

            if page.entries.is_empty() {
                break Completeness::Complete;
            }

            let next = match pagination {
                PaginationMode::SinceId => page
                    .entries
                    .iter()
                    .map(|e| e.id)
                    .max()
                    .map(PagePosition::After),
                PaginationMode::Cursor => page.next_cursor.map(PagePosition::Cursor),
            };

            if let Some(next) = &next
                && !advances(&position, next)
            {
                tracing::error!(page = pages, ?position, ?next, "Catalog pagination did not advance");
                break Completeness::Partial(PartialReason::StalledCursor { page: pages });
            }

            entries.extend(page.entries);

            if let Some(total) = total_count
                && entries.len() >= total
            {
                break Completeness::Complete;
            }

            match next {
                Some(next) => position = next,
                None => break Completeness::Complete,
            }
        };

        let outcome = if completeness.is_complete() { "complete" } else { "partial" };
        histogram!(FETCH_DURATION, "outcome" => outcome).record(started.elapsed().as_secs_f64());
        histogram!(FETCH_ENTRIES).record(entries.len() as f64);

        match completeness {
            Completeness::Partial(reason) if self.config.partial_policy == PartialPolicy::Fail => {
                Err(CatalogError::PartialCatalog { entries, reason })
            }
            completeness => {
                if let Completeness::Partial(reason) = &completeness {
                    tracing::warn!(
                        entries = entries.len(),
                        %reason,
                        "Returning partial catalog"
                    );
                } else {
                    tracing::info!(entries = entries.len(), pages, "Fetched full catalog");
                }

                Ok(Catalog {
                    entries,
                    completeness,
                    pages,
                })
            }
        }
    }
}

/// A remote that ignores `since_id` or repeats a cursor would otherwise be
/// fetched forever.
fn advances(current: &PagePosition, next: &PagePosition) -> bool {
    match (current, next) {
        (PagePosition::After(current), PagePosition::After(next)) => next > current,
        (PagePosition::Cursor(current), PagePosition::Cursor(next)) => next != current,
        _ => true,
    }
}
