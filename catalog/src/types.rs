use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub type ProductId = u64;
pub type VariantId = u64;

/// One purchasable unit of a catalog entry, e.g. a size/colour combination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub sku: Option<String>,
    pub price: String,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub inventory_quantity: i64,
    // Last known inventory until a live lookup replaces it.
    pub available: i64,
}

impl Variant {
    pub fn new(id: VariantId, sku: Option<&str>, inventory_quantity: i64) -> Self {
        Variant {
            id,
            sku: sku.map(String::from),
            price: "0.00".into(),
            option_a: None,
            option_b: None,
            inventory_quantity,
            available: inventory_quantity,
        }
    }
}

/// A product record as fetched from the remote catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: ProductId,
    pub title: String,
    pub vendor: String,
    pub tags: BTreeSet<String>,
    pub variants: Vec<Variant>,
}

impl CatalogEntry {
    pub fn new<T: Into<String>>(id: ProductId, title: T, variants: Vec<Variant>) -> Self {
        CatalogEntry {
            id,
            title: title.into(),
            vendor: String::new(),
            tags: BTreeSet::new(),
            variants,
        }
    }

    pub fn total_available(&self) -> i64 {
        self.variants.iter().map(|v| v.available).sum()
    }
}

/// A caller supplied record to reconcile against the catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

impl QueryRecord {
    pub fn new(name: Option<&str>, sku: Option<&str>) -> Self {
        QueryRecord {
            name: name.map(String::from),
            sku: sku.map(String::from),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub query: QueryRecord,
    pub matched: Option<CatalogEntry>,
    pub match_score: u32,
    pub match_reasons: Vec<String>,
    pub total_available: i64,
}

impl MatchResult {
    pub fn unmatched(query: QueryRecord) -> Self {
        MatchResult {
            query,
            matched: None,
            match_score: 0,
            match_reasons: Vec::new(),
            total_available: 0,
        }
    }
}

/// Why a fetch stopped before the remote catalog was exhausted.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PartialReason {
    PageCap { pages: usize },
    PageFailed { page: usize, error: String },
    /// The remote handed back a position that does not move past the current one.
    StalledCursor { page: usize },
}

impl fmt::Display for PartialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialReason::PageCap { pages } => write!(f, "page cap of {pages} reached"),
            PartialReason::PageFailed { page, error } => {
                write!(f, "page {page} failed: {error}")
            }
            PartialReason::StalledCursor { page } => {
                write!(f, "page {page} did not advance past the previous position")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    Partial(PartialReason),
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completeness::Complete)
    }
}

/// The materialized result of one full fetch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    pub completeness: Completeness,
    pub pages: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchReport {
    pub results: Vec<MatchResult>,
    pub completeness: Completeness,
}
