use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Largest page the remote REST API will hand out.
pub const MAX_PAGE_SIZE: usize = 250;

/// Upper bound for a single tier weight, so the name and SKU stages can be
/// summed without overflowing.
pub const MAX_WEIGHT: u32 = u32::MAX / 2;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("page_size must be between 1 and {MAX_PAGE_SIZE}, got {0}")]
    InvalidPageSize(usize),

    #[error("page_cap cannot be 0")]
    InvalidPageCap,

    #[error("min_score cannot be 0")]
    InvalidMinScore,

    #[error("{0} weights must be strictly decreasing")]
    TierOrder(&'static str),

    #[error("weight {0} exceeds the maximum of {MAX_WEIGHT}")]
    WeightTooLarge(u32),

    #[error("empty brand prefix")]
    EmptyBrandPrefix,
}

/// How the remote exposes pagination.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Request entries with an id greater than the last one seen.
    #[default]
    SinceId,
    /// Follow the opaque cursor handed back by the remote.
    Cursor,
}

/// What to do when the fetch loop stops before the catalog is exhausted.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartialPolicy {
    #[default]
    Fail,
    Accept,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Store URL, e.g. https://example.myshopify.com
    pub url: Url,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Name of the environment variable holding the access token.
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
    #[serde(default)]
    pub pagination: PaginationMode,
    /// Refresh variant availability with a live inventory lookup after matching.
    #[serde(default)]
    pub live_inventory: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_version() -> String {
    "2024-01".into()
}

fn default_access_token_env() -> String {
    "CATALOG_ACCESS_TOKEN".into()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Pause after this many pages. 0 disables throttling.
    pub every_pages: usize,
    pub delay_ms: u64,
}

impl ThrottleConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        ThrottleConfig {
            every_pages: 10,
            delay_ms: 1000,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub page_size: usize,
    pub page_cap: Option<usize>,
    pub throttle: ThrottleConfig,
    pub partial_policy: PartialPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            page_size: MAX_PAGE_SIZE,
            page_cap: None,
            throttle: ThrottleConfig::default(),
            partial_policy: PartialPolicy::default(),
        }
    }
}

impl FetchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidPageSize(self.page_size));
        }
        if self.page_cap == Some(0) {
            return Err(ValidationError::InvalidPageCap);
        }
        Ok(())
    }
}

/// Points awarded by each scoring tier.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Weights {
    pub exact_title: u32,
    pub core_name: u32,
    pub partial_title: u32,
    pub exact_sku: u32,
    pub normalized_sku: u32,
    pub sku_prefix: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            exact_title: 100,
            core_name: 70,
            partial_title: 40,
            exact_sku: 100,
            normalized_sku: 80,
            sku_prefix: 50,
        }
    }
}

impl Weights {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.exact_title > self.core_name && self.core_name > self.partial_title) {
            return Err(ValidationError::TierOrder("name"));
        }
        if !(self.exact_sku > self.normalized_sku && self.normalized_sku > self.sku_prefix) {
            return Err(ValidationError::TierOrder("sku"));
        }
        // Tiers are ordered, so the top tier of each stage bounds the rest
        for top in [self.exact_title, self.exact_sku] {
            if top > MAX_WEIGHT {
                return Err(ValidationError::WeightTooLarge(top));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchConfig {
    /// Best candidates scoring below this are reported as unmatched.
    pub min_score: u32,
    /// Brand prefixes stripped when extracting the core name.
    pub brand_prefixes: Vec<String>,
    pub weights: Weights,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            min_score: 40,
            brand_prefixes: vec!["LOFT".into()],
            weights: Weights::default(),
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_score == 0 {
            return Err(ValidationError::InvalidMinScore);
        }
        if self.brand_prefixes.iter().any(|b| b.trim().is_empty()) {
            return Err(ValidationError::EmptyBrandPrefix);
        }
        self.weights.validate()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// 0 disables catalog caching.
    pub ttl_secs: u64,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: 300,
            max_entries: 16,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub matching: MatchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.fetch.validate()?;
        self.matching.validate()
    }
}
