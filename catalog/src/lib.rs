//! Fetches a remote product catalog and reconciles loosely specified
//! name/SKU records against it.

pub mod cache;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod matcher;
pub mod metrics_defs;
pub mod normalize;
pub mod rules;
pub mod service;
pub mod shopify;
pub mod source;
pub mod types;

#[cfg(test)]
mod testutils;

pub use errors::{CatalogError, Result};
pub use fetcher::CatalogFetcher;
pub use matcher::Matcher;
pub use service::CatalogService;
