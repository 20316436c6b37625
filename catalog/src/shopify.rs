//! Catalog source backed by the Shopify Admin API.
//!
//! Products are read from the REST `products.json` endpoint, paginated either
//! with `since_id` or with the `page_info` cursor found in the `Link` header.
//! Live variant inventory is read through the GraphQL `nodes` query.
//!
//! Response shapes are loose (nullable fields, tags as one comma separated
//! string), so they are deserialized into raw structs here and converted into
//! [`CatalogEntry`] / [`Variant`] with defaults applied exactly once.

use crate::config::{PaginationMode, SourceConfig};
use crate::errors::{CatalogError, Result};
use crate::source::{CatalogSource, InventoryLookup, Page, PagePosition};
use crate::types::{CatalogEntry, Variant, VariantId};
use async_trait::async_trait;
use reqwest::header::LINK;
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

// The GraphQL nodes query accepts up to 250 ids, stay well below it.
const INVENTORY_BATCH_SIZE: usize = 100;

const VARIANT_INVENTORY_QUERY: &str = "query VariantInventory($ids: [ID!]!) { \
    nodes(ids: $ids) { ... on ProductVariant { id inventoryQuantity } } }";

#[derive(Deserialize)]
struct ProductsResponse {
    products: Vec<RawProduct>,
}

#[derive(Deserialize)]
struct CountResponse {
    count: usize,
}

#[derive(Deserialize)]
struct RawProduct {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    vendor: Option<String>,
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    variants: Vec<RawVariant>,
}

#[derive(Deserialize)]
struct RawVariant {
    id: u64,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    option1: Option<String>,
    #[serde(default)]
    option2: Option<String>,
    #[serde(default)]
    inventory_quantity: Option<i64>,
}

impl From<RawVariant> for Variant {
    fn from(raw: RawVariant) -> Self {
        let inventory_quantity = raw.inventory_quantity.unwrap_or(0);
        Variant {
            id: raw.id,
            sku: raw.sku.filter(|s| !s.trim().is_empty()),
            price: raw.price.unwrap_or_else(|| "0.00".into()),
            option_a: raw.option1,
            option_b: raw.option2,
            inventory_quantity,
            available: inventory_quantity,
        }
    }
}

impl From<RawProduct> for CatalogEntry {
    fn from(raw: RawProduct) -> Self {
        let tags = raw
            .tags
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        CatalogEntry {
            id: raw.id,
            title: raw.title.unwrap_or_default(),
            vendor: raw.vendor.unwrap_or_default(),
            tags,
            variants: raw.variants.into_iter().map(Variant::from).collect(),
        }
    }
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<NodesData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct NodesData {
    nodes: Vec<Option<VariantNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantNode {
    id: Option<String>,
    inventory_quantity: Option<i64>,
}

/// Extracts the `page_info` cursor of the `rel="next"` link, if any.
pub fn next_page_info(link_header: &str) -> Option<String> {
    link_header
        .split(',')
        .find(|part| part.contains(r#"rel="next""#))
        .and_then(|part| {
            let start = part.find('<')? + 1;
            let end = part.find('>')?;
            Url::parse(part.get(start..end)?).ok()
        })
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "page_info")
                .map(|(_, value)| value.into_owned())
        })
}

fn variant_gid(id: VariantId) -> String {
    format!("gid://shopify/ProductVariant/{id}")
}

fn parse_variant_gid(gid: &str) -> Option<VariantId> {
    gid.rsplit('/').next()?.parse().ok()
}

pub struct ShopifyRestClient {
    client: reqwest::Client,
    api_base: Url,
    access_token: String,
    pagination: PaginationMode,
}

impl ShopifyRestClient {
    pub fn new(config: &SourceConfig, access_token: String) -> Result<Self> {
        let api_base = Url::parse(&format!(
            "{}/admin/api/{}/",
            config.url.as_str().trim_end_matches('/'),
            config.api_version
        ))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(ShopifyRestClient {
            client,
            api_base,
            access_token,
            pagination: config.pagination,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.api_base.join(path)?)
    }

    async fn total_count(&self) -> Result<usize> {
        let url = self.endpoint("products/count.json")?;
        let response = self
            .client
            .get(url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .send()
            .await?;

        Ok(check_status(response)?.json::<CountResponse>().await?.count)
    }

    async fn fetch_inventory_batch(&self, ids: &[VariantId]) -> Result<HashMap<VariantId, i64>> {
        let url = self.endpoint("graphql.json")?;
        let body = serde_json::json!({
            "query": VARIANT_INVENTORY_QUERY,
            "variables": { "ids": ids.iter().map(|id| variant_gid(*id)).collect::<Vec<_>>() },
        });

        let response = self
            .client
            .post(url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&body)
            .send()
            .await?;

        let parsed = check_status(response)?.json::<GraphQlResponse>().await?;
        let Some(data) = parsed.data else {
            let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
            return Err(CatalogError::RemoteUnavailable {
                status: None,
                message: messages.join("; "),
            });
        };

        Ok(data
            .nodes
            .into_iter()
            .flatten()
            .filter_map(|node| {
                let id = parse_variant_gid(node.id.as_deref()?)?;
                Some((id, node.inventory_quantity.unwrap_or(0)))
            })
            .collect())
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CatalogError::AuthenticationFailed),
        _ if !status.is_success() => Err(CatalogError::RemoteUnavailable {
            status: Some(status.as_u16()),
            message: format!("{} returned {status}", response.url().path()),
        }),
        _ => Ok(response),
    }
}

#[async_trait]
impl CatalogSource for ShopifyRestClient {
    fn origin(&self) -> String {
        self.api_base.to_string()
    }

    fn pagination(&self) -> PaginationMode {
        self.pagination
    }

    async fn fetch_page(&self, position: &PagePosition, page_size: usize) -> Result<Page> {
        let mut url = self.endpoint("products.json")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &page_size.to_string());
            match position {
                // since_id=0 makes the first page ordered by id as well
                PagePosition::First if self.pagination == PaginationMode::SinceId => {
                    query.append_pair("since_id", "0");
                }
                PagePosition::First => {}
                PagePosition::After(id) => {
                    query.append_pair("since_id", &id.to_string());
                }
                PagePosition::Cursor(cursor) => {
                    query.append_pair("page_info", cursor);
                }
            }
        }

        let total_count = match position {
            PagePosition::First => Some(self.total_count().await?),
            _ => None,
        };

        let response = self
            .client
            .get(url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .send()
            .await?;
        let response = check_status(response)?;

        let next_cursor = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_page_info);

        let body = response.json::<ProductsResponse>().await?;

        Ok(Page {
            entries: body.products.into_iter().map(CatalogEntry::from).collect(),
            next_cursor,
            total_count,
        })
    }
}

#[async_trait]
impl InventoryLookup for ShopifyRestClient {
    async fn fetch_availability(
        &self,
        variant_ids: &BTreeSet<VariantId>,
    ) -> Result<HashMap<VariantId, i64>> {
        let ids: Vec<VariantId> = variant_ids.iter().copied().collect();
        let mut levels = HashMap::with_capacity(ids.len());

        for batch in ids.chunks(INVENTORY_BATCH_SIZE) {
            levels.extend(self.fetch_inventory_batch(batch).await?);
        }

        tracing::debug!(
            requested = ids.len(),
            returned = levels.len(),
            "Fetched live inventory"
        );
        Ok(levels)
    }
}
