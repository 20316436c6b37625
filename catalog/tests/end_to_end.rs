use catalog::config::Config;
use catalog::types::{Completeness, PartialReason, QueryRecord};
use catalog::{CatalogError, CatalogService};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCTS_PATH: &str = "/admin/api/2024-01/products.json";
const COUNT_PATH: &str = "/admin/api/2024-01/products/count.json";
const GRAPHQL_PATH: &str = "/admin/api/2024-01/graphql.json";

fn config(server: &MockServer, extra: &str) -> Config {
    let yaml = format!(
        r#"
source:
    url: "{}"
    live_inventory: true
fetch:
    page_size: 2
    throttle:
        every_pages: 0
{extra}
"#,
        server.uri()
    );
    let config: Config = serde_yaml::from_str(&yaml).unwrap();
    config.validate().unwrap();
    config
}

async fn mount_count(server: &MockServer, count: usize) {
    Mock::given(method("GET"))
        .and(path(COUNT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": count })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_and_match_against_shop() {
    let server = MockServer::start().await;
    mount_count(&server, 3).await;

    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .and(query_param("since_id", "0"))
        .and(header("X-Shopify-Access-Token", "shpat_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                {
                    "id": 1,
                    "title": "LOFT.73 - Aurora Dress",
                    "tags": "dresses, summer",
                    "variants": [
                        {"id": 10, "sku": "AUR-001", "price": "59.00", "option1": "S", "inventory_quantity": 2},
                        {"id": 11, "sku": "AUR-002", "price": "59.00", "option1": "M", "inventory_quantity": 3}
                    ]
                },
                {
                    "id": 2,
                    "title": "Borealis Coat",
                    "variants": [{"id": 20, "sku": "BOR-100", "inventory_quantity": 7}]
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .and(query_param("since_id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                {"id": 3, "title": "Cirrus Scarf", "variants": [{"id": 30, "sku": "CIR-1", "inventory_quantity": 1}]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"nodes": [
                {"id": "gid://shopify/ProductVariant/10", "inventoryQuantity": 1},
                {"id": "gid://shopify/ProductVariant/11", "inventoryQuantity": 0},
                {"id": "gid://shopify/ProductVariant/20", "inventoryQuantity": 4}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = CatalogService::from_config(&config(&server, ""), "shpat_test".into()).unwrap();

    let catalog = service.fetch_full_catalog(None).await.unwrap();
    assert_eq!(catalog.entries.len(), 3);
    assert_eq!(catalog.pages, 2);
    assert_eq!(catalog.completeness, Completeness::Complete);

    let queries = vec![
        QueryRecord::new(Some("Aurora Dress"), Some("AUR001")),
        QueryRecord::new(None, Some("bor-100")),
        QueryRecord::new(Some("Nonexistent Jacket"), None),
    ];
    // Served from the catalog cached by the fetch above
    let report = service.match_availability(&queries).await.unwrap();
    assert_eq!(report.completeness, Completeness::Complete);

    let aurora = &report.results[0];
    assert_eq!(aurora.matched.as_ref().map(|e| e.id), Some(1));
    assert_eq!(aurora.match_score, 150);
    assert_eq!(aurora.total_available, 1);

    let borealis = &report.results[1];
    assert_eq!(borealis.matched.as_ref().map(|e| e.id), Some(2));
    assert_eq!(borealis.match_score, 100);
    assert_eq!(borealis.match_reasons, vec!["exact SKU match (BOR-100)".to_string()]);
    assert_eq!(borealis.total_available, 4);

    let missing = &report.results[2];
    assert_eq!(missing.matched, None);
    assert_eq!(missing.match_score, 0);
    assert!(missing.match_reasons.is_empty());
    assert_eq!(missing.total_available, 0);
}

#[tokio::test]
async fn test_rejected_token_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(COUNT_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let service = CatalogService::from_config(&config(&server, ""), "wrong".into()).unwrap();
    let result = service
        .match_availability(&[QueryRecord::new(Some("Aurora Dress"), None)])
        .await;

    assert!(matches!(result, Err(CatalogError::AuthenticationFailed)));
}

#[tokio::test]
async fn test_cursor_fetch_failure_yields_partial_report() {
    let server = MockServer::start().await;
    mount_count(&server, 4).await;

    let next_link = format!(r#"<{}{PRODUCTS_PATH}?limit=2&page_info=page2>; rel="next""#, server.uri());
    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .and(query_param_is_missing("page_info"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next_link.as_str())
                .set_body_json(json!({
                    "products": [
                        {"id": 1, "title": "Aurora Dress", "variants": [{"id": 10, "sku": "AUR-001", "inventory_quantity": 2}]},
                        {"id": 2, "title": "Borealis Coat", "variants": []}
                    ]
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .and(query_param("page_info", "page2"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let extra = "    partial_policy: accept\n";
    let mut config = config(&server, extra);
    config.source.pagination = catalog::config::PaginationMode::Cursor;
    config.source.live_inventory = false;

    let service = CatalogService::from_config(&config, "shpat_test".into()).unwrap();
    let report = service
        .match_availability(&[QueryRecord::new(Some("aurora dress"), None)])
        .await
        .unwrap();

    assert!(matches!(
        report.completeness,
        Completeness::Partial(PartialReason::PageFailed { page: 2, .. })
    ));
    assert_eq!(report.results[0].matched.as_ref().map(|e| e.id), Some(1));
    assert_eq!(report.results[0].total_available, 2);
}
