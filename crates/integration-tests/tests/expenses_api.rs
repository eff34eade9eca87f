//! Integration tests for the expense API.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use tokoledger_integration_tests::TestContext;

fn expense_body(store: &str, items: Value) -> Value {
    json!({
        "store": store,
        "items": items,
        "date": "2024-01-01",
        "total": 30000
    })
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;

    let resp = ctx.client.get(ctx.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = ctx.client.get(ctx.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_expense_creates_store_and_product() {
    let ctx = TestContext::new().await;

    let (status, expense) = ctx
        .post_json(
            "/expenses",
            &expense_body(
                "Toko ABC",
                json!([{ "product": "", "name": "Minyak Goreng", "quantity": 2, "price": 15000 }]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(expense["items"][0]["name"], "Minyak Goreng");
    assert_eq!(expense["total"].as_f64(), Some(30000.0));
    assert_eq!(expense["date"], "2024-01-01");

    let (status, stores) = ctx.get_json("/stores?name=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stores.as_array().unwrap().len(), 1);
    assert_eq!(stores[0]["name"], "Toko ABC");
    assert_eq!(stores[0]["id"], expense["store"]);

    let store_id = stores[0]["id"].as_str().unwrap();
    let (status, products) = ctx
        .get_json(&format!("/products?name=minyak&storeId={store_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products[0]["name"], "Minyak Goreng");
    assert_eq!(products[0]["price"].as_f64(), Some(15000.0));
}

#[tokio::test]
async fn test_same_store_name_is_reused_case_insensitively() {
    let ctx = TestContext::new().await;

    let (_, first) = ctx
        .post_json("/expenses", &expense_body("Toko ABC", json!([])))
        .await;
    let (_, second) = ctx
        .post_json("/expenses", &expense_body("  toko abc ", json!([])))
        .await;

    assert_eq!(first["store"], second["store"]);
    assert_eq!(ctx.repo.store_count().await, 1);
}

#[tokio::test]
async fn test_list_expenses_formats_names_and_filters() {
    let ctx = TestContext::new().await;

    ctx.post_json(
        "/expenses",
        &expense_body(
            "warung berkah",
            json!([{ "product": "", "name": "gula pasir", "quantity": 1, "price": 12000 }]),
        ),
    )
    .await;
    let mut later = expense_body("Toko Lain", json!([]));
    later["date"] = json!("2024-02-10");
    ctx.post_json("/expenses", &later).await;

    let (status, all) = ctx.get_json("/expenses").await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["storeInfo"]["name"], "Toko Lain");
    assert_eq!(all[1]["storeInfo"]["name"], "Warung Berkah");
    assert_eq!(all[1]["items"][0]["name"], "Gula Pasir");
    assert_eq!(all[1]["items"][0]["snapshotName"], "gula pasir");

    let (_, by_item) = ctx.get_json("/expenses?search=GULA").await;
    assert_eq!(by_item.as_array().unwrap().len(), 1);

    let (_, january) = ctx
        .get_json("/expenses?from=2024-01-01&to=2024-01-31")
        .await;
    assert_eq!(january.as_array().unwrap().len(), 1);
    assert_eq!(january[0]["storeInfo"]["name"], "Warung Berkah");
}

#[tokio::test]
async fn test_list_rejects_malformed_filters() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get_json("/expenses?storeId=not-an-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = ctx.get_json("/expenses?from=last-week").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_replaces_expense() {
    let ctx = TestContext::new().await;
    let (_, created) = ctx
        .post_json(
            "/expenses",
            &expense_body(
                "Toko ABC",
                json!([{ "product": "", "name": "Beras", "quantity": 1, "price": 10000 }]),
            ),
        )
        .await;
    let id = created["id"].as_str().unwrap();

    let mut replacement = expense_body(
        "Toko XYZ",
        json!([{ "product": "", "name": "Telur", "quantity": 10, "price": 2000 }]),
    );
    replacement["total"] = json!(20000);
    let (status, updated) = ctx
        .put_json(&format!("/expenses?id={id}"), &replacement)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_ne!(updated["store"], created["store"]);
    assert_eq!(updated["items"][0]["name"], "Telur");
    assert_eq!(updated["total"].as_f64(), Some(20000.0));
}

#[tokio::test]
async fn test_update_errors() {
    let ctx = TestContext::new().await;
    let body = expense_body("Toko Baru", json!([]));

    let (status, _) = ctx.put_json("/expenses", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.put_json("/expenses?id=abc", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, body) = ctx
        .put_json(&format!("/expenses?id={missing}"), &body)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Expense not found" }));
    assert_eq!(ctx.repo.store_count().await, 0);
}

#[tokio::test]
async fn test_delete_expense() {
    let ctx = TestContext::new().await;
    let (_, created) = ctx
        .post_json("/expenses", &expense_body("Toko ABC", json!([])))
        .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = ctx.delete_json(&format!("/expenses?id={id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Expense deleted successfully");

    let (status, _) = ctx.delete_json(&format!("/expenses?id={id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, remaining) = ctx.get_json("/expenses").await;
    assert_eq!(remaining, json!([]));
}

#[tokio::test]
async fn test_invalid_json_body_is_bad_request() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx
        .post_json("/expenses", &json!({ "store": "Toko ABC" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_blank_store_name_is_rejected() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx
        .post_json("/expenses", &expense_body("   ", json!([])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name is required");
}
