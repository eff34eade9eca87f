//! Integration tests for customers, addresses, orders and the catalog.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use tokoledger_integration_tests::TestContext;

async fn customer_with_address(ctx: &TestContext, name: &str) -> (Value, Value) {
    let (status, customer) = ctx
        .post_json("/customers", &json!({ "name": name, "phone": "0812" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, address) = ctx
        .post_json(
            "/addresses",
            &json!({
                "customerId": customer["id"],
                "receiverName": name,
                "phone": "0812",
                "street": "Jl. Merdeka 1",
                "city": "Bandung",
                "state": "Jawa Barat",
                "country": "Indonesia",
                "postalCode": "40111"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    (customer, address)
}

fn order_body(customer: &str, address_id: &Value, items: Value) -> Value {
    json!({
        "customer": customer,
        "addressId": address_id,
        "deadline": "2024-03-01",
        "orderDate": "2024-02-01T10:00:00.000Z",
        "orderItems": items
    })
}

#[tokio::test]
async fn test_customer_validation() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post_json("/customers", &json!({ "name": "Siti", "phone": " " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name and phone are required");

    let (status, body) = ctx.get_json("/customers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_address_requires_existing_customer() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post_json(
            "/addresses",
            &json!({
                "customerId": uuid::Uuid::new_v4(),
                "receiverName": "Siti",
                "phone": "0812",
                "street": "Jl. Merdeka 1",
                "city": "Bandung",
                "state": "Jawa Barat",
                "country": "Indonesia",
                "postalCode": "40111"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Customer not found");
}

#[tokio::test]
async fn test_list_addresses_for_customer() {
    let ctx = TestContext::new().await;
    let (customer, address) = customer_with_address(&ctx, "Siti").await;

    let id = customer["id"].as_str().unwrap();
    let (status, addresses) = ctx.get_json(&format!("/addresses?customerId={id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(addresses.as_array().unwrap().len(), 1);
    assert_eq!(addresses[0]["id"], address["id"]);

    let (status, _) = ctx.get_json("/addresses").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_and_read_order() {
    let ctx = TestContext::new().await;
    let (customer, address) = customer_with_address(&ctx, "siti aminah").await;

    let (status, order) = ctx
        .post_json(
            "/orders",
            &order_body(
                "Siti Aminah",
                &address["id"],
                json!([
                    { "product": "", "name": "kaos polos", "qty": 2, "color": "Merah", "discount": 5000 },
                    { "product": "", "name": "Kaos Polos", "qty": 1 }
                ]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["customerId"], customer["id"]);
    assert_eq!(order["orderDate"], "2024-02-01");
    assert_eq!(order["orderItems"][0]["product"], order["orderItems"][1]["product"]);
    assert_eq!(order["orderItems"][0]["discount"].as_f64(), Some(5000.0));
    assert_eq!(order["orderItems"][1]["discount"].as_f64(), Some(0.0));

    let id = order["id"].as_str().unwrap();
    let (status, view) = ctx.get_json(&format!("/orders/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["customer"]["name"], "Siti Aminah");
    assert_eq!(view["address"]["city"], "Bandung");
    assert_eq!(view["orderItems"][0]["name"], "Kaos Polos");
    assert_eq!(view["orderItems"][0]["snapshotName"], "kaos polos");

    let catalog_id = order["orderItems"][0]["product"].as_str().unwrap();
    let (status, product) = ctx
        .get_json(&format!("/catalog-products/{catalog_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["name"], "Kaos Polos");

    let (_, listed) = ctx.get_json("/orders?search=kaos").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (_, none) = ctx.get_json("/orders?search=sepatu").await;
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn test_order_validation() {
    let ctx = TestContext::new().await;
    let (_, address) = customer_with_address(&ctx, "Siti").await;
    let one_item = json!([{ "product": "", "name": "Topi", "qty": 1 }]);

    let (status, _) = ctx
        .post_json("/orders", &order_body("", &address["id"], one_item.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post_json("/orders", &order_body("Siti", &address["id"], json!([])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post_json("/orders", &order_body("Siti", &Value::Null, one_item.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post_json(
            "/orders",
            &order_body(
                "Siti",
                &address["id"],
                json!([{ "product": "", "name": "Topi", "qty": 0 }]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post_json("/orders", &order_body("Budi", &address["id"], one_item.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = json!(uuid::Uuid::new_v4());
    let (status, _) = ctx
        .post_json("/orders", &order_body("Orang Baru", &missing, one_item))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Rejected orders leave no customers behind
    let (_, customers) = ctx.get_json("/customers").await;
    assert_eq!(customers.as_array().unwrap().len(), 1);
    let (_, catalog) = ctx.get_json("/catalog-products").await;
    assert_eq!(catalog, json!([]));
}

#[tokio::test]
async fn test_order_lookup_errors() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx.get_json("/orders/not-an-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = ctx.get_json(&format!("/orders/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get_json(&format!("/catalog-products/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
