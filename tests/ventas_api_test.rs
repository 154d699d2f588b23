mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn sale_decrements_stock_and_oversell_is_rejected() {
    let app = TestApp::new("ventas_oversell").await;
    let id = app.seed_producto("Camisa", 20.00, 5).await;

    // First sale of 3 units succeeds
    let (status, body) = app
        .post("/api/ventas", json!({"producto_id": id, "cantidad": 3}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body["saleId"].as_i64().is_some());
    assert_eq!(app.stock_de(id).await, 2);

    // Second sale of 3 exceeds the remaining 2
    let (status, body) = app
        .post("/api/ventas", json!({"producto_id": id, "cantidad": 3}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Stock insuficiente"));

    // Stock untouched by the failed attempt
    assert_eq!(app.stock_de(id).await, 2);

    // Exactly one sale row exists
    let (_, ventas) = app.get("/api/ventas").await;
    assert_eq!(ventas.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn sale_listing_joins_product_fields() {
    let app = TestApp::new("ventas_listado").await;
    let id = app.seed_producto("Chaqueta", 89.99, 10).await;

    let (status, _) = app
        .post("/api/ventas", json!({"producto_id": id, "cantidad": 4}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get("/api/ventas").await;
    assert_eq!(status, StatusCode::OK);
    let venta = &body.as_array().unwrap()[0];
    assert_eq!(venta["producto_id"], id);
    assert_eq!(venta["producto_nombre"], "Chaqueta");
    assert_eq!(venta["cantidad"], 4);
    assert!(venta["venta_id"].as_i64().is_some());
    assert!(venta["fecha_venta"].is_string());
    assert!(venta["producto_precio"].is_string() || venta["producto_precio"].is_number());
}

#[tokio::test]
async fn sale_validation_rejects_bad_input() {
    let app = TestApp::new("ventas_validation").await;
    let id = app.seed_producto("Camisa", 20.00, 5).await;

    // Missing producto_id
    let (status, _) = app.post("/api/ventas", json!({"cantidad": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing cantidad
    let (status, _) = app.post("/api/ventas", json!({"producto_id": id})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Non-positive cantidad
    let (status, _) = app
        .post("/api/ventas", json!({"producto_id": id, "cantidad": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown product
    let (status, body) = app
        .post("/api/ventas", json!({"producto_id": 9999, "cantidad": 1}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Producto"));

    assert_eq!(app.stock_de(id).await, 5);
}

#[tokio::test]
async fn deleting_a_sale_restores_stock_exactly() {
    let app = TestApp::new("ventas_delete").await;
    let id = app.seed_producto("Camisa", 20.00, 5).await;

    let (_, body) = app
        .post("/api/ventas", json!({"producto_id": id, "cantidad": 3}))
        .await;
    let venta_id = body["saleId"].as_i64().unwrap();
    assert_eq!(app.stock_de(id).await, 2);

    let (status, body) = app.delete(&format!("/api/ventas/{venta_id}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    // Create-then-delete leaves stock unchanged
    assert_eq!(app.stock_de(id).await, 5);

    // Deleting again is a 404
    let (status, _) = app.delete(&format!("/api/ventas/{venta_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn updating_a_sale_applies_exactly_the_delta() {
    let app = TestApp::new("ventas_update").await;
    let id = app.seed_producto("Camisa", 20.00, 10).await;

    let (_, body) = app
        .post("/api/ventas", json!({"producto_id": id, "cantidad": 4}))
        .await;
    let venta_id = body["saleId"].as_i64().unwrap();
    assert_eq!(app.stock_de(id).await, 6);

    // Grow the sale: 4 -> 7, stock drops by 3
    let (status, _) = app
        .put(&format!("/api/ventas/{venta_id}"), json!({"cantidad": 7}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stock_de(id).await, 3);

    // Repeating the identical update is a no-op on stock
    let (status, _) = app
        .put(&format!("/api/ventas/{venta_id}"), json!({"cantidad": 7}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stock_de(id).await, 3);

    // Shrink the sale: 7 -> 2, stock grows by 5
    let (status, _) = app
        .put(&format!("/api/ventas/{venta_id}"), json!({"cantidad": 2}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stock_de(id).await, 8);

    // Growing past available stock fails and changes nothing
    let (status, body) = app
        .put(&format!("/api/ventas/{venta_id}"), json!({"cantidad": 11}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Stock insuficiente"));
    assert_eq!(app.stock_de(id).await, 8);

    // Unknown sale id
    let (status, _) = app.put("/api/ventas/9999", json!({"cantidad": 1})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_sales_never_oversell() {
    let app = TestApp::new("ventas_concurrencia").await;
    let id = app.seed_producto("Camisa", 20.00, 3).await;

    // Two concurrent sales of 3 units against a stock of exactly 3:
    // the transactions serialize at the product row, so exactly one wins.
    let svc_a = app.state.services.ventas.clone();
    let svc_b = app.state.services.ventas.clone();
    let a = tokio::spawn(async move { svc_a.crear_venta(id, 3).await });
    let b = tokio::spawn(async move { svc_b.crear_venta(id, 3).await });

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one sale should win: {results:?}");

    let failure = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        failure,
        Err(tienda_api::errors::ServiceError::InsufficientStock(_))
    ));

    assert_eq!(app.stock_de(id).await, 0);
}

#[tokio::test]
async fn stock_never_goes_negative_across_a_mixed_sequence() {
    let app = TestApp::new("ventas_secuencia").await;
    let id = app.seed_producto("Camisa", 20.00, 6).await;

    let (_, body) = app
        .post("/api/ventas", json!({"producto_id": id, "cantidad": 2}))
        .await;
    let v1 = body["saleId"].as_i64().unwrap();
    let (_, body) = app
        .post("/api/ventas", json!({"producto_id": id, "cantidad": 4}))
        .await;
    let v2 = body["saleId"].as_i64().unwrap();
    assert_eq!(app.stock_de(id).await, 0);

    // No more stock: a third sale must fail
    let (status, _) = app
        .post("/api/ventas", json!({"producto_id": id, "cantidad": 1}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Shrinking v2 frees units, which a new sale can then take
    let (status, _) = app
        .put(&format!("/api/ventas/{v2}"), json!({"cantidad": 1}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stock_de(id).await, 3);

    let (status, _) = app
        .post("/api/ventas", json!({"producto_id": id, "cantidad": 3}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.stock_de(id).await, 0);

    // Deleting everything restores the original stock
    let (_, ventas) = app.get("/api/ventas").await;
    let ids: Vec<i64> = ventas
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["venta_id"].as_i64().unwrap())
        .collect();
    assert!(ids.contains(&v1));
    for venta_id in ids {
        let (status, _) = app.delete(&format!("/api/ventas/{venta_id}")).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(app.stock_de(id).await, 6);
}
