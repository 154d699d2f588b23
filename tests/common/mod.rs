use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tienda_api::{api_routes, config::AppConfig, db, handlers::AppServices, AppState};
use tower::ServiceExt;

/// Test harness: a fully wired application over a throwaway SQLite database.
#[allow(dead_code)]
pub struct TestApp {
    router: Router,
    pub state: AppState,
    db_file: String,
}

// Not every test binary exercises every helper.
#[allow(dead_code)]
impl TestApp {
    /// Construct a fresh app; `name` keeps each test's database separate.
    pub async fn new(name: &str) -> Self {
        let db_file = format!("tienda_test_{name}.db");
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(format!("sqlite://{db_file}?mode=rwc"), "test");
        // A single connection makes SQLite behave deterministically; the
        // pool serializes transactions the way row locks do on Postgres.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("migrations failed");

        let db_arc = Arc::new(pool);
        let services = AppServices::new(db_arc.clone(), &cfg);
        let state = AppState {
            db: db_arc,
            config: cfg,
            services,
        };

        let router = Router::new()
            .nest("/api", api_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            db_file,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is not JSON")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Create a product through the API and return its id.
    pub async fn seed_producto(&self, nombre: &str, precio: f64, stock: i32) -> i32 {
        let (status, body) = self
            .post(
                "/api/productos",
                serde_json::json!({
                    "nombre": nombre,
                    "descripcion": "producto de prueba",
                    "precio": precio,
                    "stock": stock,
                    "categoria": "camisas",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed failed: {body}");
        body["productId"].as_i64().expect("productId missing") as i32
    }

    /// Current stock of a product, read through the API.
    pub async fn stock_de(&self, producto_id: i32) -> i32 {
        let (status, body) = self.get(&format!("/api/productos/{producto_id}")).await;
        assert_eq!(status, StatusCode::OK, "product fetch failed: {body}");
        body["stock"].as_i64().expect("stock missing") as i32
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_file);
    }
}
