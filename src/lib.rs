//! tienda-api
//!
//! Inventory and sales backend for a clothing store: product CRUD, a
//! transactional sales ledger that keeps stock consistent under concurrent
//! requests, and credential-based login.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

use errors::ServiceError;

/// Shared application state, constructed once at startup and injected into
/// every handler. No process-global pool exists.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

/// All `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .nest("/productos", handlers::productos::producto_routes())
        .nest("/ventas", handlers::ventas::venta_routes())
        .nest("/usuarios", handlers::usuarios::usuario_routes())
}

async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, ServiceError> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
