use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{
    errors::ApiError,
    handlers::common::{created_response, map_service_error, required, success_response},
    services::productos::{CreateProductoInput, UpdateProductoInput},
    AppState,
};

/// Body for product creation. Presence of the required fields is checked in
/// the handler so a missing field comes back as 400 `{error}`.
#[derive(Debug, Deserialize)]
pub struct CreateProductoRequest {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<Decimal>,
    pub stock: Option<i32>,
    pub categoria: Option<String>,
}

/// Body for partial product updates; every field optional.
#[derive(Debug, Deserialize)]
pub struct UpdateProductoRequest {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<Decimal>,
    pub stock: Option<i32>,
    pub categoria: Option<String>,
}

pub fn producto_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(listar_productos).post(crear_producto))
        .route(
            "/:id",
            get(obtener_producto)
                .put(actualizar_producto)
                .delete(eliminar_producto),
        )
}

async fn listar_productos(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let productos = state
        .services
        .productos
        .listar_productos()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(productos))
}

async fn obtener_producto(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let producto = state
        .services
        .productos
        .obtener_producto(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(producto))
}

async fn crear_producto(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateProductoInput {
        nombre: required(payload.nombre, "nombre")?,
        descripcion: payload.descripcion,
        precio: required(payload.precio, "precio")?,
        stock: required(payload.stock, "stock")?,
        categoria: payload.categoria,
    };

    let id = state
        .services
        .productos
        .crear_producto(input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(json!({
        "message": "Producto agregado exitosamente.",
        "productId": id,
    })))
}

async fn actualizar_producto(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateProductoInput {
        nombre: payload.nombre,
        descripcion: payload.descripcion,
        precio: payload.precio,
        stock: payload.stock,
        categoria: payload.categoria,
    };

    state
        .services
        .productos
        .actualizar_producto(id, input)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(json!({
        "message": "Producto actualizado exitosamente.",
    })))
}

async fn eliminar_producto(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .productos
        .eliminar_producto(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(json!({
        "message": "Producto eliminado exitosamente.",
    })))
}
