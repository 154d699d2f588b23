use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, required, success_response, validate_input,
    },
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVentaRequest {
    pub producto_id: Option<i32>,
    #[validate(range(min = 1, message = "cantidad debe ser mayor que cero"))]
    pub cantidad: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVentaRequest {
    #[validate(range(min = 1, message = "cantidad debe ser mayor que cero"))]
    pub cantidad: Option<i32>,
}

pub fn venta_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(listar_ventas).post(crear_venta))
        .route("/:id", axum::routing::put(actualizar_venta).delete(eliminar_venta))
}

async fn listar_ventas(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let ventas = state
        .services
        .ventas
        .listar_ventas()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(ventas))
}

async fn crear_venta(
    State(state): State<AppState>,
    Json(payload): Json<CreateVentaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let producto_id = required(payload.producto_id, "producto_id")?;
    let cantidad = required(payload.cantidad, "cantidad")?;

    let id = state
        .services
        .ventas
        .crear_venta(producto_id, cantidad)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(json!({
        "message": "Venta registrada exitosamente y stock actualizado.",
        "saleId": id,
    })))
}

async fn actualizar_venta(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateVentaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let cantidad = required(payload.cantidad, "cantidad")?;

    state
        .services
        .ventas
        .actualizar_venta(id, cantidad)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(json!({
        "message": "Venta actualizada exitosamente y stock ajustado.",
    })))
}

async fn eliminar_venta(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .ventas
        .eliminar_venta(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(json!({
        "message": "Venta eliminada exitosamente y stock restaurado.",
    })))
}
