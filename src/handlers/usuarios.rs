use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, required, success_response},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub usuario: Option<String>,
    #[serde(rename = "contraseña")]
    pub contrasena: Option<String>,
}

pub fn usuario_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usuario = required(payload.usuario, "usuario")?;
    let contrasena = required(payload.contrasena, "contraseña")?;

    let outcome = state
        .services
        .auth
        .login(&usuario, &contrasena)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Login exitoso.",
        "usuario": outcome.usuario,
        "token": outcome.token,
    })))
}
