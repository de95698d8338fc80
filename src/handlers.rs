use crate::errors::AppError;
use crate::models::{CanonicalClientRecord, ClientQuery};
use crate::orchestrator::Orchestrator;
use crate::validation::validate;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Resolution pipeline over the configured registries.
    pub orchestrator: Orchestrator,
}

/// Query parameters of the GET variant of the resolve endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientLookupParams {
    /// "Cedula" or "RNC".
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub force_update: Option<bool>,
    pub include_binary_photo: Option<bool>,
    pub session_id: Option<String>,
}

/// Health check endpoint.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-identity-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/clients/resolve
///
/// Resolves one client identity from the registries and returns the
/// canonical record.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `query` - JSON body with the identification and flags.
///
/// # Returns
///
/// * `Result<Json<CanonicalClientRecord>, AppError>` - The canonical record or an error body.
pub async fn resolve_client(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClientQuery>, JsonRejection>,
) -> Result<Json<CanonicalClientRecord>, AppError> {
    let Json(query) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    tracing::info!(
        "POST /clients/resolve - type: {:?}, session: {:?}",
        query.identification_type,
        query.session_id
    );

    let ctx = validate(query)?;
    let resolved = state.orchestrator.resolve(&ctx).await?;

    Ok(Json(resolved.record))
}

/// GET /api/v1/clients/:number
///
/// Same as [`resolve_client`], with the flags passed as query parameters.
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
    params: Result<Query<ClientLookupParams>, QueryRejection>,
) -> Result<Json<CanonicalClientRecord>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    tracing::info!("GET /clients/{} - type: {:?}", number, params.type_);

    let ctx = validate(ClientQuery {
        identification_number: Some(number),
        identification_type: params.type_,
        force_update: params.force_update,
        include_binary_photo: params.include_binary_photo,
        session_id: params.session_id,
    })?;
    let resolved = state.orchestrator.resolve(&ctx).await?;

    Ok(Json(resolved.record))
}

/// Resolution routes, without transport middleware.
///
/// `main` layers rate limiting, body limits and tracing on top.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/clients/resolve", post(resolve_client))
        .route("/api/v1/clients/:number", get(get_client))
        .with_state(state)
}
