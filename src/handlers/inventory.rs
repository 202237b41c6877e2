use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{entities::inventory_unit, errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct AllocateUnitRequest {
    pub order_id: i64,
    pub unit_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseUnitRequest {
    pub unit_id: i64,
}

async fn allocate_unit(
    State(state): State<AppState>,
    Json(payload): Json<AllocateUnitRequest>,
) -> Result<Json<ApiResponse<inventory_unit::Model>>, ServiceError> {
    let unit = state
        .services
        .inventory
        .allocate(payload.order_id, &payload.unit_code)
        .await?;
    Ok(Json(ApiResponse::success(unit)))
}

async fn release_unit(
    State(state): State<AppState>,
    Json(payload): Json<ReleaseUnitRequest>,
) -> Result<Json<ApiResponse<inventory_unit::Model>>, ServiceError> {
    let unit = state.services.inventory.release(payload.unit_id).await?;
    Ok(Json(ApiResponse::success(unit)))
}

async fn restock_unit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<inventory_unit::Model>>, ServiceError> {
    let unit = state.services.inventory.restock_unit(id).await?;
    Ok(Json(ApiResponse::success(unit)))
}

async fn spoil_unit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<inventory_unit::Model>>, ServiceError> {
    let unit = state.services.inventory.spoil_unit(id).await?;
    Ok(Json(ApiResponse::success(unit)))
}

async fn get_unit(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<inventory_unit::Model>>, ServiceError> {
    let unit = state.services.inventory.get_unit_by_code(&code).await?;
    Ok(Json(ApiResponse::success(unit)))
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/allocate", post(allocate_unit))
        .route("/release", post(release_unit))
        .route("/units/:id/restock", post(restock_unit))
        .route("/units/:id/spoil", post(spoil_unit))
        .route("/units/by-code/:code", get(get_unit))
}
