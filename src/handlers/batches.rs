use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    entities::harvest_batch,
    errors::ServiceError,
    services::batches::{BatchResponse, CreateBatchRequest},
    ApiResponse, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Deserialize)]
pub struct UpdateBatchDateRequest {
    pub batch_date: NaiveDate,
}

async fn create_batch(
    State(state): State<AppState>,
    Json(payload): Json<CreateBatchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let batch = state.services.batches.create_batch(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(batch))))
}

async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BatchResponse>>, ServiceError> {
    let batch = state.services.batches.get_batch(id).await?;
    Ok(Json(ApiResponse::success(batch)))
}

async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<harvest_batch::Model>>>, ServiceError> {
    let (page, limit) = query.clamped(&state.config);
    let (items, total) = state.services.batches.list_batches(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

async fn update_batch_date(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateBatchDateRequest>,
) -> Result<Json<ApiResponse<harvest_batch::Model>>, ServiceError> {
    let batch = state
        .services
        .batches
        .update_batch_date(id, payload.batch_date)
        .await?;
    Ok(Json(ApiResponse::success(batch)))
}

async fn delete_batch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    state.services.batches.delete_batch(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_batch).get(list_batches))
        .route("/:id", get(get_batch).delete(delete_batch))
        .route("/:id/date", put(update_batch_date))
}
