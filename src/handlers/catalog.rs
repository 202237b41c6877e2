use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::{
    entities::{customer, product},
    errors::ServiceError,
    services::catalog::{CreateCustomerRequest, CreateProductRequest},
    ApiResponse, AppState, ListQuery, PaginatedResponse,
};

async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.catalog.create_customer(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<customer::Model>>, ServiceError> {
    let found = state.services.catalog.get_customer(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<customer::Model>>>, ServiceError> {
    let (page, limit) = query.clamped(&state.config);
    let (items, total) = state.services.catalog.list_customers(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    state.services.catalog.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.catalog.create_product(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<product::Model>>, ServiceError> {
    let found = state.services.catalog.get_product(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<product::Model>>>, ServiceError> {
    let (page, limit) = query.clamped(&state.config);
    let (items, total) = state.services.catalog.list_products(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route("/:id", get(get_customer).delete(delete_customer))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product))
}
