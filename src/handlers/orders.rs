use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    entities::{invoice, sales_order},
    errors::ServiceError,
    services::orders::{CreateOrderRequest, FinalizeOrderRequest, OrderDetails},
    ApiResponse, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Deserialize)]
pub struct UpdateDiscountRequest {
    pub discount_percent: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductPriceRequest {
    pub product_id: i64,
    pub price: Decimal,
}

async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetails>>, ServiceError> {
    let details = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(details)))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<sales_order::Model>>>, ServiceError> {
    let (page, limit) = query.clamped(&state.config);
    let (items, total) = state.services.orders.list_orders(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

async fn update_discount(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateDiscountRequest>,
) -> Result<Json<ApiResponse<sales_order::Model>>, ServiceError> {
    let order = state
        .services
        .orders
        .update_order_discount(id, payload.discount_percent)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

async fn update_product_price(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProductPriceRequest>,
) -> Result<Json<ApiResponse<u64>>, ServiceError> {
    let updated = state
        .services
        .orders
        .update_product_price(id, payload.product_id, payload.price)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn finalize_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<FinalizeOrderRequest>,
) -> Result<Json<ApiResponse<invoice::Model>>, ServiceError> {
    let inv = state.services.orders.finalize_order(id, payload).await?;
    Ok(Json(ApiResponse::success(inv)))
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<sales_order::Model>>, ServiceError> {
    let order = state.services.orders.cancel_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<invoice::Model>>, ServiceError> {
    let inv = state.services.orders.get_invoice(id).await?;
    Ok(Json(ApiResponse::success(inv)))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/discount", put(update_discount))
        .route("/:id/price", put(update_product_price))
        .route("/:id/finalize", post(finalize_order))
        .route("/:id/cancel", post(cancel_order))
}

pub fn invoice_routes() -> Router<AppState> {
    Router::new().route("/:id", get(get_invoice))
}
