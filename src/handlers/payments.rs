use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::{
    entities::{credit_note, payment},
    errors::ServiceError,
    services::payments::{
        AccountStatement, RecordPaymentRequest, SettleAccountRequest, SettlementSummary,
        VoidPaymentResponse,
    },
    ApiResponse, AppState,
};

async fn record_payment(
    State(state): State<AppState>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let pay = state.services.payments.record_payment(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(pay))))
}

async fn void_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<VoidPaymentResponse>>, ServiceError> {
    let outcome = state.services.payments.void_payment(id).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

async fn settle_account(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
    Json(payload): Json<SettleAccountRequest>,
) -> Result<Json<ApiResponse<SettlementSummary>>, ServiceError> {
    let summary = state
        .services
        .payments
        .settle_account(customer_id, payload)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn list_payments(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<payment::Model>>>, ServiceError> {
    let payments = state.services.payments.list_payments(customer_id).await?;
    Ok(Json(ApiResponse::success(payments)))
}

async fn list_credit_notes(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<credit_note::Model>>>, ServiceError> {
    let notes = state
        .services
        .payments
        .list_credit_notes(customer_id)
        .await?;
    Ok(Json(ApiResponse::success(notes)))
}

async fn statement(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<ApiResponse<AccountStatement>>, ServiceError> {
    let stmt = state.services.payments.statement(customer_id).await?;
    Ok(Json(ApiResponse::success(stmt)))
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(record_payment))
        .route("/:id/void", post(void_payment))
}

/// Account-scoped routes nested under /customers.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/settle", post(settle_account))
        .route("/:id/payments", get(list_payments))
        .route("/:id/credit-notes", get(list_credit_notes))
        .route("/:id/statement", get(statement))
}
