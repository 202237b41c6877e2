use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::{
    errors::ServiceError,
    services::returns::ProcessReturnRequest,
    ApiResponse, AppState,
};

async fn process_return(
    State(state): State<AppState>,
    Json(payload): Json<ProcessReturnRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state.services.returns.process_return(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}

pub fn return_routes() -> Router<AppState> {
    Router::new().route("/", post(process_return))
}
