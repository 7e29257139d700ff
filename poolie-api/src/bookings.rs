use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use poolie_booking::NewBooking;
use poolie_core::identity::CallerIdentity;
use poolie_core::views::BookingResponse;
use poolie_core::ResponseAction;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub action: String,
    pub message: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/{booking_id}/respond", post(respond_to_booking))
}

/// POST /v1/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let Json(request) = payload?;
    let record = state.ledger.create_booking(&caller.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(BookingResponse::new(&record.booking, &record.ride))))
}

/// POST /v1/bookings/:booking_id/respond
pub async fn respond_to_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(booking_id): Path<String>,
    payload: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let Json(request) = payload?;
    let action = request
        .action
        .parse::<ResponseAction>()
        .map_err(|_| AppError::InvalidAction("action must be 'accept' or 'reject'".to_string()))?;

    let record = state
        .ledger
        .respond_to_booking(&booking_id, &caller.user_id, action, request.message)
        .await?;
    Ok(Json(BookingResponse::new(&record.booking, &record.ride)))
}
