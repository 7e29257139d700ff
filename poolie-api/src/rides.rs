use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use poolie_catalog::NewRide;
use poolie_core::identity::CallerIdentity;
use poolie_core::search::{RideSearchQuery, TypeFilter};
use poolie_core::views::{RideDetail, SearchRidesResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Raw query string. Every field is optional here so that missing and malformed values map to
/// their own error codes instead of a generic rejection.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
    pub passengers: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl SearchParams {
    fn into_query(self) -> Result<RideSearchQuery, AppError> {
        let (origin, destination, date) = match (non_empty(self.origin), non_empty(self.destination), non_empty(self.date)) {
            (Some(origin), Some(destination), Some(date)) => (origin, destination, date),
            _ => {
                return Err(AppError::MissingParameters(
                    "origin, destination, and date are required".to_string(),
                ))
            }
        };

        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| AppError::InvalidDate("date must be in YYYY-MM-DD format".to_string()))?;

        let kind = self
            .kind
            .as_deref()
            .unwrap_or("")
            .parse::<TypeFilter>()
            .map_err(|_| AppError::InvalidRequest("type must be one of carpool, bus, all".to_string()))?;

        let min_seats = match non_empty(self.passengers) {
            Some(raw) => match raw.parse::<i32>() {
                Ok(count) if count >= 1 => Some(count),
                _ => {
                    return Err(AppError::InvalidRequest(
                        "passengers must be a positive integer".to_string(),
                    ))
                }
            },
            None => None,
        };

        Ok(RideSearchQuery {
            origin,
            destination,
            date,
            kind,
            min_seats,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rides/search", get(search_rides))
        .route("/rides/{ride_id}", get(get_ride))
}

/// Routes that need an authenticated caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/rides", post(create_ride))
}

/// GET /v1/rides/search
///
/// `origin`, `destination` and `date` are required. `type` is `carpool`, `bus` or `all`.
/// When `passengers` is given, only rides with at least that many available seats are returned.
pub async fn search_rides(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchRidesResponse>, AppError> {
    let Query(params) = params?;
    let query = params.into_query()?;
    let records = state.catalog.search_rides(&query).await?;
    Ok(Json(SearchRidesResponse::from_records(&records)))
}

/// GET /v1/rides/:ride_id
pub async fn get_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<String>,
) -> Result<Json<RideDetail>, AppError> {
    let record = state.catalog.get_ride(&ride_id).await?;
    Ok(Json(RideDetail::from(&record)))
}

/// POST /v1/rides
pub async fn create_ride(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<NewRide>, JsonRejection>,
) -> Result<(StatusCode, Json<RideDetail>), AppError> {
    let Json(new_ride) = payload?;
    let record = state.catalog.create_ride(&caller.user_id, new_ride).await?;
    Ok((StatusCode::CREATED, Json(RideDetail::from(&record))))
}
