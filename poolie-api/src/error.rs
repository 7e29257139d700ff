use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use poolie_core::identity::AuthError;
use poolie_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    MissingParameters(String),
    #[error("{0}")]
    InvalidDate(String),
    #[error("{0}")]
    InvalidAction(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Ride is no longer available")]
    RideNotAvailable,
    #[error("{0}")]
    InsufficientSeats(String),
    #[error("Booking has already been responded to")]
    AlreadyResponded,
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::MissingParameters(_) => "MISSING_PARAMETERS",
            AppError::InvalidDate(_) => "INVALID_DATE",
            AppError::InvalidAction(_) => "INVALID_ACTION",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::RideNotAvailable => "RIDE_NOT_AVAILABLE",
            AppError::InsufficientSeats(_) => "INSUFFICIENT_SEATS",
            AppError::AlreadyResponded => "ALREADY_RESPONDED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_)
            | AppError::MissingParameters(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidAction(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RideNotAvailable | AppError::InsufficientSeats(_) | AppError::AlreadyResponded => {
                StatusCode::CONFLICT
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Internal(detail) => {
                tracing::error!("Internal Server Error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (self.status(), body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => AppError::InvalidRequest(msg),
            CoreError::InvalidCapacity(msg) => AppError::InvalidRequest(msg),
            CoreError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            CoreError::RideNotAvailable => AppError::RideNotAvailable,
            CoreError::InsufficientSeats { .. } => AppError::InsufficientSeats("Not enough available seats".to_string()),
            CoreError::InsufficientCapacity { requested, available } => AppError::InsufficientSeats(format!(
                "Not enough available seats to accept this booking: requested {}, available {}",
                requested, available
            )),
            CoreError::Forbidden(msg) => AppError::Forbidden(msg),
            CoreError::AlreadyResponded(_) => AppError::AlreadyResponded,
            CoreError::Storage(err) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(detail) => {
                tracing::debug!("Token rejected: {}", detail);
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::InvalidRequest("Invalid request body".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        AppError::InvalidRequest("Invalid query parameters".to_string())
    }
}
