use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use poolie_core::views::UserProfile;
use poolie_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/{user_id}/profile", get(get_profile))
}

/// GET /v1/users/:user_id/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .users
        .get_user(&user_id)
        .await
        .map_err(CoreError::from)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(&user)))
}
