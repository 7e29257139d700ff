use axum::{http::Method, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod error;
pub mod health;
pub mod middleware;
pub mod rides;
pub mod state;
pub mod users;

pub use error::AppError;
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    let protected = Router::new()
        .merge(rides::protected_routes())
        .merge(bookings::routes())
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), middleware::require_auth));

    let v1 = Router::new()
        .merge(health::routes())
        .merge(rides::routes())
        .merge(users::routes())
        .merge(protected);

    Router::new()
        .nest("/v1", v1)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
