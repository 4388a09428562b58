//! HTTP surface: routing and request handlers.

pub mod connections;
pub mod sessions;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/auth/{provider}",
            get(connections::auth_redirect).post(connections::initiate),
        )
        .route("/auth/{provider}/callback", get(connections::callback))
        .route(
            "/settings/profile/connections",
            get(connections::list_connections),
        )
        .route("/logout", post(sessions::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
