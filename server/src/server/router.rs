use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::api;
use crate::app::SharedState;

/// Create the axum router with all routes.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // --- Core ---
        .route("/status", get(status_handler))
        // --- Movie feeds ---
        .route("/", get(api::movies::home))
        .route("/top", get(api::movies::top_favourited))
        .route("/search", get(api::movies::search_get).post(api::movies::search_post))
        .route("/user/{user_id}", get(api::movies::user_profile))
        // --- Favourites ---
        .route("/api/1/vote/{movie_id}", get(api::vote::toggle_favourite))
        // --- Polls ---
        .route("/admin/", get(api::polls::list_polls))
        .route("/admin/polls", post(api::polls::create_poll))
        .route("/admin/polls/{poll_id}/options", post(api::polls::add_option))
        .route("/api/1/polls/{poll_id}/vote", post(api::polls::cast_vote))
        // --- Auth ---
        .route("/auth/login", get(api::auth::login))
        .route("/auth/callback", get(api::auth::callback))
        .route("/auth/logout", get(api::auth::logout))
        // --- Middleware ---
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
